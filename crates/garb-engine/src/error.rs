//! Error type for `garb-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The backing index failed. Carries the backend's own error.
  #[error("index error: {0}")]
  Index(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn index<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Index(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
