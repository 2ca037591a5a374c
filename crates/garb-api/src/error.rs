//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The orchestration exceeded the per-request deadline.
  #[error("catalog query timed out")]
  Timeout,

  #[error("engine error: {0}")]
  Engine(#[from] garb_engine::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Timeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
      ApiError::Engine(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
