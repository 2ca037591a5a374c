//! JSON catalog API for garb.
//!
//! Exposes an axum [`Router`] backed by any
//! [`garb_core::index::VariantIndex`]. Transport concerns — auth, TLS,
//! request validation — are the caller's responsibility; malformed criteria
//! inside an accepted payload are normalised, not rejected.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", garb_api::api_router(orchestrator, timeout))
//! ```

pub mod catalog;
pub mod error;

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::post};
use garb_core::index::VariantIndex;
use garb_engine::orchestrator::CatalogQueryOrchestrator;

pub use error::ApiError;

/// Shared state threaded through the handlers.
pub struct AppState<I> {
  pub orchestrator:  Arc<CatalogQueryOrchestrator<I>>,
  /// Deadline for one whole catalog orchestration; exceeded requests
  /// answer 504.
  pub query_timeout: Duration,
}

impl<I> Clone for AppState<I> {
  fn clone(&self) -> Self {
    Self {
      orchestrator:  self.orchestrator.clone(),
      query_timeout: self.query_timeout,
    }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<I>(
  orchestrator: Arc<CatalogQueryOrchestrator<I>>,
  query_timeout: Duration,
) -> Router<()>
where
  I: VariantIndex + 'static,
{
  Router::new()
    .route(
      "/categories/{category_id}/catalog",
      post(catalog::handler::<I>),
    )
    .with_state(AppState { orchestrator, query_timeout })
}
