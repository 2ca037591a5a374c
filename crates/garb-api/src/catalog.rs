//! Handler for `POST /categories/{category_id}/catalog`.
//!
//! The body is the boundary criteria payload:
//!
//! ```json
//! {
//!   "filters": { "color": ["Blue"], "material": ["Cotton"] },
//!   "min_price": 1000, "max_price": 2500,
//!   "sort": "price_asc",
//!   "brands": [1], "product_types": [],
//!   "page": 1, "per_page": 12
//! }
//! ```
//!
//! Unknown slugs, unknown values, and malformed price bounds are
//! normalised away — the response is always a best-effort view.

use axum::{
  Json,
  extract::{Path, State},
};
use garb_core::{ids::CategoryId, index::VariantIndex};
use garb_engine::{orchestrator::CatalogView, payload::CriteriaPayload};

use crate::{AppState, error::ApiError};

pub async fn handler<I>(
  State(state): State<AppState<I>>,
  Path(category_id): Path<u64>,
  Json(payload): Json<CriteriaPayload>,
) -> Result<Json<CatalogView>, ApiError>
where
  I: VariantIndex,
{
  let category = CategoryId(category_id);

  let view = tokio::time::timeout(state.query_timeout, async {
    let resolved = state.orchestrator.resolve(category, &payload).await?;
    state
      .orchestrator
      .build_catalog_view(
        category,
        &resolved.criteria,
        resolved.sort,
        resolved.page,
      )
      .await
  })
  .await
  .map_err(|_| ApiError::Timeout)??;

  Ok(Json(view))
}
