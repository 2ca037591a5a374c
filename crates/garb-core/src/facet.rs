//! Facet results — the computed sidebar model. Derived per request, never
//! persisted.

use serde::{Deserialize, Serialize};

use crate::{attribute::AttributeKey, ids::ValueId};

/// One selectable value of a facet, with its availability under the other
/// active filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
  pub value_id:    ValueId,
  pub raw_value:   String,
  /// Display label; already falls back to `raw_value` when no override is
  /// defined.
  pub label:       String,
  /// Whether selecting this value, on top of the other active filters,
  /// still yields at least one result.
  pub available:   bool,
  /// Distinct in-stock variants that would match, when the backend reports
  /// counts.
  pub match_count: Option<u64>,
}

/// One filterable attribute with its candidate values, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResult {
  pub attribute:    AttributeKey,
  pub slug:         String,
  pub display_name: String,
  pub unit_symbol:  Option<String>,
  pub values:       Vec<FacetValue>,
}
