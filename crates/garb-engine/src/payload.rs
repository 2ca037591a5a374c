//! The raw criteria payload accepted at the query boundary, and its
//! resolution against a category's attribute catalog.
//!
//! Resolution is deliberately forgiving: unknown attribute slugs, unknown
//! value tokens, and malformed price bounds are normalised away rather than
//! rejected. The orchestrator produces a best-effort view; validating user
//! input is the transport layer's job.

use std::collections::{BTreeMap, BTreeSet};

use garb_core::{
  attribute::{AttributeCatalog, AttributeDefinition},
  criteria::{FilterCriteria, PageRequest, SortOrder},
  ids::{BrandId, CategoryId, ProductTypeId, ValueId},
};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Keys that ride along inside the `filters` map in some client revisions
/// but are not attribute selections.
const RESERVED_FILTER_KEYS: [&str; 2] = ["min_price", "max_price"];

// ─── Payload ─────────────────────────────────────────────────────────────────

/// The wire shape of one catalog query, as sent by the rendering layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CriteriaPayload {
  /// Attribute slug → selected value tokens (raw values or numeric ids).
  #[serde(default)]
  pub filters:       BTreeMap<String, Vec<String>>,
  /// Accepted as number or string; anything unparsable is treated as
  /// absent.
  #[serde(default)]
  pub min_price:     Option<serde_json::Value>,
  #[serde(default)]
  pub max_price:     Option<serde_json::Value>,
  #[serde(default)]
  pub sort:          Option<String>,
  #[serde(default)]
  pub brands:        Vec<u64>,
  #[serde(default)]
  pub product_types: Vec<u64>,
  #[serde(default)]
  pub page:          Option<u32>,
  #[serde(default)]
  pub per_page:      Option<u32>,
}

/// The fully-resolved form of a [`CriteriaPayload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
  pub criteria: FilterCriteria,
  pub sort:     SortOrder,
  pub page:     PageRequest,
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve a raw payload against `catalog` into criteria for `category`.
pub fn resolve_criteria(
  payload: &CriteriaPayload,
  category: CategoryId,
  catalog: &AttributeCatalog,
) -> ResolvedQuery {
  let mut criteria = FilterCriteria::for_category(category);

  for (slug, tokens) in &payload.filters {
    if RESERVED_FILTER_KEYS.contains(&slug.as_str()) {
      continue;
    }
    let Some(key) = catalog.resolve_slug(slug) else {
      tracing::debug!(slug, "ignoring unknown filter attribute");
      continue;
    };

    let definition = catalog.by_key(&key);
    let values: BTreeSet<ValueId> = tokens
      .iter()
      .filter_map(|token| resolve_value(definition, token))
      .collect();
    criteria.attribute_selections.insert(key, values);
  }

  criteria.min_price =
    payload.min_price.as_ref().and_then(parse_price);
  criteria.max_price =
    payload.max_price.as_ref().and_then(parse_price);
  criteria.brand_ids =
    payload.brands.iter().copied().map(BrandId).collect();
  criteria.product_type_ids =
    payload.product_types.iter().copied().map(ProductTypeId).collect();

  let sort = payload
    .sort
    .as_deref()
    .map(SortOrder::parse)
    .unwrap_or_default();
  let page = PageRequest {
    page:     payload.page.unwrap_or(1),
    per_page: payload
      .per_page
      .unwrap_or(garb_core::criteria::DEFAULT_PER_PAGE),
  }
  .normalised();

  ResolvedQuery { criteria, sort, page }
}

/// Map one value token to a value id.
///
/// Tokens match a defined value's `raw_value` first; failing that, a token
/// that parses as an id known to the definition is accepted. With no
/// definition at hand (a system axis the category does not carry), only
/// numeric tokens can resolve.
fn resolve_value(
  definition: Option<&AttributeDefinition>,
  token: &str,
) -> Option<ValueId> {
  if let Some(def) = definition {
    if let Some(value) =
      def.values.iter().find(|value| value.raw_value == token)
    {
      return Some(value.id);
    }
    return token
      .parse::<u64>()
      .ok()
      .map(ValueId)
      .filter(|id| def.values.iter().any(|value| value.id == *id));
  }
  token.parse::<u64>().ok().map(ValueId)
}

fn parse_price(raw: &serde_json::Value) -> Option<Decimal> {
  let parsed = match raw {
    serde_json::Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
    serde_json::Value::String(s) => s.trim().parse::<Decimal>().ok(),
    _ => None,
  };
  parsed.filter(|price| *price >= Decimal::ZERO)
}

#[cfg(test)]
mod tests {
  use garb_core::attribute::AttributeKey;
  use serde_json::json;

  use super::*;
  use crate::fixtures::*;

  fn catalog() -> AttributeCatalog {
    AttributeCatalog::new(attributes())
  }

  fn payload(body: serde_json::Value) -> CriteriaPayload {
    serde_json::from_value(body).unwrap()
  }

  #[test]
  fn raw_values_and_numeric_ids_both_resolve() {
    let resolved = resolve_criteria(
      &payload(json!({
        "filters": { "color": ["Blue"], "material": ["41"] }
      })),
      CLOTHING,
      &catalog(),
    );

    assert_eq!(
      resolved.criteria.attribute_selections[&COLOR],
      BTreeSet::from([BLUE])
    );
    assert_eq!(
      resolved.criteria.attribute_selections
        [&AttributeKey::Custom(MATERIAL)],
      BTreeSet::from([POLYESTER])
    );
  }

  #[test]
  fn unknown_slugs_and_tokens_are_dropped() {
    let resolved = resolve_criteria(
      &payload(json!({
        "filters": {
          "fabric_weight": ["300"],
          "color": ["Chartreuse"]
        }
      })),
      CLOTHING,
      &catalog(),
    );

    assert!(
      !resolved
        .criteria
        .attribute_selections
        .keys()
        .any(|key| matches!(key, AttributeKey::Custom(_)))
    );
    // The colour selection survives as an empty (neutral) set.
    assert_eq!(
      resolved.criteria.attribute_selections[&COLOR],
      BTreeSet::new()
    );
    assert_eq!(resolved.criteria.active_selections().count(), 0);
  }

  #[test]
  fn price_keys_inside_filters_are_not_selections() {
    let resolved = resolve_criteria(
      &payload(json!({
        "filters": { "min_price": ["100"], "max_price": ["200"] }
      })),
      CLOTHING,
      &catalog(),
    );
    assert!(resolved.criteria.attribute_selections.is_empty());
  }

  #[test]
  fn malformed_prices_are_absent() {
    let resolved = resolve_criteria(
      &payload(json!({
        "min_price": "not-a-number",
        "max_price": -5
      })),
      CLOTHING,
      &catalog(),
    );
    assert_eq!(resolved.criteria.min_price, None);
    assert_eq!(resolved.criteria.max_price, None);
  }

  #[test]
  fn numeric_and_string_prices_parse() {
    let resolved = resolve_criteria(
      &payload(json!({ "min_price": 100, "max_price": "2500.50" })),
      CLOTHING,
      &catalog(),
    );
    assert_eq!(resolved.criteria.min_price, Some(Decimal::from(100)));
    assert_eq!(
      resolved.criteria.max_price,
      Some("2500.50".parse().unwrap())
    );
  }

  #[test]
  fn unknown_sort_falls_back_to_newest() {
    let resolved = resolve_criteria(
      &payload(json!({ "sort": "alphabetical" })),
      CLOTHING,
      &catalog(),
    );
    assert_eq!(resolved.sort, SortOrder::Newest);
  }

  #[test]
  fn page_zero_normalises_to_first_page() {
    let resolved = resolve_criteria(
      &payload(json!({ "page": 0, "per_page": 0 })),
      CLOTHING,
      &catalog(),
    );
    assert_eq!(resolved.page.page, 1);
    assert_eq!(resolved.page.per_page, 1);
  }
}
