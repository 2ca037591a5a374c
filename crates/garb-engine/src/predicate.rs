//! The shared predicate builder.
//!
//! Both the filter engine and the facet availability engine derive their
//! index predicates here, parameterised by the attribute to exclude, so the
//! two cannot drift apart. Earlier incarnations of this system rebuilt the
//! same predicate in several places and disagreed on edge cases (empty
//! value lists in particular).

use std::collections::BTreeSet;

use garb_core::{
  attribute::AttributeKey,
  criteria::FilterCriteria,
  ids::ProductId,
  index::{FactFilter, ProductQuery, ValueMembership, VariantIndex},
};

use crate::{Error, Result};

/// Build the fact predicate for `criteria`.
///
/// `exclude` removes one attribute's own selection — the self-exclusion
/// rule facet availability depends on. `products`, when given, restricts
/// the scan to a previously-resolved product set (used for product-type
/// selections, which the fact rows cannot express themselves).
///
/// Selections with an empty value set never reach the predicate: an empty
/// selection means "no constraint from this attribute", not "match
/// nothing".
pub fn criteria_filter(
  criteria: &FilterCriteria,
  exclude: Option<AttributeKey>,
  products: Option<BTreeSet<ProductId>>,
) -> FactFilter {
  FactFilter {
    category: Some(criteria.category_id),
    eligible_only: true,
    min_price: criteria.min_price,
    max_price: criteria.max_price,
    brands: criteria.brand_ids.clone(),
    products,
    attribute: None,
    memberships: criteria
      .active_selections()
      .filter(|(key, _)| exclude.as_ref() != Some(key))
      .map(|(key, values)| ValueMembership {
        attribute: *key,
        values:    values.clone(),
      })
      .collect(),
  }
}

/// Resolve a product-type selection into a product-id restriction.
///
/// Returns `None` when the criteria carry no product-type constraint; an
/// empty restriction (the selected types have no products) correctly
/// matches nothing downstream.
pub async fn type_restriction<I>(
  index: &I,
  criteria: &FilterCriteria,
) -> Result<Option<BTreeSet<ProductId>>>
where
  I: VariantIndex,
{
  if criteria.product_type_ids.is_empty() {
    return Ok(None);
  }

  let query = ProductQuery {
    category: Some(criteria.category_id),
    product_types: criteria.product_type_ids.clone(),
    ..ProductQuery::default()
  };
  let products = index.products(&query).await.map_err(Error::index)?;
  Ok(Some(products.into_iter().map(|info| info.product_id).collect()))
}
