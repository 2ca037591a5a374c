//! In-memory `VariantIndex` backend.
//!
//! Backs the scan contract with a grouped index (variant id → set of
//! (attribute, value) pairs) so semi-join membership constraints are a hash
//! lookup per variant. Useful as a test substrate and for small catalogs
//! served entirely from memory.

use std::collections::{BTreeSet, HashMap};
use std::convert::Infallible;

use crate::{
  attribute::{AttributeCatalog, AttributeDefinition, AttributeKey},
  fact::VariantFact,
  ids::{CategoryId, ValueId, VariantId},
  index::{FactFilter, ProductInfo, ProductQuery, VariantIndex},
  source::{self, CatalogSource, SourceViolation},
};

/// An immutable in-memory snapshot of the variant index.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
  attributes:     Vec<AttributeDefinition>,
  products:       Vec<ProductInfo>,
  facts:          Vec<VariantFact>,
  variant_values: HashMap<VariantId, BTreeSet<(AttributeKey, ValueId)>>,
}

impl MemoryIndex {
  pub fn new(
    attributes: Vec<AttributeDefinition>,
    products: Vec<ProductInfo>,
    facts: Vec<VariantFact>,
  ) -> Self {
    let mut variant_values: HashMap<_, BTreeSet<_>> = HashMap::new();
    for fact in &facts {
      variant_values
        .entry(fact.variant_id)
        .or_default()
        .insert((fact.attribute, fact.value_id));
    }
    Self { attributes, products, facts, variant_values }
  }

  /// Flatten authoritative records into a fresh snapshot. Violations are
  /// returned for the caller to log.
  pub fn from_source(
    source: &CatalogSource,
  ) -> (Self, Vec<SourceViolation>) {
    let flat = source::flatten(source);
    (
      Self::new(flat.attributes, flat.products, flat.facts),
      flat.violations,
    )
  }

  pub fn fact_count(&self) -> usize { self.facts.len() }

  fn memberships_hold(&self, filter: &FactFilter, variant: VariantId) -> bool {
    let values = self.variant_values.get(&variant);
    filter.memberships.iter().all(|membership| {
      values.is_some_and(|pairs| {
        membership
          .values
          .iter()
          .any(|value| pairs.contains(&(membership.attribute, *value)))
      })
    })
  }
}

impl VariantIndex for MemoryIndex {
  type Error = Infallible;

  async fn scan(
    &self,
    filter: &FactFilter,
  ) -> Result<Vec<VariantFact>, Infallible> {
    Ok(
      self
        .facts
        .iter()
        .filter(|fact| {
          filter.row_matches(fact)
            && self.memberships_hold(filter, fact.variant_id)
        })
        .cloned()
        .collect(),
    )
  }

  async fn attribute_catalog(
    &self,
    category: CategoryId,
  ) -> Result<AttributeCatalog, Infallible> {
    let present: BTreeSet<AttributeKey> = self
      .facts
      .iter()
      .filter(|fact| fact.category_id == category)
      .map(|fact| fact.attribute)
      .collect();

    Ok(AttributeCatalog::new(
      self
        .attributes
        .iter()
        .filter(|def| present.contains(&def.key))
        .cloned()
        .collect(),
    ))
  }

  async fn products(
    &self,
    query: &ProductQuery,
  ) -> Result<Vec<ProductInfo>, Infallible> {
    Ok(
      self
        .products
        .iter()
        .filter(|info| {
          query
            .ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&info.product_id))
            && query
              .category
              .is_none_or(|category| info.category_id == category)
            && (query.product_types.is_empty()
              || info
                .product_type_id
                .is_some_and(|t| query.product_types.contains(&t)))
        })
        .cloned()
        .collect(),
    )
  }
}
