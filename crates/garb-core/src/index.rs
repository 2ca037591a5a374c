//! The `VariantIndex` trait and its query types.
//!
//! The trait is implemented by storage backends (the in-memory
//! [`MemoryIndex`](crate::memory::MemoryIndex), the SQLite index crate).
//! Higher layers depend on this abstraction, not on any concrete backend.

use std::{
  collections::{BTreeMap, BTreeSet},
  future::Future,
};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  attribute::{AttributeCatalog, AttributeKey},
  fact::VariantFact,
  ids::{BrandId, CategoryId, ProductId, ProductTypeId, ValueId, VariantId},
};

// ─── Fact predicate ──────────────────────────────────────────────────────────

/// A semi-join constraint: the variant must possess at least one fact with
/// this attribute and one of these values. Constraints are AND-combined
/// across attributes; the value set is an OR within one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueMembership {
  pub attribute: AttributeKey,
  pub values:    BTreeSet<ValueId>,
}

/// The conjunction of predicates a [`VariantIndex::scan`] evaluates.
///
/// Everything except `memberships` is a plain row filter; the membership
/// constraints are evaluated per variant across its fact rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactFilter {
  pub category:      Option<CategoryId>,
  /// Restrict to active, in-stock rows.
  pub eligible_only: bool,
  /// Inclusive bounds.
  pub min_price:     Option<Decimal>,
  pub max_price:     Option<Decimal>,
  /// Empty set means no brand constraint.
  pub brands:        BTreeSet<BrandId>,
  /// When set, only facts of these products survive (an empty set matches
  /// nothing).
  pub products:      Option<BTreeSet<ProductId>>,
  /// When set, only facts of this attribute are returned. Does not affect
  /// which variants qualify, only which of their rows come back.
  pub attribute:     Option<AttributeKey>,
  pub memberships:   Vec<ValueMembership>,
}

impl FactFilter {
  /// Eligible facts of one category, unconstrained otherwise.
  pub fn eligible_in(category: CategoryId) -> Self {
    Self {
      category: Some(category),
      eligible_only: true,
      ..Self::default()
    }
  }

  /// Evaluate the row-level predicates against a single fact. Membership
  /// constraints are deliberately not checked here — they need the
  /// variant's whole fact set.
  pub fn row_matches(&self, fact: &VariantFact) -> bool {
    if let Some(category) = self.category
      && fact.category_id != category
    {
      return false;
    }
    if self.eligible_only && !fact.eligible() {
      return false;
    }
    if let Some(min) = self.min_price
      && fact.price < min
    {
      return false;
    }
    if let Some(max) = self.max_price
      && fact.price > max
    {
      return false;
    }
    if !self.brands.is_empty() && !self.brands.contains(&fact.brand_id) {
      return false;
    }
    if let Some(products) = &self.products
      && !products.contains(&fact.product_id)
    {
      return false;
    }
    if let Some(attribute) = &self.attribute
      && &fact.attribute != attribute
    {
      return false;
    }
    true
  }
}

// ─── Facet probes ────────────────────────────────────────────────────────────

/// One availability question: which values of `attribute` survive `filter`?
///
/// The probe's attribute restricts the returned rows; `filter.attribute` is
/// overwritten by backends, so callers need not set it.
#[derive(Debug, Clone)]
pub struct FacetProbe {
  pub attribute: AttributeKey,
  pub filter:    FactFilter,
}

/// One surviving (attribute, value) pair, with the number of distinct
/// variants that back it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetHit {
  pub attribute:     AttributeKey,
  pub value_id:      ValueId,
  pub variant_count: u64,
}

// ─── Product directory ───────────────────────────────────────────────────────

/// Product metadata maintained alongside the fact rows; used for grid
/// hydration and the orderings the fact rows cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
  pub product_id:      ProductId,
  pub category_id:     CategoryId,
  pub brand_id:        BrandId,
  pub product_type_id: Option<ProductTypeId>,
  pub title:           String,
  pub slug:            String,
  pub created_at:      DateTime<Utc>,
}

/// Parameters for [`VariantIndex::products`]. All present constraints are
/// AND-combined.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
  pub ids:           Option<BTreeSet<ProductId>>,
  pub category:      Option<CategoryId>,
  /// Empty set means no product-type constraint.
  pub product_types: BTreeSet<ProductTypeId>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the denormalised variant index.
///
/// The index is read-only at query time and eventually consistent with the
/// authoritative catalog (consistency window = time since the last rebuild).
/// Implementations must tolerate being queried during or immediately after
/// a truncate-repopulate cycle: an empty result, never an error.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait VariantIndex: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return every fact satisfying `filter`, including its semi-join
  /// membership constraints.
  fn scan<'a>(
    &'a self,
    filter: &'a FactFilter,
  ) -> impl Future<Output = Result<Vec<VariantFact>, Self::Error>> + Send + 'a;

  /// Answer a batch of availability probes in one pass.
  ///
  /// The provided implementation folds one [`scan`](Self::scan) per probe;
  /// backends with a cheaper batched plan (e.g. a single UNION ALL
  /// compound query) should override it.
  fn facet_values<'a>(
    &'a self,
    probes: &'a [FacetProbe],
  ) -> impl Future<Output = Result<Vec<FacetHit>, Self::Error>> + Send + 'a {
    async move {
      let mut hits = Vec::new();
      for probe in probes {
        let mut filter = probe.filter.clone();
        filter.attribute = Some(probe.attribute);
        let facts = self.scan(&filter).await?;

        let mut variants_by_value: BTreeMap<ValueId, BTreeSet<VariantId>> =
          BTreeMap::new();
        for fact in facts {
          variants_by_value
            .entry(fact.value_id)
            .or_default()
            .insert(fact.variant_id);
        }
        hits.extend(variants_by_value.into_iter().map(|(value_id, variants)| {
          FacetHit {
            attribute: probe.attribute,
            value_id,
            variant_count: variants.len() as u64,
          }
        }));
      }
      Ok(hits)
    }
  }

  /// The filterable attributes of a category: every attribute occurring
  /// among the category's facts, each carrying its full defined value list.
  fn attribute_catalog(
    &self,
    category: CategoryId,
  ) -> impl Future<Output = Result<AttributeCatalog, Self::Error>> + Send + '_;

  /// Look up product metadata.
  fn products<'a>(
    &'a self,
    query: &'a ProductQuery,
  ) -> impl Future<Output = Result<Vec<ProductInfo>, Self::Error>> + Send + 'a;
}
