//! Filter criteria — one user's current filter state, passed explicitly
//! through every layer.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  attribute::AttributeKey,
  ids::{BrandId, CategoryId, ProductTypeId, ValueId},
};

// ─── Criteria ────────────────────────────────────────────────────────────────

/// The resolved filter state for one request.
///
/// Values within one attribute's selection are OR-combined; different
/// attributes are AND-combined; price bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
  pub category_id:          CategoryId,
  pub attribute_selections: BTreeMap<AttributeKey, BTreeSet<ValueId>>,
  pub min_price:            Option<Decimal>,
  pub max_price:            Option<Decimal>,
  pub brand_ids:            BTreeSet<BrandId>,
  pub product_type_ids:     BTreeSet<ProductTypeId>,
}

impl FilterCriteria {
  /// Criteria with no filters beyond category membership.
  pub fn for_category(category_id: CategoryId) -> Self {
    Self {
      category_id,
      attribute_selections: BTreeMap::new(),
      min_price: None,
      max_price: None,
      brand_ids: BTreeSet::new(),
      product_type_ids: BTreeSet::new(),
    }
  }

  /// Attribute selections that actually constrain anything. An attribute
  /// key present with an empty value set is a no-op, not "match nothing".
  pub fn active_selections(
    &self,
  ) -> impl Iterator<Item = (&AttributeKey, &BTreeSet<ValueId>)> {
    self
      .attribute_selections
      .iter()
      .filter(|(_, values)| !values.is_empty())
  }
}

// ─── Sort ────────────────────────────────────────────────────────────────────

/// Catalog grid ordering.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
  #[default]
  Newest,
  PriceAsc,
  PriceDesc,
}

impl SortOrder {
  /// Lenient parse: unrecognised sort strings fall back to [`Self::Newest`].
  pub fn parse(raw: &str) -> Self {
    match raw {
      "price_asc" => Self::PriceAsc,
      "price_desc" => Self::PriceDesc,
      _ => Self::Newest,
    }
  }
}

// ─── Pagination ──────────────────────────────────────────────────────────────

pub const DEFAULT_PER_PAGE: u32 = 12;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
  pub page:     u32,
  pub per_page: u32,
}

impl Default for PageRequest {
  fn default() -> Self { Self { page: 1, per_page: DEFAULT_PER_PAGE } }
}

impl PageRequest {
  /// Clamp out-of-range values (page 0, zero-sized pages) to sane ones.
  pub fn normalised(self) -> Self {
    Self {
      page:     self.page.max(1),
      per_page: self.per_page.clamp(1, 100),
    }
  }

  pub fn offset(self) -> usize {
    let normalised = self.normalised();
    (normalised.page as usize - 1) * normalised.per_page as usize
  }
}
