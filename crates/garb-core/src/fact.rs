//! Variant facts — the row unit of the denormalised filter index.
//!
//! A fact is one (variant, attribute, value) tuple carrying the price and
//! stock captured at rebuild time; a variant with three attributes produces
//! three facts. Facts are derived, never hand-edited: the rebuild truncates
//! and repopulates them wholesale from the authoritative catalog records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  attribute::AttributeKey,
  ids::{BrandId, CategoryId, ProductId, ValueId, VariantId},
};

/// One row of the variant index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFact {
  pub product_id:  ProductId,
  pub variant_id:  VariantId,
  pub category_id: CategoryId,
  pub brand_id:    BrandId,
  pub attribute:   AttributeKey,
  pub value_id:    ValueId,
  /// Retail price of the variant at rebuild time.
  pub price:       Decimal,
  /// Total stock across warehouses at rebuild time.
  pub stock:       i64,
  pub is_active:   bool,
}

impl VariantFact {
  /// A fact contributes to filtering and availability only while its
  /// variant is active and in stock.
  pub fn eligible(&self) -> bool { self.is_active && self.stock > 0 }
}
