//! Authoritative catalog records — the input to an index rebuild.
//!
//! These mirror the upstream product/variant/price/stock tables. The rebuild
//! flattens them into [`VariantFact`] rows: one fact per (variant,
//! attribute, value), carrying the variant's retail price and its stock
//! summed across warehouses. Invariant violations are rejected here, at
//! rebuild time, so query-time code never has to re-validate the index.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  attribute::{AttributeDefinition, AttributeKey, SystemAttribute},
  fact::VariantFact,
  ids::{
    BrandId, CategoryId, ProductId, ProductTypeId, PropertyId, ValueId,
    VariantId, WarehouseId,
  },
  index::ProductInfo,
};

// ─── Records ─────────────────────────────────────────────────────────────────

/// A full dump of the authoritative catalog, as handed to the rebuild.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSource {
  /// Attribute reference data: the three system dictionaries plus every
  /// custom property, each with its defined values.
  #[serde(default)]
  pub attributes: Vec<AttributeDefinition>,
  #[serde(default)]
  pub products:   Vec<SourceProduct>,
}

/// A product-level link to a custom property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValueRef {
  pub property: PropertyId,
  pub value:    ValueId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceProduct {
  pub id:              ProductId,
  pub category_id:     CategoryId,
  pub brand_id:        BrandId,
  pub product_type_id: Option<ProductTypeId>,
  pub title:           String,
  pub slug:            String,
  pub created_at:      DateTime<Utc>,
  pub is_active:       bool,
  /// Custom property values attach at the product level; every variant of
  /// the product inherits them.
  #[serde(default)]
  pub property_values: Vec<PropertyValueRef>,
  #[serde(default)]
  pub variants:        Vec<SourceVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceVariant {
  pub id:     VariantId,
  pub sku:    String,
  pub color:  Option<ValueId>,
  pub size:   Option<ValueId>,
  pub gender: Option<ValueId>,
  #[serde(default)]
  pub prices: Vec<PriceEntry>,
  #[serde(default)]
  pub stocks: Vec<StockEntry>,
}

impl SourceVariant {
  /// The retail-type price, or zero when none is recorded. Filtering and
  /// sorting always use the retail price.
  pub fn retail_price(&self) -> Decimal {
    self
      .prices
      .iter()
      .find(|entry| entry.kind == PriceKind::Retail)
      .map(|entry| entry.amount)
      .unwrap_or_default()
  }

  /// Total stock across warehouses.
  pub fn total_stock(&self) -> i64 {
    self.stocks.iter().map(|line| line.quantity).sum()
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PriceKind {
  Retail,
  Wholesale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
  pub kind:   PriceKind,
  pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
  pub warehouse_id: WarehouseId,
  pub quantity:     i64,
}

// ─── Violations ──────────────────────────────────────────────────────────────

/// A source row the flattening refused to index. Reported to the caller so
/// the rebuild can log it loudly; never surfaced at query time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceViolation {
  #[error("variant {variant} has negative retail price {price}")]
  NegativePrice { variant: VariantId, price: Decimal },

  #[error("variant {variant} has a negative stock line ({quantity})")]
  NegativeStock { variant: VariantId, quantity: i64 },

  #[error("duplicate fact for variant {variant}, attribute {attribute}, value {value}")]
  DuplicateFact {
    variant:   VariantId,
    attribute: AttributeKey,
    value:     ValueId,
  },
}

// ─── Flattening ──────────────────────────────────────────────────────────────

/// The result of flattening a [`CatalogSource`] into index rows.
#[derive(Debug, Clone, Default)]
pub struct FlattenedCatalog {
  pub attributes: Vec<AttributeDefinition>,
  pub products:   Vec<ProductInfo>,
  pub facts:      Vec<VariantFact>,
  pub violations: Vec<SourceViolation>,
}

/// Flatten authoritative records into fact and product rows.
///
/// Variants with a negative retail price or a negative stock line are
/// skipped wholesale; duplicate (variant, attribute, value) tuples keep the
/// first occurrence. Both are reported as violations.
pub fn flatten(source: &CatalogSource) -> FlattenedCatalog {
  let mut out = FlattenedCatalog {
    attributes: source.attributes.clone(),
    ..FlattenedCatalog::default()
  };

  for product in &source.products {
    out.products.push(ProductInfo {
      product_id:      product.id,
      category_id:     product.category_id,
      brand_id:        product.brand_id,
      product_type_id: product.product_type_id,
      title:           product.title.clone(),
      slug:            product.slug.clone(),
      created_at:      product.created_at,
    });

    for variant in &product.variants {
      let price = variant.retail_price();
      if price < Decimal::ZERO {
        out.violations.push(SourceViolation::NegativePrice {
          variant: variant.id,
          price,
        });
        continue;
      }
      if let Some(line) =
        variant.stocks.iter().find(|line| line.quantity < 0)
      {
        out.violations.push(SourceViolation::NegativeStock {
          variant:  variant.id,
          quantity: line.quantity,
        });
        continue;
      }
      let stock = variant.total_stock();

      let system_pairs = [
        (SystemAttribute::Color, variant.color),
        (SystemAttribute::Size, variant.size),
        (SystemAttribute::Gender, variant.gender),
      ];
      let pairs = system_pairs
        .into_iter()
        .filter_map(|(sys, value)| {
          value.map(|value| (AttributeKey::System(sys), value))
        })
        .chain(product.property_values.iter().map(|link| {
          (AttributeKey::Custom(link.property), link.value)
        }));

      let mut seen: BTreeSet<(AttributeKey, ValueId)> = BTreeSet::new();
      for (attribute, value) in pairs {
        if !seen.insert((attribute, value)) {
          out.violations.push(SourceViolation::DuplicateFact {
            variant: variant.id,
            attribute,
            value,
          });
          continue;
        }
        out.facts.push(VariantFact {
          product_id: product.id,
          variant_id: variant.id,
          category_id: product.category_id,
          brand_id: product.brand_id,
          attribute,
          value_id: value,
          price,
          stock,
          is_active: product.is_active,
        });
      }
    }
  }

  out
}
