//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Attribute keys are stored as text: the fixed slugs for the system axes,
//! the decimal property id for custom properties. Timestamps are RFC 3339
//! strings. Prices are stored as REAL so SQL range predicates keep numeric
//! affinity; decoding rounds back to two decimal places, the scale of the
//! upstream price columns.

use chrono::{DateTime, Utc};
use garb_core::{
  attribute::{
    AttributeDefinition, AttributeKey, AttributeValue, SystemAttribute,
  },
  fact::VariantFact,
  ids::{
    BrandId, CategoryId, ProductId, ProductTypeId, PropertyId, ValueId,
    VariantId,
  },
  index::ProductInfo,
};
use rust_decimal::{
  Decimal,
  prelude::{FromPrimitive, ToPrimitive},
};

use crate::{Error, Result};

// ─── AttributeKey ────────────────────────────────────────────────────────────

pub fn encode_attribute(key: &AttributeKey) -> String {
  match key {
    AttributeKey::System(sys) => sys.slug().to_owned(),
    AttributeKey::Custom(id) => id.to_string(),
  }
}

pub fn decode_attribute(s: &str) -> Result<AttributeKey> {
  if let Some(sys) = SystemAttribute::from_slug(s) {
    return Ok(AttributeKey::System(sys));
  }
  s.parse::<u64>()
    .map(|raw| AttributeKey::Custom(PropertyId(raw)))
    .map_err(|_| Error::Decode(format!("unknown attribute key: {s:?}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

// ─── Price ───────────────────────────────────────────────────────────────────

pub fn encode_price(price: Decimal) -> Result<f64> {
  price
    .to_f64()
    .ok_or_else(|| Error::Decode(format!("price out of range: {price}")))
}

pub fn decode_price(raw: f64) -> Result<Decimal> {
  Decimal::from_f64(raw)
    .map(|price| price.round_dp(2))
    .ok_or_else(|| Error::Decode(format!("bad stored price: {raw}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw columns of one `variant_facts` row.
pub struct RawFact {
  pub product_id:  i64,
  pub variant_id:  i64,
  pub category_id: i64,
  pub brand_id:    i64,
  pub attribute:   String,
  pub value_id:    i64,
  pub price:       f64,
  pub stock:       i64,
  pub is_active:   bool,
}

impl RawFact {
  pub fn into_fact(self) -> Result<VariantFact> {
    Ok(VariantFact {
      product_id:  ProductId(self.product_id as u64),
      variant_id:  VariantId(self.variant_id as u64),
      category_id: CategoryId(self.category_id as u64),
      brand_id:    BrandId(self.brand_id as u64),
      attribute:   decode_attribute(&self.attribute)?,
      value_id:    ValueId(self.value_id as u64),
      price:       decode_price(self.price)?,
      stock:       self.stock,
      is_active:   self.is_active,
    })
  }
}

/// Raw columns of one `products` row.
pub struct RawProduct {
  pub product_id:      i64,
  pub category_id:     i64,
  pub brand_id:        i64,
  pub product_type_id: Option<i64>,
  pub title:           String,
  pub slug:            String,
  pub created_at:      String,
}

impl RawProduct {
  pub fn into_info(self) -> Result<ProductInfo> {
    Ok(ProductInfo {
      product_id:      ProductId(self.product_id as u64),
      category_id:     CategoryId(self.category_id as u64),
      brand_id:        BrandId(self.brand_id as u64),
      product_type_id: self
        .product_type_id
        .map(|raw| ProductTypeId(raw as u64)),
      title:           self.title,
      slug:            self.slug,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw columns of one `attributes` row.
pub struct RawAttribute {
  pub attribute:    String,
  pub slug:         String,
  pub display_name: String,
  pub unit_symbol:  Option<String>,
  pub priority:     i64,
}

/// Raw columns of one `attribute_values` row.
pub struct RawAttributeValue {
  pub attribute: String,
  pub value_id:  i64,
  pub raw_value: String,
  pub label:     Option<String>,
  pub priority:  i64,
}

impl RawAttribute {
  /// Assemble a definition from its meta row and value rows.
  pub fn into_definition(
    self,
    values: Vec<RawAttributeValue>,
  ) -> Result<AttributeDefinition> {
    Ok(AttributeDefinition {
      key:          decode_attribute(&self.attribute)?,
      slug:         self.slug,
      display_name: self.display_name,
      unit_symbol:  self.unit_symbol,
      priority:     self.priority as i32,
      values:       values
        .into_iter()
        .map(|raw| AttributeValue {
          id:        ValueId(raw.value_id as u64),
          raw_value: raw.raw_value,
          label:     raw.label,
          priority:  raw.priority as i32,
        })
        .collect(),
    })
  }
}
