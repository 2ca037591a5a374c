//! Shared test fixture: a tiny clothing category with one in-stock and one
//! out-of-stock variant, mirrored by several engine test modules.

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use garb_core::{
  attribute::{
    AttributeDefinition, AttributeKey, AttributeValue, SystemAttribute,
  },
  criteria::FilterCriteria,
  ids::{
    BrandId, CategoryId, ProductId, ProductTypeId, PropertyId, ValueId,
    WarehouseId,
  },
  memory::MemoryIndex,
  source::{
    CatalogSource, PriceEntry, PriceKind, PropertyValueRef, SourceProduct,
    SourceVariant, StockEntry,
  },
};
use rust_decimal::Decimal;

pub const CLOTHING: CategoryId = CategoryId(1);

pub const BLUE: ValueId = ValueId(1);
pub const RED: ValueId = ValueId(2);
pub const SIZE_L: ValueId = ValueId(10);
pub const SIZE_S: ValueId = ValueId(11);
pub const MALE: ValueId = ValueId(21);
pub const FEMALE: ValueId = ValueId(22);
pub const COTTON: ValueId = ValueId(40);
pub const POLYESTER: ValueId = ValueId(41);

pub const MATERIAL: PropertyId = PropertyId(9);

pub const BLUE_TEE: ProductId = ProductId(1);
pub const RED_HOODIE: ProductId = ProductId(2);

pub const COLOR: AttributeKey = AttributeKey::System(SystemAttribute::Color);
pub const SIZE: AttributeKey = AttributeKey::System(SystemAttribute::Size);
pub const GENDER: AttributeKey =
  AttributeKey::System(SystemAttribute::Gender);

fn value(id: ValueId, raw: &str, priority: i32) -> AttributeValue {
  AttributeValue {
    id,
    raw_value: raw.to_owned(),
    label: None,
    priority,
  }
}

pub fn attributes() -> Vec<AttributeDefinition> {
  vec![
    AttributeDefinition {
      key:          COLOR,
      slug:         "color".into(),
      display_name: "Colour".into(),
      unit_symbol:  None,
      priority:     1,
      values:       vec![value(BLUE, "Blue", 1), value(RED, "Red", 2)],
    },
    AttributeDefinition {
      key:          SIZE,
      slug:         "size".into(),
      display_name: "Size".into(),
      unit_symbol:  None,
      priority:     2,
      values:       vec![value(SIZE_L, "L", 10), value(SIZE_S, "S", 5)],
    },
    AttributeDefinition {
      key:          GENDER,
      slug:         "gender".into(),
      display_name: "Gender".into(),
      unit_symbol:  None,
      priority:     3,
      values:       vec![value(MALE, "Male", 1), value(FEMALE, "Female", 2)],
    },
    AttributeDefinition {
      key:          AttributeKey::Custom(MATERIAL),
      slug:         "material".into(),
      display_name: "Material".into(),
      unit_symbol:  None,
      priority:     4,
      values:       vec![
        value(COTTON, "Cotton", 1),
        value(POLYESTER, "Polyester", 2),
      ],
    },
  ]
}

pub fn clothing_source() -> CatalogSource {
  CatalogSource {
    attributes: attributes(),
    products:   vec![
      SourceProduct {
        id: BLUE_TEE,
        category_id: CLOTHING,
        brand_id: BrandId(1),
        product_type_id: Some(ProductTypeId(100)),
        title: "Blue t-shirt".into(),
        slug: "blue-tshirt".into(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap(),
        is_active: true,
        property_values: vec![PropertyValueRef {
          property: MATERIAL,
          value:    COTTON,
        }],
        variants: vec![SourceVariant {
          id:     garb_core::ids::VariantId(1),
          sku:    "BLUE-L-MALE".into(),
          color:  Some(BLUE),
          size:   Some(SIZE_L),
          gender: Some(MALE),
          prices: vec![PriceEntry {
            kind:   PriceKind::Retail,
            amount: Decimal::from(2000),
          }],
          stocks: vec![StockEntry {
            warehouse_id: WarehouseId(1),
            quantity:     10,
          }],
        }],
      },
      SourceProduct {
        id: RED_HOODIE,
        category_id: CLOTHING,
        brand_id: BrandId(2),
        product_type_id: Some(ProductTypeId(101)),
        title: "Red hoodie".into(),
        slug: "red-hoodie".into(),
        created_at: Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap(),
        is_active: true,
        property_values: vec![PropertyValueRef {
          property: MATERIAL,
          value:    POLYESTER,
        }],
        variants: vec![SourceVariant {
          id:     garb_core::ids::VariantId(2),
          sku:    "RED-S-FEMALE".into(),
          color:  Some(RED),
          size:   Some(SIZE_S),
          gender: Some(FEMALE),
          prices: vec![PriceEntry {
            kind:   PriceKind::Retail,
            amount: Decimal::from(5000),
          }],
          // Out of stock: must never match or count as available.
          stocks: vec![StockEntry {
            warehouse_id: WarehouseId(1),
            quantity:     0,
          }],
        }],
      },
    ],
  }
}

pub fn clothing_index() -> MemoryIndex {
  let (index, violations) = MemoryIndex::from_source(&clothing_source());
  assert!(violations.is_empty(), "fixture must be clean: {violations:?}");
  index
}

pub fn select(
  criteria: &mut FilterCriteria,
  attribute: AttributeKey,
  values: impl IntoIterator<Item = ValueId>,
) {
  criteria
    .attribute_selections
    .insert(attribute, values.into_iter().collect::<BTreeSet<_>>());
}
