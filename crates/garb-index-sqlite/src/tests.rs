//! Integration tests for `SqliteIndex` against an in-memory database.

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use garb_core::{
  attribute::{
    AttributeDefinition, AttributeKey, AttributeValue, SystemAttribute,
  },
  criteria::FilterCriteria,
  ids::{
    BrandId, CategoryId, ProductId, ProductTypeId, PropertyId, ValueId,
    VariantId, WarehouseId,
  },
  index::{FacetProbe, FactFilter, ProductQuery, ValueMembership,
    VariantIndex},
  memory::MemoryIndex,
  source::{
    CatalogSource, PriceEntry, PriceKind, PropertyValueRef, SourceProduct,
    SourceVariant, StockEntry,
  },
};
use rust_decimal::Decimal;

use crate::SqliteIndex;

const CLOTHING: CategoryId = CategoryId(1);
const COLOR: AttributeKey = AttributeKey::System(SystemAttribute::Color);
const GENDER: AttributeKey = AttributeKey::System(SystemAttribute::Gender);
const BLUE: ValueId = ValueId(1);
const RED: ValueId = ValueId(2);
const MALE: ValueId = ValueId(21);
const FEMALE: ValueId = ValueId(22);

async fn index() -> SqliteIndex {
  SqliteIndex::open_in_memory().await.expect("in-memory index")
}

fn value(id: ValueId, raw: &str, priority: i32) -> AttributeValue {
  AttributeValue {
    id,
    raw_value: raw.to_owned(),
    label: None,
    priority,
  }
}

fn definition(
  key: AttributeKey,
  slug: &str,
  priority: i32,
  values: Vec<AttributeValue>,
) -> AttributeDefinition {
  AttributeDefinition {
    key,
    slug: slug.to_owned(),
    display_name: slug.to_owned(),
    unit_symbol: None,
    priority,
    values,
  }
}

fn tee_variant(
  id: u64,
  color: ValueId,
  size: ValueId,
  gender: ValueId,
  price: i64,
  stock: i64,
) -> SourceVariant {
  SourceVariant {
    id:     VariantId(id),
    sku:    format!("SKU-{id}"),
    color:  Some(color),
    size:   Some(size),
    gender: Some(gender),
    prices: vec![PriceEntry {
      kind:   PriceKind::Retail,
      amount: Decimal::from(price),
    }],
    stocks: vec![StockEntry {
      warehouse_id: WarehouseId(1),
      quantity:     stock,
    }],
  }
}

/// Two products: an in-stock blue tee and a zero-stock red hoodie.
fn clothing_source() -> CatalogSource {
  CatalogSource {
    attributes: vec![
      definition(COLOR, "color", 1, vec![
        value(BLUE, "Blue", 1),
        value(RED, "Red", 2),
      ]),
      definition(
        AttributeKey::System(SystemAttribute::Size),
        "size",
        2,
        vec![value(ValueId(11), "S", 5), value(ValueId(10), "L", 10)],
      ),
      definition(GENDER, "gender", 3, vec![
        value(MALE, "Male", 1),
        value(FEMALE, "Female", 2),
      ]),
      definition(
        AttributeKey::Custom(PropertyId(9)),
        "material",
        4,
        vec![
          value(ValueId(40), "Cotton", 1),
          value(ValueId(41), "Polyester", 2),
        ],
      ),
    ],
    products:   vec![
      SourceProduct {
        id: ProductId(1),
        category_id: CLOTHING,
        brand_id: BrandId(1),
        product_type_id: Some(ProductTypeId(100)),
        title: "Blue t-shirt".into(),
        slug: "blue-tshirt".into(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap(),
        is_active: true,
        property_values: vec![PropertyValueRef {
          property: PropertyId(9),
          value:    ValueId(40),
        }],
        variants: vec![tee_variant(1, BLUE, ValueId(10), MALE, 2000, 10)],
      },
      SourceProduct {
        id: ProductId(2),
        category_id: CLOTHING,
        brand_id: BrandId(2),
        product_type_id: Some(ProductTypeId(101)),
        title: "Red hoodie".into(),
        slug: "red-hoodie".into(),
        created_at: Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap(),
        is_active: true,
        property_values: vec![PropertyValueRef {
          property: PropertyId(9),
          value:    ValueId(41),
        }],
        variants: vec![tee_variant(2, RED, ValueId(11), FEMALE, 5000, 0)],
      },
    ],
  }
}

async fn seeded() -> SqliteIndex {
  let index = index().await;
  index.rebuild(&clothing_source()).await.unwrap();
  index
}

fn membership(
  attribute: AttributeKey,
  values: impl IntoIterator<Item = ValueId>,
) -> ValueMembership {
  ValueMembership {
    attribute,
    values: values.into_iter().collect(),
  }
}

fn product_ids(facts: &[garb_core::fact::VariantFact]) -> BTreeSet<ProductId> {
  facts.iter().map(|fact| fact.product_id).collect()
}

// ─── Scan ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_index_scans_empty() {
  let index = index().await;
  let facts =
    index.scan(&FactFilter::eligible_in(CLOTHING)).await.unwrap();
  assert!(facts.is_empty());
}

#[tokio::test]
async fn eligible_scan_excludes_zero_stock() {
  let index = seeded().await;
  let facts =
    index.scan(&FactFilter::eligible_in(CLOTHING)).await.unwrap();

  assert_eq!(product_ids(&facts), BTreeSet::from([ProductId(1)]));
  // Four facts: colour, size, gender, material.
  assert_eq!(facts.len(), 4);
}

#[tokio::test]
async fn membership_semi_join_selects_whole_variants() {
  let index = seeded().await;
  let filter = FactFilter {
    memberships: vec![membership(COLOR, [BLUE])],
    ..FactFilter::eligible_in(CLOTHING)
  };

  let facts = index.scan(&filter).await.unwrap();
  // The semi-join keeps every fact row of the matching variant.
  assert_eq!(facts.len(), 4);
  assert!(facts.iter().all(|f| f.variant_id == VariantId(1)));
}

#[tokio::test]
async fn membership_on_out_of_stock_value_matches_nothing() {
  let index = seeded().await;
  let filter = FactFilter {
    memberships: vec![membership(COLOR, [RED])],
    ..FactFilter::eligible_in(CLOTHING)
  };
  assert!(index.scan(&filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn price_bounds_are_inclusive_in_sql() {
  let index = seeded().await;
  let filter = FactFilter {
    min_price: Some(Decimal::from(2000)),
    max_price: Some(Decimal::from(2000)),
    ..FactFilter::eligible_in(CLOTHING)
  };
  let facts = index.scan(&filter).await.unwrap();
  assert_eq!(product_ids(&facts), BTreeSet::from([ProductId(1)]));
}

#[tokio::test]
async fn attribute_restriction_limits_returned_rows() {
  let index = seeded().await;
  let filter = FactFilter {
    attribute: Some(COLOR),
    ..FactFilter::eligible_in(CLOTHING)
  };
  let facts = index.scan(&filter).await.unwrap();
  assert_eq!(facts.len(), 1);
  assert_eq!(facts[0].value_id, BLUE);
}

// ─── Facet values ────────────────────────────────────────────────────────────

#[tokio::test]
async fn facet_values_answers_probes_in_one_batch() {
  let index = seeded().await;
  let probes = vec![
    FacetProbe {
      attribute: COLOR,
      filter:    FactFilter::eligible_in(CLOTHING),
    },
    FacetProbe {
      attribute: GENDER,
      filter:    FactFilter::eligible_in(CLOTHING),
    },
  ];

  let hits = index.facet_values(&probes).await.unwrap();

  let blue = hits
    .iter()
    .find(|hit| hit.attribute == COLOR && hit.value_id == BLUE)
    .expect("blue should be available");
  assert_eq!(blue.variant_count, 1);

  assert!(
    !hits.iter().any(|hit| hit.value_id == RED),
    "zero-stock red must not appear: {hits:?}"
  );
  assert!(
    hits
      .iter()
      .any(|hit| hit.attribute == GENDER && hit.value_id == MALE)
  );
  assert!(!hits.iter().any(|hit| hit.value_id == FEMALE));
}

// ─── Attribute catalog ───────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_carries_all_defined_values() {
  let index = seeded().await;
  let catalog = index.attribute_catalog(CLOTHING).await.unwrap();

  let slugs: Vec<_> = catalog
    .attributes()
    .iter()
    .map(|def| def.slug.as_str())
    .collect();
  assert_eq!(slugs, ["color", "size", "gender", "material"]);

  // Red is out of stock but still a defined value of the colour axis.
  let color = catalog.by_key(&COLOR).unwrap();
  assert_eq!(color.values.len(), 2);
}

#[tokio::test]
async fn catalog_of_unknown_category_is_empty() {
  let index = seeded().await;
  let catalog =
    index.attribute_catalog(CategoryId(99)).await.unwrap();
  assert!(catalog.is_empty());
}

// ─── Products ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn products_filter_by_type() {
  let index = seeded().await;
  let query = ProductQuery {
    category: Some(CLOTHING),
    product_types: BTreeSet::from([ProductTypeId(101)]),
    ..ProductQuery::default()
  };

  let infos = index.products(&query).await.unwrap();
  assert_eq!(infos.len(), 1);
  assert_eq!(infos[0].product_id, ProductId(2));
  assert_eq!(infos[0].slug, "red-hoodie");
}

// ─── Rebuild ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rebuild_reports_counts() {
  let index = index().await;
  let summary = index.rebuild(&clothing_source()).await.unwrap();

  assert_eq!(summary.products, 2);
  assert_eq!(summary.facts, 8);
  assert_eq!(summary.skipped, 0);
}

#[tokio::test]
async fn rebuild_replaces_previous_contents() {
  let index = seeded().await;

  let mut smaller = clothing_source();
  smaller.products.truncate(1);
  index.rebuild(&smaller).await.unwrap();

  let facts = index.scan(&FactFilter::default()).await.unwrap();
  assert_eq!(product_ids(&facts), BTreeSet::from([ProductId(1)]));
  assert_eq!(index.products(&ProductQuery::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn rebuild_skips_invariant_violations() {
  let mut source = clothing_source();
  source.products[0].variants.push(SourceVariant {
    stocks: vec![StockEntry {
      warehouse_id: WarehouseId(1),
      quantity:     -4,
    }],
    ..tee_variant(3, BLUE, ValueId(10), MALE, 1000, 0)
  });

  let index = index().await;
  let summary = index.rebuild(&source).await.unwrap();

  assert_eq!(summary.skipped, 1);
  let facts = index.scan(&FactFilter::default()).await.unwrap();
  assert!(facts.iter().all(|fact| fact.variant_id != VariantId(3)));
}

#[tokio::test]
async fn rebuild_with_zero_variants_yields_empty_scan() {
  let mut source = clothing_source();
  for product in &mut source.products {
    product.variants.clear();
  }

  let index = index().await;
  let summary = index.rebuild(&source).await.unwrap();

  assert_eq!(summary.facts, 0);
  assert!(
    index
      .scan(&FactFilter::eligible_in(CLOTHING))
      .await
      .unwrap()
      .is_empty()
  );
  // Product metadata still lands; only the fact rows are empty.
  assert_eq!(
    index.products(&ProductQuery::default()).await.unwrap().len(),
    2
  );
}

#[tokio::test]
async fn rebuild_batches_large_fact_sets() {
  let mut source = clothing_source();
  source.products = (1..=300)
    .map(|n| SourceProduct {
      id: ProductId(n),
      category_id: CLOTHING,
      brand_id: BrandId(1),
      product_type_id: None,
      title: format!("Tee {n}"),
      slug: format!("tee-{n}"),
      created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
      is_active: true,
      property_values: vec![],
      variants: vec![SourceVariant {
        id:     VariantId(n),
        sku:    format!("SKU-{n}"),
        color:  Some(BLUE),
        size:   Some(ValueId(10)),
        gender: None,
        prices: vec![PriceEntry {
          kind:   PriceKind::Retail,
          amount: Decimal::from(100),
        }],
        stocks: vec![StockEntry {
          warehouse_id: WarehouseId(1),
          quantity:     1,
        }],
      }],
    })
    .collect();

  let index = index().await;
  let summary = index.rebuild(&source).await.unwrap();

  // 300 variants x (colour + size) spans two insert batches.
  assert_eq!(summary.facts, 600);
  let facts =
    index.scan(&FactFilter::eligible_in(CLOTHING)).await.unwrap();
  assert_eq!(facts.len(), 600);
}

// ─── Engine parity ───────────────────────────────────────────────────────────

/// The engines must answer identically over the SQL backend and the
/// in-memory grouped index built from the same source records.
#[tokio::test]
async fn engines_agree_with_memory_backend() {
  use std::sync::Arc;

  use garb_engine::{facet::FacetAvailabilityEngine, filter::FilterEngine};

  let source = clothing_source();
  let sqlite = index().await;
  sqlite.rebuild(&source).await.unwrap();
  let (memory, violations) = MemoryIndex::from_source(&source);
  assert!(violations.is_empty());

  let sqlite = Arc::new(sqlite);
  let memory = Arc::new(memory);

  let mut criteria = FilterCriteria::for_category(CLOTHING);
  criteria
    .attribute_selections
    .insert(GENDER, BTreeSet::from([MALE]));

  let from_sql = FilterEngine::new(sqlite.clone())
    .find_matching_product_ids(&criteria)
    .await
    .unwrap();
  let from_memory = FilterEngine::new(memory.clone())
    .find_matching_product_ids(&criteria)
    .await
    .unwrap();
  assert_eq!(from_sql, from_memory);

  let catalog = sqlite.attribute_catalog(CLOTHING).await.unwrap();
  let sql_facets = FacetAvailabilityEngine::new(sqlite)
    .compute_facets(&criteria, &catalog)
    .await
    .unwrap();
  let memory_facets = FacetAvailabilityEngine::new(memory)
    .compute_facets(&criteria, &catalog)
    .await
    .unwrap();
  assert_eq!(sql_facets, memory_facets);
}
