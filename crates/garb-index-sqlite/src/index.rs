//! [`SqliteIndex`] — the SQLite implementation of [`VariantIndex`].

use std::{collections::BTreeMap, path::Path};

use garb_core::{
  attribute::AttributeCatalog,
  fact::VariantFact,
  ids::{CategoryId, ValueId},
  index::{
    FacetHit, FacetProbe, FactFilter, ProductInfo, ProductQuery,
    VariantIndex,
  },
};
use rusqlite::types::Value;

use crate::{
  Error, Result,
  encode::{
    RawAttribute, RawAttributeValue, RawFact, RawProduct, encode_attribute,
    encode_price,
  },
  schema::SCHEMA,
};

// ─── Index ───────────────────────────────────────────────────────────────────

/// A variant index backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteIndex {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteIndex {
  /// Open (or create) an index at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let index = Self { conn };
    index.init_schema().await?;
    Ok(index)
  }

  /// Open an in-memory index — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let index = Self { conn };
    index.init_schema().await?;
    Ok(index)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Predicate translation ───────────────────────────────────────────────────

fn placeholders(count: usize) -> String {
  vec!["?"; count].join(", ")
}

/// Translate a [`FactFilter`] into a WHERE clause and its positional
/// parameters. Semi-join membership constraints become `variant_id IN
/// (subquery)` predicates, mirroring how relational deployments of this
/// index query it.
fn filter_clauses(filter: &FactFilter) -> Result<(String, Vec<Value>)> {
  let mut conds: Vec<String> = Vec::new();
  let mut params: Vec<Value> = Vec::new();

  if filter.eligible_only {
    conds.push("is_active = 1 AND stock > 0".into());
  }
  if let Some(category) = filter.category {
    conds.push("category_id = ?".into());
    params.push(Value::Integer(category.0 as i64));
  }
  if let Some(min) = filter.min_price {
    conds.push("price >= ?".into());
    params.push(Value::Real(encode_price(min)?));
  }
  if let Some(max) = filter.max_price {
    conds.push("price <= ?".into());
    params.push(Value::Real(encode_price(max)?));
  }
  if !filter.brands.is_empty() {
    conds
      .push(format!("brand_id IN ({})", placeholders(filter.brands.len())));
    params
      .extend(filter.brands.iter().map(|id| Value::Integer(id.0 as i64)));
  }
  if let Some(products) = &filter.products {
    if products.is_empty() {
      // An empty restriction matches nothing.
      conds.push("0 = 1".into());
    } else {
      conds
        .push(format!("product_id IN ({})", placeholders(products.len())));
      params
        .extend(products.iter().map(|id| Value::Integer(id.0 as i64)));
    }
  }
  if let Some(attribute) = &filter.attribute {
    conds.push("attribute = ?".into());
    params.push(Value::Text(encode_attribute(attribute)));
  }
  for membership in &filter.memberships {
    if membership.values.is_empty() {
      conds.push("0 = 1".into());
      continue;
    }
    conds.push(format!(
      "variant_id IN (SELECT variant_id FROM variant_facts \
       WHERE attribute = ? AND value_id IN ({}))",
      placeholders(membership.values.len())
    ));
    params.push(Value::Text(encode_attribute(&membership.attribute)));
    params.extend(
      membership.values.iter().map(|id| Value::Integer(id.0 as i64)),
    );
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  Ok((where_clause, params))
}

// ─── VariantIndex impl ───────────────────────────────────────────────────────

impl VariantIndex for SqliteIndex {
  type Error = Error;

  async fn scan(&self, filter: &FactFilter) -> Result<Vec<VariantFact>> {
    let (where_clause, params) = filter_clauses(filter)?;
    let sql = format!(
      "SELECT product_id, variant_id, category_id, brand_id, attribute,
              value_id, price, stock, is_active
       FROM variant_facts {where_clause}"
    );

    let raws: Vec<RawFact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(RawFact {
              product_id:  row.get(0)?,
              variant_id:  row.get(1)?,
              category_id: row.get(2)?,
              brand_id:    row.get(3)?,
              attribute:   row.get(4)?,
              value_id:    row.get(5)?,
              price:       row.get(6)?,
              stock:       row.get(7)?,
              is_active:   row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }

  /// One compound query for the whole probe batch: each probe contributes
  /// a `SELECT ... GROUP BY value_id` branch and the branches are glued
  /// with UNION ALL, so N facet questions cost one round trip.
  async fn facet_values(
    &self,
    probes: &[FacetProbe],
  ) -> Result<Vec<FacetHit>> {
    if probes.is_empty() {
      return Ok(Vec::new());
    }

    let mut branches: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();
    let mut probe_attributes = Vec::new();

    for (idx, probe) in probes.iter().enumerate() {
      let mut filter = probe.filter.clone();
      filter.attribute = Some(probe.attribute);
      let (where_clause, branch_params) = filter_clauses(&filter)?;

      branches.push(format!(
        "SELECT {idx} AS probe, value_id, COUNT(DISTINCT variant_id) AS variants \
         FROM variant_facts {where_clause} GROUP BY value_id"
      ));
      params.extend(branch_params);
      probe_attributes.push(probe.attribute);
    }

    let sql = branches.join(" UNION ALL ");
    let rows: Vec<(i64, i64, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(probe, value_id, variants)| {
        let attribute = probe_attributes
          .get(probe as usize)
          .copied()
          .ok_or_else(|| {
            Error::Decode(format!("unknown probe tag: {probe}"))
          })?;
        Ok(FacetHit {
          attribute,
          value_id: ValueId(value_id as u64),
          variant_count: variants as u64,
        })
      })
      .collect()
  }

  async fn attribute_catalog(
    &self,
    category: CategoryId,
  ) -> Result<AttributeCatalog> {
    let category_raw = category.0 as i64;

    let (raw_attrs, raw_values): (Vec<RawAttribute>, Vec<RawAttributeValue>) =
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(
            "SELECT attribute, slug, display_name, unit_symbol, priority
             FROM attributes
             WHERE attribute IN
               (SELECT DISTINCT attribute FROM variant_facts
                WHERE category_id = ?1)",
          )?;
          let attrs = stmt
            .query_map(rusqlite::params![category_raw], |row| {
              Ok(RawAttribute {
                attribute:    row.get(0)?,
                slug:         row.get(1)?,
                display_name: row.get(2)?,
                unit_symbol:  row.get(3)?,
                priority:     row.get(4)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          let mut stmt = conn.prepare(
            "SELECT attribute, value_id, raw_value, label, priority
             FROM attribute_values
             WHERE attribute IN
               (SELECT DISTINCT attribute FROM variant_facts
                WHERE category_id = ?1)",
          )?;
          let values = stmt
            .query_map(rusqlite::params![category_raw], |row| {
              Ok(RawAttributeValue {
                attribute: row.get(0)?,
                value_id:  row.get(1)?,
                raw_value: row.get(2)?,
                label:     row.get(3)?,
                priority:  row.get(4)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          Ok((attrs, values))
        })
        .await?;

    let mut values_by_attribute: BTreeMap<String, Vec<RawAttributeValue>> =
      BTreeMap::new();
    for raw in raw_values {
      values_by_attribute
        .entry(raw.attribute.clone())
        .or_default()
        .push(raw);
    }

    let definitions = raw_attrs
      .into_iter()
      .map(|raw| {
        let values =
          values_by_attribute.remove(&raw.attribute).unwrap_or_default();
        raw.into_definition(values)
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(AttributeCatalog::new(definitions))
  }

  async fn products(
    &self,
    query: &ProductQuery,
  ) -> Result<Vec<ProductInfo>> {
    let mut conds: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(ids) = &query.ids {
      if ids.is_empty() {
        conds.push("0 = 1".into());
      } else {
        conds.push(format!("product_id IN ({})", placeholders(ids.len())));
        params.extend(ids.iter().map(|id| Value::Integer(id.0 as i64)));
      }
    }
    if let Some(category) = query.category {
      conds.push("category_id = ?".into());
      params.push(Value::Integer(category.0 as i64));
    }
    if !query.product_types.is_empty() {
      conds.push(format!(
        "product_type_id IN ({})",
        placeholders(query.product_types.len())
      ));
      params.extend(
        query.product_types.iter().map(|id| Value::Integer(id.0 as i64)),
      );
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let sql = format!(
      "SELECT product_id, category_id, brand_id, product_type_id,
              title, slug, created_at
       FROM products {where_clause}"
    );

    let raws: Vec<RawProduct> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(RawProduct {
              product_id:      row.get(0)?,
              category_id:     row.get(1)?,
              brand_id:        row.get(2)?,
              product_type_id: row.get(3)?,
              title:           row.get(4)?,
              slug:            row.get(5)?,
              created_at:      row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_info).collect()
  }
}
