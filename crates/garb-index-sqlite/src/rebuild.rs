//! Wholesale index rebuild from authoritative catalog records.
//!
//! Truncate, then repopulate. There is no incremental update path; readers
//! between rebuilds see the previous snapshot.

use garb_core::source::{self, CatalogSource};
use rusqlite::{params, types::Value};

use crate::{
  Result, SqliteIndex,
  encode::{encode_attribute, encode_dt, encode_price},
};

/// Facts per INSERT statement during repopulation, bounding the memory a
/// rebuild holds at once.
const INSERT_BATCH: usize = 500;

/// What a rebuild did, for the caller to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSummary {
  pub products: usize,
  pub facts:    usize,
  /// Source rows rejected for violating index invariants.
  pub skipped:  usize,
}

impl SqliteIndex {
  /// Truncate every derived table and repopulate it from `source`.
  ///
  /// Invariant-violating source rows (negative price or stock, duplicate
  /// fact tuples) are logged and skipped here, at rebuild time — query-time
  /// code never re-validates the index. Concurrent readers see the old
  /// snapshot until the rebuild commits; a reader hitting a freshly-opened
  /// index simply sees no rows.
  pub async fn rebuild(
    &self,
    source: &CatalogSource,
  ) -> Result<RebuildSummary> {
    let flat = source::flatten(source);
    for violation in &flat.violations {
      tracing::warn!(%violation, "rebuild: skipping source row");
    }

    // Encode rows up front; the write closure owns everything it touches.
    let attribute_rows: Vec<(String, String, String, Option<String>, i64)> =
      flat
        .attributes
        .iter()
        .map(|def| {
          (
            encode_attribute(&def.key),
            def.slug.clone(),
            def.display_name.clone(),
            def.unit_symbol.clone(),
            def.priority as i64,
          )
        })
        .collect();

    let value_rows: Vec<(String, i64, String, Option<String>, i64)> = flat
      .attributes
      .iter()
      .flat_map(|def| {
        let key = encode_attribute(&def.key);
        def.values.iter().map(move |value| {
          (
            key.clone(),
            value.id.0 as i64,
            value.raw_value.clone(),
            value.label.clone(),
            value.priority as i64,
          )
        })
      })
      .collect();

    let product_rows: Vec<(
      i64,
      i64,
      i64,
      Option<i64>,
      String,
      String,
      String,
    )> = flat
      .products
      .iter()
      .map(|info| {
        (
          info.product_id.0 as i64,
          info.category_id.0 as i64,
          info.brand_id.0 as i64,
          info.product_type_id.map(|id| id.0 as i64),
          info.title.clone(),
          info.slug.clone(),
          encode_dt(info.created_at),
        )
      })
      .collect();

    let fact_rows: Vec<(i64, i64, i64, i64, String, i64, f64, i64, i64)> =
      flat
        .facts
        .iter()
        .map(|fact| {
          Ok((
            fact.product_id.0 as i64,
            fact.variant_id.0 as i64,
            fact.category_id.0 as i64,
            fact.brand_id.0 as i64,
            encode_attribute(&fact.attribute),
            fact.value_id.0 as i64,
            encode_price(fact.price)?,
            fact.stock,
            fact.is_active as i64,
          ))
        })
        .collect::<Result<_>>()?;

    let summary = RebuildSummary {
      products: product_rows.len(),
      facts:    fact_rows.len(),
      skipped:  flat.violations.len(),
    };

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM variant_facts", [])?;
        tx.execute("DELETE FROM products", [])?;
        tx.execute("DELETE FROM attribute_values", [])?;
        tx.execute("DELETE FROM attributes", [])?;

        {
          let mut stmt = tx.prepare(
            "INSERT INTO attributes
               (attribute, slug, display_name, unit_symbol, priority)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for row in &attribute_rows {
            stmt.execute(params![row.0, row.1, row.2, row.3, row.4])?;
          }
        }
        {
          let mut stmt = tx.prepare(
            "INSERT INTO attribute_values
               (attribute, value_id, raw_value, label, priority)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for row in &value_rows {
            stmt.execute(params![row.0, row.1, row.2, row.3, row.4])?;
          }
        }
        {
          let mut stmt = tx.prepare(
            "INSERT INTO products
               (product_id, category_id, brand_id, product_type_id,
                title, slug, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for row in &product_rows {
            stmt.execute(params![
              row.0, row.1, row.2, row.3, row.4, row.5, row.6
            ])?;
          }
        }

        for chunk in fact_rows.chunks(INSERT_BATCH) {
          let sql = format!(
            "INSERT INTO variant_facts
               (product_id, variant_id, category_id, brand_id, attribute,
                value_id, price, stock, is_active)
             VALUES {}",
            vec!["(?, ?, ?, ?, ?, ?, ?, ?, ?)"; chunk.len()].join(", ")
          );
          let mut stmt = tx.prepare(&sql)?;

          let mut flat_params: Vec<Value> =
            Vec::with_capacity(chunk.len() * 9);
          for row in chunk {
            flat_params.push(Value::Integer(row.0));
            flat_params.push(Value::Integer(row.1));
            flat_params.push(Value::Integer(row.2));
            flat_params.push(Value::Integer(row.3));
            flat_params.push(Value::Text(row.4.clone()));
            flat_params.push(Value::Integer(row.5));
            flat_params.push(Value::Real(row.6));
            flat_params.push(Value::Integer(row.7));
            flat_params.push(Value::Integer(row.8));
          }
          stmt.execute(rusqlite::params_from_iter(flat_params))?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      products = summary.products,
      facts = summary.facts,
      skipped = summary.skipped,
      "variant index rebuilt"
    );
    Ok(summary)
  }
}
