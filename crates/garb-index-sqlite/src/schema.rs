//! SQL schema for the SQLite variant index.
//!
//! Every table here is derived data, rebuilt wholesale by
//! [`SqliteIndex::rebuild`](crate::SqliteIndex::rebuild); nothing is ever
//! updated in place.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS attributes (
    attribute    TEXT PRIMARY KEY,  -- 'color' | 'size' | 'gender' | custom property id
    slug         TEXT NOT NULL,
    display_name TEXT NOT NULL,
    unit_symbol  TEXT,
    priority     INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS attribute_values (
    attribute  TEXT NOT NULL,
    value_id   INTEGER NOT NULL,
    raw_value  TEXT NOT NULL,
    label      TEXT,
    priority   INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (attribute, value_id)
);

CREATE TABLE IF NOT EXISTS products (
    product_id      INTEGER PRIMARY KEY,
    category_id     INTEGER NOT NULL,
    brand_id        INTEGER NOT NULL,
    product_type_id INTEGER,
    title           TEXT NOT NULL,
    slug            TEXT NOT NULL,
    created_at      TEXT NOT NULL      -- ISO 8601 UTC
);

-- One row per (variant, attribute, value). Strictly derived: the rebuild
-- truncates and repopulates, no UPDATE is ever issued.
CREATE TABLE IF NOT EXISTS variant_facts (
    product_id  INTEGER NOT NULL,
    variant_id  INTEGER NOT NULL,
    category_id INTEGER NOT NULL,
    brand_id    INTEGER NOT NULL,
    attribute   TEXT NOT NULL,
    value_id    INTEGER NOT NULL,
    price       REAL NOT NULL,
    stock       INTEGER NOT NULL DEFAULT 0,
    is_active   INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS facts_lookup_idx
  ON variant_facts (category_id, attribute, value_id, is_active, stock, price);
CREATE INDEX IF NOT EXISTS facts_variant_idx
  ON variant_facts (product_id, variant_id);
CREATE INDEX IF NOT EXISTS products_category_idx
  ON products (category_id);

PRAGMA user_version = 1;
";
