//! SQLite backend for the garb variant index.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The semi-join membership
//! constraints become `variant_id IN (subquery)` predicates, and the
//! batched facet scan becomes a single UNION ALL compound query.

mod encode;
mod index;
mod rebuild;
mod schema;

pub mod error;

pub use error::{Error, Result};
pub use index::SqliteIndex;
pub use rebuild::RebuildSummary;

#[cfg(test)]
mod tests;
