//! The garb computation core: filtering, facet availability, and the
//! per-request orchestration that ties them together.
//!
//! Everything here is generic over [`garb_core::index::VariantIndex`] and
//! stateless per request; the only shared state is the TTL caches inside
//! [`orchestrator::CatalogQueryOrchestrator`].

pub mod cache;
pub mod error;
pub mod facet;
pub mod filter;
pub mod orchestrator;
pub mod payload;
pub mod predicate;

pub use error::{Error, Result};

#[cfg(test)]
mod fixtures;
