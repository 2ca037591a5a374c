//! Core types and trait definitions for the garb catalog engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod attribute;
pub mod criteria;
pub mod facet;
pub mod fact;
pub mod ids;
pub mod index;
pub mod memory;
pub mod source;
