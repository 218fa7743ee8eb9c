//! Bulk loader and lookup layer for a review catalog kept in a wide-column store.
//!
//! Item and review records arrive as newline-delimited, loosely formatted JSON. The
//! [`pipeline`] parses every line independently, normalizes it into an [`types::Item`] or
//! [`types::Review`] and writes it through a bounded pool of workers. Reviews are stored twice,
//! partitioned by reviewer and by item, with both copies written in one batch. The [`query`]
//! module reads them back in a fixed text format, and [`catalog::ReviewCatalog`] ties it all to
//! a single store session.
//!
//! Stores plug in through [`store::Store`]; [`store::memory::MemoryStore`] runs everything in
//! process and the `scylla` feature adds a driver-backed implementation.

pub mod catalog;
pub mod error;
pub mod failpoints;
pub mod gateway;
mod macros;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod statements;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
