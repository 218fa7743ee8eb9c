//! Store abstractions and implementations.
//!
//! The [`Store`] trait is the only way the loader talks to the wide-column store. The
//! [`memory`] module provides an in-process store that understands the CQL the loader issues,
//! and the `scylla` module (behind the `scylla` feature) adapts the Scylla/Cassandra driver.

mod base;
pub mod memory;
#[cfg(feature = "scylla")]
pub mod scylla;

pub use base::{BoundStatement, Store, StoreConnector, bind};
