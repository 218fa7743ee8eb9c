//! Helpers shared by the unit and integration tests of this crate.
//!
//! - [`faulty_store`] wraps a store and rejects chosen writes.
//! - [`fixtures`] builds input lines and ready-to-use catalogs.
//! - [`failpoints`] configures fail points for the duration of a test.

pub mod failpoints;
pub mod faulty_store;
pub mod fixtures;
