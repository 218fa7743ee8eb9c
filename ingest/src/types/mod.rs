//! Common types used throughout the loader.
//!
//! Holds the typed records produced by normalization ([`Item`], [`Review`]) and the values
//! and rows exchanged with a [`crate::store::Store`].

mod item;
mod review;
mod row;
mod value;

pub use item::*;
pub use review::*;
pub use row::*;
pub use value::*;

/// Sentinel stored for any string field missing from an input record.
pub const NOT_AVAILABLE: &str = "na";
