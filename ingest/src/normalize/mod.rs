//! Conversion of raw, loosely typed records into [`Item`] and [`Review`] values.
//!
//! Normalization is total: every field is extracted independently and any value of an
//! unexpected shape degrades to the default for that field only. Missing strings become
//! [`NOT_AVAILABLE`], a missing rating becomes [`MISSING_RATING`] and a missing review time
//! becomes the Unix epoch.
//!
//! [`Item`]: crate::types::Item
//! [`Review`]: crate::types::Review
//! [`NOT_AVAILABLE`]: crate::types::NOT_AVAILABLE
//! [`MISSING_RATING`]: crate::types::MISSING_RATING

mod item;
pub mod lenient;
mod review;

pub use item::normalize_item;
pub use review::normalize_review;

use serde_json::{Map, Value};

use crate::types::NOT_AVAILABLE;

/// Renders a scalar JSON value as text.
///
/// Strings are returned verbatim, numbers and booleans with their JSON spelling. Null, arrays
/// and objects have no scalar rendering.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Reads a string field, `None` when absent or not a scalar.
fn optional_text(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key).and_then(scalar_text)
}

/// Reads a string field, falling back to [`NOT_AVAILABLE`].
fn text_or_sentinel(raw: &Map<String, Value>, key: &str) -> String {
    optional_text(raw, key).unwrap_or_else(|| NOT_AVAILABLE.to_owned())
}

/// Reads an integral number, truncating fractional values toward zero.
fn integral(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };

    if let Some(int) = number.as_i64() {
        return Some(int);
    }

    // Values beyond i64 (large u64 or floats) must still fit once truncated.
    number
        .as_f64()
        .filter(|float| float.is_finite())
        .map(f64::trunc)
        .filter(|float| *float >= i64::MIN as f64 && *float <= i64::MAX as f64)
        .map(|float| float as i64)
}
