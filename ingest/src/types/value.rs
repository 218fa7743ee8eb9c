use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeSet;
use std::fmt;

/// Column types understood by the store contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    Int,
    Timestamp,
    /// `set<text>`.
    TextSet,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => f.write_str("text"),
            ColumnType::Int => f.write_str("int"),
            ColumnType::Timestamp => f.write_str("timestamp"),
            ColumnType::TextSet => f.write_str("set<text>"),
        }
    }
}

/// A single value bound to a statement or read back from a row.
///
/// Values of the same variant order naturally, which is what clustering columns rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CqlValue {
    Text(String),
    Int(i32),
    Timestamp(DateTime<Utc>),
    TextSet(BTreeSet<String>),
}

impl CqlValue {
    /// Returns the [`ColumnType`] this value can be stored in.
    pub fn column_type(&self) -> ColumnType {
        match self {
            CqlValue::Text(_) => ColumnType::Text,
            CqlValue::Int(_) => ColumnType::Int,
            CqlValue::Timestamp(_) => ColumnType::Timestamp,
            CqlValue::TextSet(_) => ColumnType::TextSet,
        }
    }
}

impl From<&str> for CqlValue {
    fn from(value: &str) -> Self {
        CqlValue::Text(value.to_owned())
    }
}

impl From<String> for CqlValue {
    fn from(value: String) -> Self {
        CqlValue::Text(value)
    }
}

impl From<i32> for CqlValue {
    fn from(value: i32) -> Self {
        CqlValue::Int(value)
    }
}

impl From<DateTime<Utc>> for CqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        CqlValue::Timestamp(value)
    }
}

impl From<BTreeSet<String>> for CqlValue {
    fn from(value: BTreeSet<String>) -> Self {
        CqlValue::TextSet(value)
    }
}

impl fmt::Display for CqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlValue::Text(text) => f.write_str(text),
            CqlValue::Int(int) => write!(f, "{int}"),
            CqlValue::Timestamp(time) => f.write_str(&format_timestamp(time)),
            CqlValue::TextSet(set) => f.write_str(&format_text_set(set)),
        }
    }
}

/// Renders a timestamp as an RFC 3339 UTC instant, e.g. `2014-02-20T00:00:00Z`.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Renders a set as `[a, b, c]`.
pub fn format_text_set(set: &BTreeSet<String>) -> String {
    let joined = set.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
    format!("[{joined}]")
}
