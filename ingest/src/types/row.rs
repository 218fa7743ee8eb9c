use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::types::CqlValue;

/// A row returned by a store, addressed by column name.
///
/// Column names are compared case-insensitively, matching how unquoted CQL identifiers
/// behave. Absent and null columns are both reported as `None` by the typed accessors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Option<CqlValue>)>,
}

impl Row {
    /// Creates a row from `(column, value)` pairs in result order.
    pub fn new(columns: Vec<(String, Option<CqlValue>)>) -> Self {
        Self { columns }
    }

    /// Returns the raw value of a column, `None` if it is absent or null.
    pub fn get(&self, column: &str) -> Option<&CqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .and_then(|(_, value)| value.as_ref())
    }

    /// Reads a `text` column.
    pub fn text(&self, column: &str) -> IngestResult<Option<String>> {
        match self.get(column) {
            None => Ok(None),
            Some(CqlValue::Text(text)) => Ok(Some(text.clone())),
            Some(other) => bail!(
                ErrorKind::ConversionError,
                "Column is not of type text",
                format!("column '{column}' holds a {} value", other.column_type())
            ),
        }
    }

    /// Reads an `int` column.
    pub fn int(&self, column: &str) -> IngestResult<Option<i32>> {
        match self.get(column) {
            None => Ok(None),
            Some(CqlValue::Int(int)) => Ok(Some(*int)),
            Some(other) => bail!(
                ErrorKind::ConversionError,
                "Column is not of type int",
                format!("column '{column}' holds a {} value", other.column_type())
            ),
        }
    }

    /// Reads a `timestamp` column.
    pub fn timestamp(&self, column: &str) -> IngestResult<Option<DateTime<Utc>>> {
        match self.get(column) {
            None => Ok(None),
            Some(CqlValue::Timestamp(time)) => Ok(Some(*time)),
            Some(other) => bail!(
                ErrorKind::ConversionError,
                "Column is not of type timestamp",
                format!("column '{column}' holds a {} value", other.column_type())
            ),
        }
    }

    /// Reads a `set<text>` column. A null set reads as an empty set, as empty collections are
    /// not distinguishable from null in the store.
    pub fn text_set(&self, column: &str) -> IngestResult<BTreeSet<String>> {
        match self.get(column) {
            None => Ok(BTreeSet::new()),
            Some(CqlValue::TextSet(set)) => Ok(set.clone()),
            Some(other) => bail!(
                ErrorKind::ConversionError,
                "Column is not of type set<text>",
                format!("column '{column}' holds a {} value", other.column_type())
            ),
        }
    }
}

/// Rows produced by executing a statement, in the order the store returned them.
pub type ResultSet = Vec<Row>;

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new(vec![
            ("asin".to_owned(), Some(CqlValue::from("B00001"))),
            ("rating".to_owned(), Some(CqlValue::from(5))),
            ("summary".to_owned(), None),
        ])
    }

    #[test]
    fn columns_are_looked_up_case_insensitively() {
        let row = row();
        assert_eq!(row.text("ASIN").unwrap().as_deref(), Some("B00001"));
        assert_eq!(row.int("Rating").unwrap(), Some(5));
    }

    #[test]
    fn null_and_missing_columns_read_as_none() {
        let row = row();
        assert_eq!(row.text("summary").unwrap(), None);
        assert_eq!(row.timestamp("time").unwrap(), None);
        assert!(row.text_set("categories").unwrap().is_empty());
    }

    #[test]
    fn mismatched_accessor_is_a_conversion_error() {
        let err = row().int("asin").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionError);
    }
}
