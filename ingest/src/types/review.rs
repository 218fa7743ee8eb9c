use chrono::{DateTime, Utc};

use crate::types::{CqlValue, NOT_AVAILABLE};

/// Rating stored when a review carries no usable rating.
pub const MISSING_RATING: i32 = -1;

/// A single review of an item by a reviewer.
///
/// Every review is stored twice, once partitioned by reviewer and once partitioned by item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub reviewer_id: String,
    pub asin: String,
    /// Review time, second precision.
    pub time: DateTime<Utc>,
    pub reviewer_name: String,
    pub rating: i32,
    pub summary: String,
    pub review_text: String,
}

impl Review {
    /// Returns the bound values for both inserts of the review batch.
    ///
    /// The first seven values target the reviewer-partitioned table in
    /// `(reviewerid, time, asin, …)` order, the last seven the item-partitioned table in
    /// `(asin, time, reviewerid, …)` order. The two halves differ only in which identifier
    /// leads.
    pub fn to_batch_values(&self) -> Vec<CqlValue> {
        let mut values = Vec::with_capacity(14);
        values.extend(self.row_values(&self.reviewer_id, &self.asin));
        values.extend(self.row_values(&self.asin, &self.reviewer_id));
        values
    }

    fn row_values(&self, partition: &str, tie_break: &str) -> [CqlValue; 7] {
        [
            CqlValue::from(partition),
            CqlValue::from(self.time),
            CqlValue::from(tie_break),
            CqlValue::from(self.reviewer_name.as_str()),
            CqlValue::from(self.rating),
            CqlValue::from(self.summary.as_str()),
            CqlValue::from(self.review_text.as_str()),
        ]
    }
}

impl Default for Review {
    fn default() -> Self {
        Self {
            reviewer_id: NOT_AVAILABLE.to_owned(),
            asin: NOT_AVAILABLE.to_owned(),
            time: DateTime::UNIX_EPOCH,
            reviewer_name: NOT_AVAILABLE.to_owned(),
            rating: MISSING_RATING,
            summary: NOT_AVAILABLE.to_owned(),
            review_text: NOT_AVAILABLE.to_owned(),
        }
    }
}
