use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::normalize::{integral, text_or_sentinel};
use crate::types::{MISSING_RATING, Review};

/// Builds a [`Review`] from a raw record.
pub fn normalize_review(raw: &Map<String, Value>) -> Review {
    Review {
        reviewer_id: text_or_sentinel(raw, "reviewerId"),
        asin: text_or_sentinel(raw, "asin"),
        time: review_time(raw.get("unixReviewTime")),
        reviewer_name: text_or_sentinel(raw, "reviewerName"),
        rating: rating(raw.get("rating")),
        summary: text_or_sentinel(raw, "summary"),
        review_text: text_or_sentinel(raw, "reviewText"),
    }
}

fn rating(value: Option<&Value>) -> i32 {
    value
        .and_then(integral)
        .and_then(|rating| i32::try_from(rating).ok())
        .unwrap_or(MISSING_RATING)
}

/// Interprets the value as seconds since the Unix epoch, defaulting to the epoch itself.
fn review_time(value: Option<&Value>) -> DateTime<Utc> {
    value
        .and_then(integral)
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
