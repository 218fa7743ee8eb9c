//! Lookups over the catalog tables, rendered as text.

use std::fmt;
use std::iter::Map;
use std::slice;
use std::sync::Arc;
use tracing::info;

use crate::error::IngestResult;
use crate::statements::PreparedStatements;
use crate::store::{Store, bind};
use crate::types::{
    CqlValue, Item, MISSING_RATING, NOT_AVAILABLE, Review, Row, format_text_set, format_timestamp,
};

/// Returned by [`QueryFacade::item`] when no item has the requested `asin`.
pub const NOT_EXISTS: &str = "not exists";

/// Renders an item as five `label: value` lines.
pub fn format_item(item: &Item) -> String {
    format!(
        "asin: {}\ntitle: {}\nimage: {}\ncategories: {}\ndescription: {}\n",
        item.asin,
        item.title,
        item.image_url,
        format_text_set(&item.categories),
        item.description
    )
}

/// Renders a review as a single line.
pub fn format_review(review: &Review) -> String {
    format!(
        "time: {}, asin: {}, reviewerID: {}, reviewerName: {}, rating: {}, summary: {}, reviewText: {}\n",
        format_timestamp(&review.time),
        review.asin,
        review.reviewer_id,
        review.reviewer_name,
        review.rating,
        review.summary,
        review.review_text
    )
}

fn text_or_sentinel(row: &Row, column: &str) -> IngestResult<String> {
    Ok(row
        .text(column)?
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned()))
}

/// Decodes a row of the items table. Null columns read as their ingestion defaults.
pub fn item_from_row(row: &Row) -> IngestResult<Item> {
    Ok(Item {
        asin: text_or_sentinel(row, "asin")?,
        title: text_or_sentinel(row, "title")?,
        image_url: text_or_sentinel(row, "imageurl")?,
        categories: row.text_set("categories")?,
        description: text_or_sentinel(row, "description")?,
    })
}

/// Decodes a row of either review table. Null columns read as their ingestion defaults.
pub fn review_from_row(row: &Row) -> IngestResult<Review> {
    Ok(Review {
        reviewer_id: text_or_sentinel(row, "reviewerid")?,
        asin: text_or_sentinel(row, "asin")?,
        time: row.timestamp("time")?.unwrap_or_default(),
        reviewer_name: text_or_sentinel(row, "reviewername")?,
        rating: row.int("rating")?.unwrap_or(MISSING_RATING),
        summary: text_or_sentinel(row, "summary")?,
        review_text: text_or_sentinel(row, "reviewtext")?,
    })
}

type RenderReviews<'a> = Map<slice::Iter<'a, Review>, fn(&Review) -> String>;

/// Reviews of one partition, newest first.
///
/// The listing can be iterated any number of times; each pass renders the reviews again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewListing {
    reviews: Vec<Review>,
}

impl ReviewListing {
    pub fn new(reviews: Vec<Review>) -> Self {
        Self { reviews }
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Returns the decoded reviews.
    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Renders each review with [`format_review`] as it is reached.
    pub fn iter(&self) -> RenderReviews<'_> {
        self.reviews.iter().map(format_review as fn(&Review) -> String)
    }
}

impl<'a> IntoIterator for &'a ReviewListing {
    type Item = String;
    type IntoIter = RenderReviews<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ReviewListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for review in self {
            f.write_str(&review)?;
        }

        Ok(())
    }
}

/// Point and partition lookups through the prepared select statements.
#[derive(Debug)]
pub struct QueryFacade<S: Store> {
    store: S,
    statements: Arc<PreparedStatements<S::Prepared>>,
}

impl<S: Store> QueryFacade<S> {
    pub fn new(store: S, statements: Arc<PreparedStatements<S::Prepared>>) -> Self {
        Self { store, statements }
    }

    /// Returns the formatted item with the given `asin`, or [`NOT_EXISTS`].
    pub async fn item(&self, asin: &str) -> IngestResult<String> {
        info!(asin, "looking up item");

        let statement = bind(&self.statements.select_item, vec![CqlValue::from(asin)]);
        let rows = self.store.execute_bound(&statement).await?;

        info!(asin, rows = rows.len(), "item lookup finished");

        match rows.first() {
            Some(row) => Ok(format_item(&item_from_row(row)?)),
            None => Ok(NOT_EXISTS.to_owned()),
        }
    }

    /// Returns all reviews written by a reviewer, newest first.
    pub async fn user_reviews(&self, reviewer_id: &str) -> IngestResult<ReviewListing> {
        info!(reviewer_id, "looking up reviews by reviewer");

        let listing = self
            .reviews(&self.statements.select_reviews_by_reviewer, reviewer_id)
            .await?;

        info!(reviewer_id, rows = listing.len(), "reviewer lookup finished");

        Ok(listing)
    }

    /// Returns all reviews of an item, newest first.
    pub async fn item_reviews(&self, asin: &str) -> IngestResult<ReviewListing> {
        info!(asin, "looking up reviews by item");

        let listing = self
            .reviews(&self.statements.select_reviews_by_item, asin)
            .await?;

        info!(asin, rows = listing.len(), "item reviews lookup finished");

        Ok(listing)
    }

    async fn reviews(&self, prepared: &S::Prepared, key: &str) -> IngestResult<ReviewListing> {
        let statement = bind(prepared, vec![CqlValue::from(key)]);
        let rows = self.store.execute_bound(&statement).await?;

        let reviews = rows
            .iter()
            .map(review_from_row)
            .collect::<IngestResult<Vec<_>>>()?;

        Ok(ReviewListing::new(reviews))
    }
}

impl<S: Store + Clone> Clone for QueryFacade<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            statements: self.statements.clone(),
        }
    }
}
