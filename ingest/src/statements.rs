use tracing::debug;

use crate::error::IngestResult;
use crate::store::Store;

pub(crate) const INSERT_ITEM: &str = "INSERT INTO items \
    (asin, title, imageURL, categories, description) \
    VALUES (?, ?, ?, ?, ?)";

/// Both review copies in one request. Bound values follow
/// [`crate::types::Review::to_batch_values`].
pub(crate) const INSERT_REVIEW_BATCH: &str = "BEGIN BATCH \
    INSERT INTO reviews_by_reviewer \
    (reviewerId, time, asin, reviewerName, rating, summary, reviewText) \
    VALUES (?, ?, ?, ?, ?, ?, ?); \
    INSERT INTO reviews_by_item \
    (asin, time, reviewerId, reviewerName, rating, summary, reviewText) \
    VALUES (?, ?, ?, ?, ?, ?, ?); \
    APPLY BATCH";

pub(crate) const SELECT_ITEM: &str = "SELECT * FROM items WHERE asin = ?";

pub(crate) const SELECT_REVIEWS_BY_REVIEWER: &str =
    "SELECT * FROM reviews_by_reviewer WHERE reviewerId = ?";

pub(crate) const SELECT_REVIEWS_BY_ITEM: &str = "SELECT * FROM reviews_by_item WHERE asin = ?";

/// The statements the catalog issues, prepared once per session.
#[derive(Debug, Clone)]
pub struct PreparedStatements<P> {
    pub insert_item: P,
    pub insert_review_batch: P,
    pub select_item: P,
    pub select_reviews_by_reviewer: P,
    pub select_reviews_by_item: P,
}

impl<P> PreparedStatements<P> {
    /// Prepares every statement against `store`.
    ///
    /// The tables must exist; the first statement that fails to prepare aborts the call.
    pub async fn prepare<S>(store: &S) -> IngestResult<Self>
    where
        S: Store<Prepared = P>,
    {
        let statements = Self {
            insert_item: store.prepare(INSERT_ITEM).await?,
            insert_review_batch: store.prepare(INSERT_REVIEW_BATCH).await?,
            select_item: store.prepare(SELECT_ITEM).await?,
            select_reviews_by_reviewer: store.prepare(SELECT_REVIEWS_BY_REVIEWER).await?,
            select_reviews_by_item: store.prepare(SELECT_REVIEWS_BY_ITEM).await?,
        };
        debug!(store = S::name(), "prepared catalog statements");

        Ok(statements)
    }
}
