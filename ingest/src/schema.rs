//! Table layout of the review catalog.
//!
//! Items are keyed by `asin`. Reviews are stored twice, once partitioned by reviewer and once
//! partitioned by item, both clustered newest first. The second clustering column breaks ties
//! between reviews that share a timestamp.

use tracing::info;

use crate::error::IngestResult;
use crate::store::Store;

/// Table holding one row per item.
pub const ITEMS_TABLE: &str = "items";

/// Reviews partitioned by reviewer, newest first.
pub const REVIEWS_BY_REVIEWER_TABLE: &str = "reviews_by_reviewer";

/// Reviews partitioned by item, newest first.
pub const REVIEWS_BY_ITEM_TABLE: &str = "reviews_by_item";

pub(crate) const CREATE_ITEMS: &str = "CREATE TABLE IF NOT EXISTS items (\
    asin text, \
    title text, \
    imageURL text, \
    categories set<text>, \
    description text, \
    PRIMARY KEY (asin))";

pub(crate) const CREATE_REVIEWS_BY_REVIEWER: &str = "CREATE TABLE IF NOT EXISTS reviews_by_reviewer (\
    reviewerId text, \
    time timestamp, \
    asin text, \
    reviewerName text, \
    rating int, \
    summary text, \
    reviewText text, \
    PRIMARY KEY ((reviewerId), time, asin)) \
    WITH CLUSTERING ORDER BY (time DESC, asin ASC)";

pub(crate) const CREATE_REVIEWS_BY_ITEM: &str = "CREATE TABLE IF NOT EXISTS reviews_by_item (\
    asin text, \
    time timestamp, \
    reviewerId text, \
    reviewerName text, \
    rating int, \
    summary text, \
    reviewText text, \
    PRIMARY KEY ((asin), time, reviewerId)) \
    WITH CLUSTERING ORDER BY (time DESC, reviewerId ASC)";

/// Creates the three catalog tables if they do not exist yet.
///
/// Safe to call repeatedly. The first failing statement aborts the call.
pub async fn create_tables<S: Store>(store: &S) -> IngestResult<()> {
    for (table, cql) in [
        (ITEMS_TABLE, CREATE_ITEMS),
        (REVIEWS_BY_REVIEWER_TABLE, CREATE_REVIEWS_BY_REVIEWER),
        (REVIEWS_BY_ITEM_TABLE, CREATE_REVIEWS_BY_ITEM),
    ] {
        store.execute(cql).await?;
        info!(table, store = S::name(), "table is ready");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn create_tables_is_idempotent() {
        let store = MemoryStore::new();

        create_tables(&store).await.unwrap();
        create_tables(&store).await.unwrap();

        assert_eq!(
            store.table_names().await,
            vec![ITEMS_TABLE, REVIEWS_BY_ITEM_TABLE, REVIEWS_BY_REVIEWER_TABLE]
        );
        assert_eq!(store.row_count(ITEMS_TABLE).await.unwrap(), 0);
    }
}
