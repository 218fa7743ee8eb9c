use std::sync::Arc;

use crate::error::IngestResult;
use crate::statements::PreparedStatements;
use crate::store::{Store, bind};
use crate::types::{Item, Review};

/// Writes normalized records through the prepared insert statements.
///
/// Cloning is cheap; every ingestion worker holds its own clone.
#[derive(Debug)]
pub struct WriteGateway<S: Store> {
    store: S,
    statements: Arc<PreparedStatements<S::Prepared>>,
}

impl<S: Store> WriteGateway<S> {
    pub fn new(store: S, statements: Arc<PreparedStatements<S::Prepared>>) -> Self {
        Self { store, statements }
    }

    /// Upserts an item.
    pub async fn write_item(&self, item: &Item) -> IngestResult<()> {
        let statement = bind(&self.statements.insert_item, item.to_insert_values());
        self.store.execute_bound(&statement).await?;

        Ok(())
    }

    /// Writes both copies of a review in a single batch request.
    pub async fn write_review(&self, review: &Review) -> IngestResult<()> {
        let statement = bind(
            &self.statements.insert_review_batch,
            review.to_batch_values(),
        );
        self.store.execute_bound(&statement).await?;

        Ok(())
    }
}

impl<S: Store + Clone> Clone for WriteGateway<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            statements: self.statements.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use std::collections::BTreeSet;

    use super::*;
    use crate::schema::{
        ITEMS_TABLE, REVIEWS_BY_ITEM_TABLE, REVIEWS_BY_REVIEWER_TABLE, create_tables,
    };
    use crate::store::memory::MemoryStore;

    async fn gateway() -> (MemoryStore, WriteGateway<MemoryStore>) {
        let store = MemoryStore::new();
        create_tables(&store).await.unwrap();
        let statements = PreparedStatements::prepare(&store).await.unwrap();

        (store.clone(), WriteGateway::new(store, Arc::new(statements)))
    }

    #[tokio::test]
    async fn write_item_overwrites_by_asin() {
        let (store, gateway) = gateway().await;

        let mut item = Item {
            asin: "B1".to_owned(),
            categories: BTreeSet::from(["Books".to_owned()]),
            ..Item::default()
        };
        gateway.write_item(&item).await.unwrap();
        item.title = "Second".to_owned();
        gateway.write_item(&item).await.unwrap();

        assert_eq!(store.row_count(ITEMS_TABLE).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn write_review_lands_in_both_tables() {
        let (store, gateway) = gateway().await;

        let review = Review {
            reviewer_id: "A1".to_owned(),
            asin: "B1".to_owned(),
            time: DateTime::from_timestamp(1_392_854_400, 0).unwrap(),
            rating: 5,
            ..Review::default()
        };
        gateway.write_review(&review).await.unwrap();

        assert_eq!(store.row_count(REVIEWS_BY_REVIEWER_TABLE).await.unwrap(), 1);
        assert_eq!(store.row_count(REVIEWS_BY_ITEM_TABLE).await.unwrap(), 1);
    }
}
