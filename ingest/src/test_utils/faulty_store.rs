use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::store::{BoundStatement, Store, StoreConnector};
use crate::types::{CqlValue, ResultSet};

/// Store wrapper that rejects every bound statement carrying a poisoned text value.
///
/// Useful to check that one failing write does not affect the others: poison the `asin` of a
/// few input records and assert that only those are missing afterwards.
#[derive(Debug, Clone)]
pub struct FaultyStore<S> {
    inner: S,
    poisoned: Arc<Vec<String>>,
    rejected: Arc<AtomicU64>,
}

impl<S> FaultyStore<S> {
    pub fn new<I, T>(inner: S, poisoned: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            inner,
            poisoned: Arc::new(poisoned.into_iter().map(Into::into).collect()),
            rejected: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of statements rejected so far.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::SeqCst)
    }

    fn is_poisoned(&self, values: &[CqlValue]) -> bool {
        values.iter().any(|value| {
            matches!(value, CqlValue::Text(text) if self.poisoned.iter().any(|p| p == text))
        })
    }
}

impl<S> Store for FaultyStore<S>
where
    S: Store + Send + Sync,
{
    type Prepared = S::Prepared;

    fn name() -> &'static str {
        "faulty"
    }

    async fn execute(&self, cql: &str) -> IngestResult<ResultSet> {
        self.inner.execute(cql).await
    }

    async fn prepare(&self, cql: &str) -> IngestResult<Self::Prepared> {
        self.inner.prepare(cql).await
    }

    async fn execute_bound(
        &self,
        statement: &BoundStatement<Self::Prepared>,
    ) -> IngestResult<ResultSet> {
        if self.is_poisoned(statement.values()) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            bail!(
                ErrorKind::StoreQueryFailed,
                "Statement rejected by the faulty store"
            );
        }

        self.inner.execute_bound(statement).await
    }

    async fn close(&self) -> IngestResult<()> {
        self.inner.close().await
    }
}

impl<S> StoreConnector for FaultyStore<S>
where
    S: Store + Clone + Send + Sync + 'static,
{
    type Store = FaultyStore<S>;

    async fn connect(&self) -> IngestResult<FaultyStore<S>> {
        Ok(self.clone())
    }
}
