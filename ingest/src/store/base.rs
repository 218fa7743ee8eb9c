use std::fmt::Debug;
use std::future::Future;

use crate::error::IngestResult;
use crate::types::{CqlValue, ResultSet};

/// Capability contract of the wide-column store the loader writes to.
///
/// The loader only needs to run ad-hoc statements (schema creation), prepare statements once,
/// and execute bound prepared statements that either write or return typed rows. Handles are
/// cloned into every ingestion worker, so implementations should make cloning cheap and
/// tolerate concurrent use.
///
/// A prepared statement may hold a whole `BEGIN BATCH … APPLY BATCH` block; executing it must
/// apply all contained writes together or none of them.
pub trait Store {
    /// Handle of a statement prepared by this store.
    type Prepared: Clone + Debug + Send + Sync + 'static;

    /// Returns the name of the store.
    fn name() -> &'static str;

    /// Executes a statement that takes no bind markers.
    fn execute(&self, cql: &str) -> impl Future<Output = IngestResult<ResultSet>> + Send;

    /// Prepares a statement for repeated execution.
    ///
    /// Preparation validates the statement against the current schema, so statements must be
    /// prepared after their tables exist.
    fn prepare(&self, cql: &str) -> impl Future<Output = IngestResult<Self::Prepared>> + Send;

    /// Executes a previously prepared statement with its bound values.
    fn execute_bound(
        &self,
        statement: &BoundStatement<Self::Prepared>,
    ) -> impl Future<Output = IngestResult<ResultSet>> + Send;

    /// Closes the session held by this handle.
    ///
    /// Stores whose handles share one pooled session, such as a driver session behind an
    /// `Arc`, release it when the last handle is dropped rather than here. Callers must drop
    /// the handle after closing it; [`crate::catalog::ReviewCatalog::close`] does. The default
    /// implementation is a no-op.
    fn close(&self) -> impl Future<Output = IngestResult<()>> + Send {
        async { Ok(()) }
    }
}

/// Opens sessions against a [`Store`].
pub trait StoreConnector {
    type Store: Store + Clone + Send + Sync + 'static;

    /// Opens a new session.
    fn connect(&self) -> impl Future<Output = IngestResult<Self::Store>> + Send;
}

/// A prepared statement together with the values for its bind markers.
#[derive(Debug, Clone)]
pub struct BoundStatement<P> {
    prepared: P,
    values: Vec<CqlValue>,
}

impl<P> BoundStatement<P> {
    pub fn prepared(&self) -> &P {
        &self.prepared
    }

    /// Values in bind marker order.
    pub fn values(&self) -> &[CqlValue] {
        &self.values
    }
}

/// Binds values to a prepared statement, in bind marker order.
pub fn bind<P: Clone>(prepared: &P, values: Vec<CqlValue>) -> BoundStatement<P> {
    BoundStatement {
        prepared: prepared.clone(),
        values,
    }
}
