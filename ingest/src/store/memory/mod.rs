//! In-process wide-column store.
//!
//! [`MemoryStore`] interprets the CQL subset described in [`cql`] and keeps every table in
//! memory: rows are grouped by partition key and kept sorted by clustering key, inserts
//! upsert, and a batch is validated in full before any of its writes is applied under a single
//! lock, so readers observe all of it or none of it.

mod cql;
mod table;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::failpoints::{MEMORY_STORE_BATCH__BEFORE_APPLY, ingest_fail_point};
use crate::store::base::{BoundStatement, Store, StoreConnector};
use crate::store::memory::cql::{Insert, Statement};
use crate::store::memory::table::{PendingWrite, Table};
use crate::types::{CqlValue, ResultSet};

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Table>,
}

impl Inner {
    fn table(&self, name: &str) -> IngestResult<&Table> {
        match self.tables.get(name) {
            Some(table) => Ok(table),
            None => bail!(
                ErrorKind::InvalidStatement,
                "Table does not exist",
                format!("table '{name}'")
            ),
        }
    }

    /// Checks that a statement can run against the current schema.
    fn validate(&self, statement: &Statement) -> IngestResult<()> {
        match statement {
            Statement::CreateTable(_) => Ok(()),
            Statement::Insert(insert) => self.validate_insert(insert),
            Statement::Batch(inserts) => inserts
                .iter()
                .try_for_each(|insert| self.validate_insert(insert)),
            Statement::Select(select) => {
                let table = self.table(&select.table)?;
                if let Some(column) = &select.restriction {
                    table.column_index(column)?;
                }
                Ok(())
            }
        }
    }

    fn validate_insert(&self, insert: &Insert) -> IngestResult<()> {
        self.table(&insert.table)?.check_insert(&insert.columns)?;
        Ok(())
    }

    fn run(&mut self, statement: &Statement, values: &[CqlValue]) -> IngestResult<ResultSet> {
        let expected = statement.bind_marker_count();
        if values.len() != expected {
            bail!(
                ErrorKind::InvalidStatement,
                "Wrong number of bound values",
                format!("expected {expected}, got {}", values.len())
            );
        }

        match statement {
            Statement::CreateTable(definition) => {
                if self.tables.contains_key(&definition.name) {
                    if definition.if_not_exists {
                        debug!(table = %definition.name, "table already exists");
                        return Ok(Vec::new());
                    }
                    bail!(
                        ErrorKind::SchemaError,
                        "Table already exists",
                        format!("table '{}'", definition.name)
                    );
                }

                let table = Table::new(definition.clone())?;
                info!(table = %table.name(), "created table");
                self.tables.insert(definition.name.clone(), table);

                Ok(Vec::new())
            }
            Statement::Insert(insert) => {
                let write = self.table(&insert.table)?.prepare_write(&insert.columns, values)?;
                self.apply(vec![(insert.table.as_str(), write)]);

                Ok(Vec::new())
            }
            Statement::Batch(inserts) => {
                let mut writes: Vec<(&str, PendingWrite)> = Vec::with_capacity(inserts.len());
                let mut offset = 0;
                for insert in inserts {
                    let count = insert.columns.len();
                    let write = self
                        .table(&insert.table)?
                        .prepare_write(&insert.columns, &values[offset..offset + count])?;
                    writes.push((insert.table.as_str(), write));
                    offset += count;
                }

                ingest_fail_point(MEMORY_STORE_BATCH__BEFORE_APPLY)?;
                self.apply(writes);

                Ok(Vec::new())
            }
            Statement::Select(select) => {
                let table = self.table(&select.table)?;
                let restriction = select
                    .restriction
                    .as_deref()
                    .zip(values.first());

                table.select(&select.projection, restriction)
            }
        }
    }

    fn apply(&mut self, writes: Vec<(&str, PendingWrite)>) {
        for (table, write) in writes {
            // Tables are never dropped, so a validated write always finds its table.
            if let Some(table) = self.tables.get_mut(table) {
                table.apply(write);
            }
        }
    }
}

/// Handle of a statement prepared by a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryPrepared {
    cql: Arc<str>,
    statement: Arc<Statement>,
}

impl MemoryPrepared {
    /// Returns the statement text this handle was prepared from.
    pub fn cql(&self) -> &str {
        &self.cql
    }
}

/// In-memory store for tests, development and dry runs.
///
/// Clones share the same data, so a test can keep one handle to inspect what a pipeline wrote
/// through another. All data is lost when the last handle is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates a new empty store without any tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names of all tables, sorted.
    pub async fn table_names(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut names = inner.tables.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Returns the number of rows stored in a table.
    pub async fn row_count(&self, table: &str) -> IngestResult<usize> {
        let inner = self.inner.lock().await;
        Ok(inner.table(table)?.row_count())
    }

    /// Returns the number of partitions of a table.
    pub async fn partition_count(&self, table: &str) -> IngestResult<usize> {
        let inner = self.inner.lock().await;
        Ok(inner.table(table)?.partition_count())
    }
}

impl Store for MemoryStore {
    type Prepared = MemoryPrepared;

    fn name() -> &'static str {
        "memory"
    }

    async fn execute(&self, cql: &str) -> IngestResult<ResultSet> {
        let statement = cql::parse(cql)?;

        let mut inner = self.inner.lock().await;
        inner.validate(&statement)?;
        inner.run(&statement, &[])
    }

    async fn prepare(&self, cql: &str) -> IngestResult<MemoryPrepared> {
        let statement = cql::parse(cql).map_err(|err| {
            crate::ingest_error!(
                ErrorKind::StorePrepareFailed,
                "Statement could not be prepared",
                format!("{err}"),
                source: err
            )
        })?;

        {
            let inner = self.inner.lock().await;
            if let Err(err) = inner.validate(&statement) {
                bail!(
                    ErrorKind::StorePrepareFailed,
                    "Statement could not be prepared",
                    format!("{err}"),
                    source: err
                );
            }
        }

        debug!(%cql, "prepared statement");

        Ok(MemoryPrepared {
            cql: Arc::from(cql),
            statement: Arc::new(statement),
        })
    }

    async fn execute_bound(
        &self,
        statement: &BoundStatement<MemoryPrepared>,
    ) -> IngestResult<ResultSet> {
        let mut inner = self.inner.lock().await;
        inner.run(&statement.prepared().statement, statement.values())
    }
}

impl StoreConnector for MemoryStore {
    type Store = MemoryStore;

    async fn connect(&self) -> IngestResult<MemoryStore> {
        Ok(self.clone())
    }
}
