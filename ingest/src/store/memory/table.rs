use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::store::memory::cql::{ClusteringOrder, ColumnDefinition, Projection, TableDefinition};
use crate::types::{CqlValue, Row};

/// Clustering column values of a row, ordered per the table's clustering order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClusteringKey(Vec<(CqlValue, ClusteringOrder)>);

impl Ord for ClusteringKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for ((left, order), (right, _)) in self.0.iter().zip(other.0.iter()) {
            let ordering = match order {
                ClusteringOrder::Asc => left.cmp(right),
                ClusteringOrder::Desc => right.cmp(left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for ClusteringKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Rows of one partition, sorted by clustering key.
type Partition = BTreeMap<ClusteringKey, Vec<Option<CqlValue>>>;

/// A validated write that has not been applied yet.
#[derive(Debug)]
pub(super) struct PendingWrite {
    partition_key: Vec<CqlValue>,
    clustering_key: ClusteringKey,
    cells: Vec<(usize, CqlValue)>,
}

/// An in-memory wide-column table.
#[derive(Debug)]
pub(super) struct Table {
    name: String,
    columns: Vec<ColumnDefinition>,
    partition_columns: Vec<usize>,
    clustering_columns: Vec<(usize, ClusteringOrder)>,
    partitions: BTreeMap<Vec<CqlValue>, Partition>,
}

impl Table {
    /// Builds an empty table, validating the key layout of the definition.
    pub fn new(definition: TableDefinition) -> IngestResult<Self> {
        let TableDefinition {
            name,
            columns,
            partition_key,
            clustering_key,
            clustering_order,
            ..
        } = definition;

        let position = |column: &str| -> IngestResult<usize> {
            match columns.iter().position(|c| c.name == column) {
                Some(index) => Ok(index),
                None => bail!(
                    ErrorKind::SchemaError,
                    "Key column is not defined",
                    format!("column '{column}' in table '{name}'")
                ),
            }
        };

        let partition_columns = partition_key
            .iter()
            .map(|column| position(column))
            .collect::<IngestResult<Vec<_>>>()?;

        if !clustering_order.is_empty()
            && (clustering_order.len() > clustering_key.len()
                || clustering_order
                    .iter()
                    .zip(clustering_key.iter())
                    .any(|((ordered, _), key)| ordered != key))
        {
            bail!(
                ErrorKind::SchemaError,
                "Clustering order must follow the clustering key",
                format!("table '{name}'")
            );
        }

        let mut clustering_columns = Vec::with_capacity(clustering_key.len());
        for (index, column) in clustering_key.iter().enumerate() {
            let order = clustering_order
                .get(index)
                .map(|(_, order)| *order)
                .unwrap_or(ClusteringOrder::Asc);
            clustering_columns.push((position(column)?, order));
        }

        Ok(Self {
            name,
            columns,
            partition_columns,
            clustering_columns,
            partitions: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves a column name to its index.
    pub fn column_index(&self, column: &str) -> IngestResult<usize> {
        match self.columns.iter().position(|c| c.name == column) {
            Some(index) => Ok(index),
            None => bail!(
                ErrorKind::InvalidStatement,
                "Undefined column name",
                format!("column '{column}' in table '{}'", self.name)
            ),
        }
    }

    /// Checks that an insert into `columns` is well formed without binding values.
    pub fn check_insert(&self, columns: &[String]) -> IngestResult<Vec<usize>> {
        let indices = columns
            .iter()
            .map(|column| self.column_index(column))
            .collect::<IngestResult<Vec<_>>>()?;

        let key_columns = self
            .partition_columns
            .iter()
            .chain(self.clustering_columns.iter().map(|(index, _)| index));
        for key_column in key_columns {
            if !indices.contains(key_column) {
                bail!(
                    ErrorKind::InvalidStatement,
                    "Insert is missing a primary key column",
                    format!(
                        "column '{}' in table '{}'",
                        self.columns[*key_column].name, self.name
                    )
                );
            }
        }

        Ok(indices)
    }

    /// Type checks an insert and computes where it lands.
    pub fn prepare_write(
        &self,
        columns: &[String],
        values: &[CqlValue],
    ) -> IngestResult<PendingWrite> {
        let indices = self.check_insert(columns)?;
        if indices.len() != values.len() {
            bail!(
                ErrorKind::InvalidStatement,
                "Wrong number of bound values",
                format!("expected {}, got {}", indices.len(), values.len())
            );
        }

        let mut cells = Vec::with_capacity(indices.len());
        for (index, value) in indices.into_iter().zip(values.iter()) {
            self.check_type(index, value)?;
            cells.push((index, value.clone()));
        }

        let cell = |index: usize| -> IngestResult<CqlValue> {
            match cells.iter().find(|(cell_index, _)| *cell_index == index) {
                Some((_, value)) => Ok(value.clone()),
                None => bail!(
                    ErrorKind::InvalidStatement,
                    "Insert is missing a primary key column",
                    format!("column '{}' in table '{}'", self.columns[index].name, self.name)
                ),
            }
        };

        let partition_key = self
            .partition_columns
            .iter()
            .map(|index| cell(*index))
            .collect::<IngestResult<Vec<_>>>()?;
        let clustering_key = ClusteringKey(
            self.clustering_columns
                .iter()
                .map(|(index, order)| cell(*index).map(|value| (value, *order)))
                .collect::<IngestResult<Vec<_>>>()?,
        );

        Ok(PendingWrite {
            partition_key,
            clustering_key,
            cells,
        })
    }

    /// Applies a write, overwriting the given cells of an existing row.
    pub fn apply(&mut self, write: PendingWrite) {
        let width = self.columns.len();
        let row = self
            .partitions
            .entry(write.partition_key)
            .or_default()
            .entry(write.clustering_key)
            .or_insert_with(|| vec![None; width]);

        for (index, value) in write.cells {
            row[index] = Some(value);
        }
    }

    /// Reads rows, optionally restricted to one partition, in clustering order.
    pub fn select(
        &self,
        projection: &Projection,
        restriction: Option<(&str, &CqlValue)>,
    ) -> IngestResult<Vec<Row>> {
        let projected = match projection {
            Projection::All => (0..self.columns.len()).collect::<Vec<_>>(),
            Projection::Columns(columns) => columns
                .iter()
                .map(|column| self.column_index(column))
                .collect::<IngestResult<Vec<_>>>()?,
        };

        let rows = match restriction {
            None => self
                .partitions
                .values()
                .flat_map(|partition| partition.values())
                .collect::<Vec<_>>(),
            Some((column, value)) => {
                let index = self.column_index(column)?;
                if self.partition_columns != [index] {
                    bail!(
                        ErrorKind::InvalidStatement,
                        "Only restrictions on the full partition key are supported",
                        format!("column '{column}' in table '{}'", self.name)
                    );
                }
                self.check_type(index, value)?;

                self.partitions
                    .get(std::slice::from_ref(value))
                    .map(|partition| partition.values().collect())
                    .unwrap_or_default()
            }
        };

        Ok(rows
            .into_iter()
            .map(|cells| {
                Row::new(
                    projected
                        .iter()
                        .map(|index| (self.columns[*index].name.clone(), cells[*index].clone()))
                        .collect(),
                )
            })
            .collect())
    }

    /// Number of partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Number of rows across all partitions.
    pub fn row_count(&self) -> usize {
        self.partitions.values().map(BTreeMap::len).sum()
    }

    fn check_type(&self, index: usize, value: &CqlValue) -> IngestResult<()> {
        let column = &self.columns[index];
        if column.column_type != value.column_type() {
            bail!(
                ErrorKind::InvalidData,
                "Bound value does not match the column type",
                format!(
                    "column '{}' of table '{}' is {}, got {}",
                    column.name,
                    self.name,
                    column.column_type,
                    value.column_type()
                )
            );
        }

        Ok(())
    }
}
