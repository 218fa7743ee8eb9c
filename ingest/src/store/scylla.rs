//! [`Store`] implementation backed by the Scylla/Cassandra driver.

use chrono::DateTime;
use config::shared::StoreConfig;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::QueryResult;
use scylla::statement::prepared::PreparedStatement;
use scylla::value::{CqlTimestamp, CqlValue as DriverValue, Row as DriverRow};
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;
use crate::store::base::{BoundStatement, Store, StoreConnector};
use crate::types::{CqlValue, ResultSet, Row};

/// Opens sessions against a Scylla or Cassandra cluster.
#[derive(Debug, Clone)]
pub struct ScyllaConnector {
    contact_points: Vec<String>,
    keyspace: String,
    credentials: Option<(String, SecretString)>,
    connect_timeout: Duration,
}

impl ScyllaConnector {
    /// Builds a connector from a `scylla` store configuration.
    pub fn from_config(config: &StoreConfig) -> IngestResult<Self> {
        let StoreConfig::Scylla {
            contact_points,
            keyspace,
            username,
            password,
            connect_timeout_ms,
        } = config
        else {
            bail!(
                ErrorKind::ConfigError,
                "Store configuration is not a scylla configuration"
            );
        };

        let credentials = match (username, password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            (None, None) => None,
            _ => bail!(
                ErrorKind::ConfigError,
                "Username and password must be set together"
            ),
        };

        Ok(Self {
            contact_points: contact_points.clone(),
            keyspace: keyspace.clone(),
            credentials,
            connect_timeout: Duration::from_millis(*connect_timeout_ms),
        })
    }
}

impl StoreConnector for ScyllaConnector {
    type Store = ScyllaStore;

    async fn connect(&self) -> IngestResult<ScyllaStore> {
        let mut builder = SessionBuilder::new()
            .known_nodes(&self.contact_points)
            .connection_timeout(self.connect_timeout)
            .use_keyspace(&self.keyspace, false);

        if let Some((username, password)) = &self.credentials {
            builder = builder.user(username, password.expose_secret());
        }

        let session = builder.build().await.map_err(|err| {
            ingest_error!(
                ErrorKind::StoreConnectionFailed,
                "Failed to connect to the cluster",
                format!("contact points {:?}: {err}", self.contact_points),
                source: err
            )
        })?;

        info!(keyspace = %self.keyspace, nodes = self.contact_points.len(), "connected to cluster");

        Ok(ScyllaStore {
            session: Arc::new(session),
        })
    }
}

/// A shared driver session.
///
/// The driver pools connections itself, so all clones share one session. The session is shut
/// down when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct ScyllaStore {
    session: Arc<Session>,
}

impl Store for ScyllaStore {
    type Prepared = PreparedStatement;

    fn name() -> &'static str {
        "scylla"
    }

    async fn execute(&self, cql: &str) -> IngestResult<ResultSet> {
        let result = self.session.query_unpaged(cql, ()).await.map_err(|err| {
            ingest_error!(
                ErrorKind::StoreQueryFailed,
                "Statement execution failed",
                format!("{cql}: {err}"),
                source: err
            )
        })?;

        into_result_set(result)
    }

    async fn prepare(&self, cql: &str) -> IngestResult<PreparedStatement> {
        let prepared = self.session.prepare(cql).await.map_err(|err| {
            ingest_error!(
                ErrorKind::StorePrepareFailed,
                "Statement could not be prepared",
                format!("{cql}: {err}"),
                source: err
            )
        })?;
        debug!(%cql, "prepared statement");

        Ok(prepared)
    }

    async fn execute_bound(
        &self,
        statement: &BoundStatement<PreparedStatement>,
    ) -> IngestResult<ResultSet> {
        let values = statement
            .values()
            .iter()
            .map(to_driver_value)
            .collect::<Vec<_>>();

        let result = self
            .session
            .execute_unpaged(statement.prepared(), values)
            .await
            .map_err(|err| {
                ingest_error!(
                    ErrorKind::StoreQueryFailed,
                    "Prepared statement execution failed",
                    err.to_string(),
                    source: err
                )
            })?;

        into_result_set(result)
    }

    /// The driver session is shared by every clone of this handle and shuts its connection
    /// pool down once the last clone is dropped, so closing only reports how many remain.
    async fn close(&self) -> IngestResult<()> {
        info!(
            handles = Arc::strong_count(&self.session),
            "releasing cluster session"
        );

        Ok(())
    }
}

fn to_driver_value(value: &CqlValue) -> DriverValue {
    match value {
        CqlValue::Text(text) => DriverValue::Text(text.clone()),
        CqlValue::Int(int) => DriverValue::Int(*int),
        CqlValue::Timestamp(time) => DriverValue::Timestamp(CqlTimestamp(time.timestamp_millis())),
        CqlValue::TextSet(set) => {
            DriverValue::Set(set.iter().cloned().map(DriverValue::Text).collect())
        }
    }
}

fn from_driver_value(column: &str, value: DriverValue) -> IngestResult<Option<CqlValue>> {
    let value = match value {
        DriverValue::Empty => return Ok(None),
        DriverValue::Text(text) | DriverValue::Ascii(text) => CqlValue::Text(text),
        DriverValue::Int(int) => CqlValue::Int(int),
        DriverValue::Timestamp(CqlTimestamp(millis)) => {
            let Some(time) = DateTime::from_timestamp_millis(millis) else {
                bail!(
                    ErrorKind::ConversionError,
                    "Timestamp is out of range",
                    format!("column '{column}' holds {millis} ms")
                );
            };
            CqlValue::Timestamp(time)
        }
        DriverValue::Set(elements) | DriverValue::List(elements) => {
            let mut set = BTreeSet::new();
            for element in elements {
                match element {
                    DriverValue::Text(text) | DriverValue::Ascii(text) => {
                        set.insert(text);
                    }
                    other => bail!(
                        ErrorKind::ConversionError,
                        "Collection element is not text",
                        format!("column '{column}' holds {other:?}")
                    ),
                }
            }
            CqlValue::TextSet(set)
        }
        other => bail!(
            ErrorKind::ConversionError,
            "Unsupported column type",
            format!("column '{column}' holds {other:?}")
        ),
    };

    Ok(Some(value))
}

fn into_result_set(result: QueryResult) -> IngestResult<ResultSet> {
    if !result.is_rows() {
        return Ok(Vec::new());
    }

    let rows = result.into_rows_result().map_err(|err| {
        ingest_error!(
            ErrorKind::StoreQueryFailed,
            "Failed to read the result rows",
            err.to_string(),
            source: err
        )
    })?;

    let names = rows
        .column_specs()
        .iter()
        .map(|spec| spec.name().to_lowercase())
        .collect::<Vec<_>>();

    let typed_rows = rows.rows::<DriverRow>().map_err(|err| {
        ingest_error!(
            ErrorKind::ConversionError,
            "Failed to deserialize the result rows",
            err.to_string(),
            source: err
        )
    })?;

    let mut result_set = Vec::new();
    for row in typed_rows {
        let row = row.map_err(|err| {
            ingest_error!(
                ErrorKind::ConversionError,
                "Failed to deserialize a result row",
                err.to_string(),
                source: err
            )
        })?;

        let mut columns = Vec::with_capacity(names.len());
        for (name, value) in names.iter().zip(row.columns) {
            let value = match value {
                Some(value) => from_driver_value(name, value)?,
                None => None,
            };
            columns.push((name.clone(), value));
        }
        result_set.push(Row::new(columns));
    }

    Ok(result_set)
}
