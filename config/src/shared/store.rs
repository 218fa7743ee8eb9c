use secrecy::SecretString;
use serde::Deserialize;

use crate::shared::ValidationError;

const fn default_connect_timeout_ms() -> u64 {
    StoreConfig::DEFAULT_CONNECT_TIMEOUT_MS
}

/// Wide-column store the catalog reads from and writes to.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-process store; all data is lost when the process exits.
    Memory,
    /// Scylla or Cassandra cluster reached through its native protocol.
    Scylla {
        /// `host:port` of the nodes used to discover the cluster.
        contact_points: Vec<String>,
        /// Keyspace holding the catalog tables. It must already exist.
        keyspace: String,
        username: Option<String>,
        password: Option<SecretString>,
        /// Timeout for establishing a connection to a node.
        #[serde(default = "default_connect_timeout_ms")]
        connect_timeout_ms: u64,
    },
}

impl StoreConfig {
    pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

    /// Validates the store settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let StoreConfig::Scylla {
            contact_points,
            keyspace,
            username,
            password,
            ..
        } = self
        else {
            return Ok(());
        };

        if contact_points.iter().all(|point| point.trim().is_empty()) {
            return Err(ValidationError::NoContactPoints);
        }

        if keyspace.is_empty()
            || !keyspace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ValidationError::InvalidKeyspace(keyspace.clone()));
        }

        if username.is_some() != password.is_some() {
            return Err(ValidationError::IncompleteCredentials);
        }

        Ok(())
    }
}
