use serde::Deserialize;

use crate::Config;
use crate::shared::{IngestConfig, StoreConfig, ValidationError};

/// Top-level configuration of the loader binary.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl LoaderConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        self.ingest.validate()
    }
}

impl Config for LoaderConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["store.scylla.contact_points"];
}
