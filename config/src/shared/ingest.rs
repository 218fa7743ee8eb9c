use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::ValidationError;

/// Settings of the concurrent ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestConfig {
    /// Maximum number of records being written at the same time.
    #[serde(default = "IngestConfig::default_worker_count")]
    pub worker_count: usize,
    /// How long to wait for in-flight records once the input is exhausted.
    #[serde(default = "IngestConfig::default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl IngestConfig {
    pub const DEFAULT_WORKER_COUNT: usize = 250;

    pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 60 * 60;

    fn default_worker_count() -> usize {
        Self::DEFAULT_WORKER_COUNT
    }

    fn default_drain_timeout_secs() -> u64 {
        Self::DEFAULT_DRAIN_TIMEOUT_SECS
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    /// Validates the pipeline settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_count == 0 {
            return Err(ValidationError::WorkerCountZero);
        }

        if self.drain_timeout_secs == 0 {
            return Err(ValidationError::DrainTimeoutZero);
        }

        Ok(())
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            worker_count: Self::DEFAULT_WORKER_COUNT,
            drain_timeout_secs: Self::DEFAULT_DRAIN_TIMEOUT_SECS,
        }
    }
}
