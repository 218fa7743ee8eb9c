use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The worker pool needs at least one worker.
    #[error("`worker_count` cannot be zero")]
    WorkerCountZero,
    /// Draining needs a positive timeout.
    #[error("`drain_timeout_secs` cannot be zero")]
    DrainTimeoutZero,
    /// A cluster store needs somewhere to connect to.
    #[error("`contact_points` must list at least one node")]
    NoContactPoints,
    /// Keyspace names are limited to alphanumerics and underscores.
    #[error("invalid keyspace name `{0}`")]
    InvalidKeyspace(String),
    /// Credentials must be given together.
    #[error("`username` and `password` must either both be set or both be omitted")]
    IncompleteCredentials,
}
