//! Error types and result definitions for ingestion and lookup operations.
//!
//! [`IngestError`] carries a classification ([`ErrorKind`]), a static description, optional
//! dynamic detail, an optional source error and the call site where it was created.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for ingestion operations using [`IngestError`] as the error type.
pub type IngestResult<T> = Result<T, IngestError>;

/// Main error type for the loader.
///
/// The type is cheap to clone so that the same failure can be logged by a worker and still be
/// handed back to whoever awaits it.
#[derive(Debug, Clone)]
pub struct IngestError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Specific categories of errors that can occur while loading or querying.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Store Errors
    StoreConnectionFailed,
    StoreQueryFailed,
    StorePrepareFailed,
    SchemaError,
    InvalidStatement,

    // Data & Transformation Errors
    InvalidData,
    ConversionError,
    DeserializationError,

    // IO Errors
    IoError,

    // State & Workflow Errors
    InvalidState,
    WorkerPanic,

    // Configuration Errors
    ConfigError,

    // Unknown / Uncategorized
    Unknown,

    // Fault injection
    InjectedFault,
}

impl IngestError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        self.description.as_ref()
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the backtrace captured where this error was created.
    ///
    /// The backtrace is only populated when `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE` is set.
    pub fn backtrace(&self) -> &Backtrace {
        self.backtrace.as_ref()
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        IngestError {
            kind,
            description,
            detail,
            source,
            location: Location::caller(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        write_detail(self.detail.as_deref(), f)
    }
}

impl error::Error for IngestError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

/// Writes the detail block with indentation.
fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(detail) = detail else {
        return Ok(());
    };

    if detail.trim().is_empty() {
        return write!(f, "\n  Detail: <empty>");
    }

    write!(f, "\n  Detail:")?;
    for line in detail.lines() {
        write!(f, "\n    {line}")?;
    }

    Ok(())
}

/// Creates an [`IngestError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for IngestError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> IngestError {
        IngestError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates an [`IngestError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for IngestError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> IngestError {
        IngestError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts [`std::io::Error`] to [`IngestError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for IngestError {
    #[track_caller]
    fn from(err: std::io::Error) -> IngestError {
        let detail = err.to_string();
        IngestError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`serde_json::Error`] to [`IngestError`].
///
/// Syntax, data and EOF failures all map to [`ErrorKind::DeserializationError`].
impl From<serde_json::Error> for IngestError {
    #[track_caller]
    fn from(err: serde_json::Error) -> IngestError {
        let kind = match err.classify() {
            serde_json::error::Category::Io => ErrorKind::IoError,
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => ErrorKind::DeserializationError,
        };

        let detail = err.to_string();
        IngestError::from_components(
            kind,
            Cow::Borrowed("JSON deserialization failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`std::str::Utf8Error`] to [`IngestError`] with [`ErrorKind::ConversionError`].
impl From<std::str::Utf8Error> for IngestError {
    #[track_caller]
    fn from(err: std::str::Utf8Error) -> IngestError {
        let detail = err.to_string();
        IngestError::from_components(
            ErrorKind::ConversionError,
            Cow::Borrowed("UTF-8 conversion failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`tokio::task::JoinError`] to [`IngestError`] with [`ErrorKind::WorkerPanic`].
impl From<tokio::task::JoinError> for IngestError {
    #[track_caller]
    fn from(err: tokio::task::JoinError) -> IngestError {
        let detail = err.to_string();
        IngestError::from_components(
            ErrorKind::WorkerPanic,
            Cow::Borrowed("Ingestion worker terminated abnormally"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
