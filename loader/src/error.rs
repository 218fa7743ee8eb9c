use ingest::error::IngestError;
use std::backtrace::BacktraceStatus;
use std::error::Error;

pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors that end a loader run.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("invalid configuration")]
    Config(#[source] Box<dyn Error + Send + Sync>),
    /// I/O failure outside the catalog, such as building the runtime.
    #[error("i/o failure")]
    Io(#[from] std::io::Error),
}

impl LoaderError {
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        LoaderError::Config(Box::new(err))
    }

    /// Renders the error and its causes for the terminal.
    ///
    /// Catalog errors also print the backtrace captured where they were raised, when one was
    /// captured.
    pub fn render_report(&self) -> String {
        let mut report = format!("loader failed: {self}\n");

        let mut source = self.source();
        while let Some(cause) = source {
            report.push_str(&format!("  caused by: {cause}\n"));
            source = cause.source();
        }

        if let LoaderError::Ingest(err) = self
            && err.backtrace().status() == BacktraceStatus::Captured
        {
            report.push_str(&format!("backtrace:\n{}\n", err.backtrace()));
        }

        report
    }
}
