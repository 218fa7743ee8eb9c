//! Concurrent ingestion of newline-delimited records.
//!
//! Every non-blank input line becomes one unit of work on a [`WorkerPool`]: the line is parsed
//! leniently, normalized and written through the [`WriteGateway`]. A failing unit is logged
//! together with its raw line and otherwise ignored, so one bad record never stops a load.

use config::shared::IngestConfig;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::error::{ErrorKind, IngestResult};
use crate::failpoints::{INGEST_WORKER__BEFORE_WRITE, ingest_fail_point};
use crate::gateway::WriteGateway;
use crate::ingest_error;
use crate::normalize::lenient::parse_object;
use crate::normalize::{normalize_item, normalize_review};
use crate::store::Store;
use crate::workers::WorkerPool;

/// Kind of record carried by an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Item,
    Review,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Item => f.write_str("item"),
            RecordKind::Review => f.write_str("review"),
        }
    }
}

/// Loads item and review sources into the catalog tables.
#[derive(Debug)]
pub struct IngestPipeline<S: Store> {
    gateway: WriteGateway<S>,
    config: IngestConfig,
}

impl<S> IngestPipeline<S>
where
    S: Store + Clone + Send + Sync + 'static,
{
    pub fn new(gateway: WriteGateway<S>, config: IngestConfig) -> Self {
        Self { gateway, config }
    }

    /// Loads the items file at `path` and returns the number of items written.
    pub async fn load_items(&self, path: impl AsRef<Path>) -> IngestResult<u64> {
        let reader = open(path.as_ref()).await?;
        self.load(reader, RecordKind::Item).await
    }

    /// Loads the reviews file at `path` and returns the number of reviews written.
    pub async fn load_reviews(&self, path: impl AsRef<Path>) -> IngestResult<u64> {
        let reader = open(path.as_ref()).await?;
        self.load(reader, RecordKind::Review).await
    }

    /// Loads items from any line-oriented reader.
    pub async fn load_items_from<R>(&self, reader: R) -> IngestResult<u64>
    where
        R: AsyncBufRead + Unpin,
    {
        self.load(reader, RecordKind::Item).await
    }

    /// Loads reviews from any line-oriented reader.
    pub async fn load_reviews_from<R>(&self, reader: R) -> IngestResult<u64>
    where
        R: AsyncBufRead + Unpin,
    {
        self.load(reader, RecordKind::Review).await
    }

    async fn load<R>(&self, mut reader: R, kind: RecordKind) -> IngestResult<u64>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut pool = WorkerPool::new(self.config.worker_count)?;
        let written = Arc::new(AtomicU64::new(0));

        info!(%kind, workers = pool.size(), "starting load");

        let mut line_number: u64 = 0;
        let read_result = loop {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break Ok(()),
                Ok(_) => {}
                Err(err) => break Err(err),
            }
            line_number += 1;

            if line.trim_ascii().is_empty() {
                continue;
            }

            let gateway = self.gateway.clone();
            let written = written.clone();
            pool.submit(ingest_line(kind, line_number, line, gateway, written))
                .await?;
        };

        let summary = pool.drain(self.config.drain_timeout()).await;
        let written = written.load(Ordering::SeqCst);

        if let Err(err) = read_result {
            error!(%kind, line_number, written, error = %err, "reading the input failed");
            return Err(ingest_error!(
                ErrorKind::IoError,
                "Failed to read the input",
                format!("after line {line_number}"),
                source: err
            ));
        }

        if summary.aborted > 0 || summary.panicked > 0 {
            warn!(
                %kind,
                aborted = summary.aborted,
                panicked = summary.panicked,
                "load finished with records that did not complete"
            );
        }
        info!(
            %kind,
            lines = line_number,
            written,
            finished = summary.finished,
            panicked = summary.panicked,
            "load finished"
        );

        Ok(written)
    }
}

async fn open(path: &Path) -> IngestResult<BufReader<File>> {
    let file = File::open(path).await.map_err(|err| {
        ingest_error!(
            ErrorKind::IoError,
            "Failed to open the input file",
            path.display(),
            source: err
        )
    })?;

    Ok(BufReader::new(file))
}

/// Runs one unit of work and records its outcome.
async fn ingest_line<S>(
    kind: RecordKind,
    line_number: u64,
    raw: Vec<u8>,
    gateway: WriteGateway<S>,
    written: Arc<AtomicU64>,
) where
    S: Store + Clone + Send + Sync + 'static,
{
    let result = AssertUnwindSafe(ingest_record(kind, &raw, &gateway))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(ingest_error!(
                ErrorKind::WorkerPanic,
                "Ingestion worker panicked",
                panic_message(panic.as_ref())
            ))
        });

    match result {
        Ok(()) => {
            written.fetch_add(1, Ordering::SeqCst);
        }
        Err(err) => {
            let line = String::from_utf8_lossy(&raw);
            error!(
                %kind,
                line_number,
                line = %line.trim(),
                error = %err,
                "failed to ingest record"
            );
        }
    }
}

async fn ingest_record<S: Store>(
    kind: RecordKind,
    raw: &[u8],
    gateway: &WriteGateway<S>,
) -> IngestResult<()> {
    let line = std::str::from_utf8(raw)?.trim();
    let object = parse_object(line)?;

    match kind {
        RecordKind::Item => {
            let item = normalize_item(&object);
            ingest_fail_point(INGEST_WORKER__BEFORE_WRITE)?;
            gateway.write_item(&item).await
        }
        RecordKind::Review => {
            let review = normalize_review(&object);
            ingest_fail_point(INGEST_WORKER__BEFORE_WRITE)?;
            gateway.write_review(&review).await
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
