use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::bail;
use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::ingest_error;

/// Result of draining a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainSummary {
    /// Units that ran to completion, including ones that reported their own failure.
    pub finished: usize,
    /// Units that panicked.
    pub panicked: usize,
    /// Units still running when the drain timed out, which were aborted.
    pub aborted: usize,
}

/// Fixed-size pool of ingestion workers.
///
/// Each submitted unit runs on its own task while holding one of `size` permits, so at most
/// `size` units are ever in flight. [`WorkerPool::submit`] waits for a free permit, which is
/// the only backpressure applied to the line reader.
#[derive(Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    join_set: JoinSet<()>,
    size: usize,
    summary: DrainSummary,
}

impl WorkerPool {
    /// Creates a pool running at most `size` units concurrently.
    pub fn new(size: usize) -> IngestResult<Self> {
        if size == 0 {
            bail!(
                ErrorKind::ConfigError,
                "Worker pool size must be greater than zero"
            );
        }

        Ok(Self {
            permits: Arc::new(Semaphore::new(size)),
            join_set: JoinSet::new(),
            size,
            summary: DrainSummary::default(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Submits a unit, waiting until a worker slot is free.
    pub async fn submit<F>(&mut self, unit: F) -> IngestResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reap_finished();

        let permit = self.permits.clone().acquire_owned().await.map_err(|err| {
            ingest_error!(
                ErrorKind::InvalidState,
                "Could not acquire a worker slot",
                err.to_string()
            )
        })?;

        self.join_set.spawn(async move {
            unit.await;

            drop(permit);
        });

        Ok(())
    }

    /// Waits for all submitted units, aborting whatever is still running after `timeout`.
    pub async fn drain(mut self, timeout: Duration) -> DrainSummary {
        let join_set = &mut self.join_set;
        let summary = &mut self.summary;

        let drained = tokio::time::timeout(timeout, async {
            while let Some(result) = join_set.join_next().await {
                record(summary, result);
            }
        })
        .await;

        if drained.is_err() {
            let remaining = self.join_set.len();
            warn!(
                remaining,
                timeout_secs = timeout.as_secs(),
                "worker pool did not drain in time, aborting remaining units"
            );

            self.join_set.abort_all();
            while let Some(result) = self.join_set.join_next().await {
                match result {
                    Err(err) if err.is_cancelled() => self.summary.aborted += 1,
                    result => record(&mut self.summary, result),
                }
            }
        }

        debug!(
            finished = self.summary.finished,
            panicked = self.summary.panicked,
            aborted = self.summary.aborted,
            "worker pool drained"
        );

        self.summary
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.join_set.try_join_next() {
            record(&mut self.summary, result);
        }
    }
}

fn record(summary: &mut DrainSummary, result: Result<(), tokio::task::JoinError>) {
    match result {
        Ok(()) => summary.finished += 1,
        Err(err) if err.is_cancelled() => {
            debug!("worker task was cancelled");
            summary.aborted += 1;
        }
        Err(err) => {
            let err = IngestError::from(err);
            error!(error = %err, "worker task panicked");
            summary.panicked += 1;
        }
    }
}
