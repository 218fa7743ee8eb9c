use fail::fail_point;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};

/// Fires after a batch has been validated and before any of its writes is applied.
pub const MEMORY_STORE_BATCH__BEFORE_APPLY: &str = "memory_store_batch.before_apply";

/// Fires inside an ingestion worker before the normalized record is written.
pub const INGEST_WORKER__BEFORE_WRITE: &str = "ingest_worker.before_write";

/// Returns an error when the named fail point is configured to `return`.
///
/// Without the `failpoints` feature the fail point compiles away and this always succeeds.
pub fn ingest_fail_point(name: &str) -> IngestResult<()> {
    fail_point!(name, |parameter| {
        let detail = match parameter {
            Some(parameter) => format!("The failpoint '{name}' returned an error ({parameter})"),
            None => format!("The failpoint '{name}' returned an error"),
        };

        bail!(
            ErrorKind::InjectedFault,
            "An error occurred in a fail point",
            detail
        );
    });

    Ok(())
}
