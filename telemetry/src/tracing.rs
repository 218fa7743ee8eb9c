use std::sync::Once;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

/// Filter used by tests when `RUST_LOG` is not set.
const TEST_DEFAULT_FILTER: &str = "info";

/// Returned when a global subscriber is already installed.
#[derive(Debug, Error)]
#[error("failed to initialize tracing: {0}")]
pub struct TracingInitError(String);

/// Installs the global fmt subscriber for a binary.
///
/// `RUST_LOG` takes precedence; otherwise `app_name` and this crate's callers log at `info`.
pub fn init_tracing(app_name: &str) -> Result<(), TracingInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{app_name}=info,ingest=info,warn")));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| TracingInitError(err.to_string()))
}

/// Installs a subscriber that writes through the test harness, once per process.
///
/// Output is captured per test and only shown for failing tests.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(TEST_DEFAULT_FILTER));

        // Another harness may have installed a subscriber already.
        let _ = SubscriberBuilder::default()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
