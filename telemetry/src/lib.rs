//! Logging setup shared by the loader binary and the test suites.

pub mod tracing;
