//! Bounded worker pool driving concurrent ingestion.

mod pool;

pub use pool::{DrainSummary, WorkerPool};
