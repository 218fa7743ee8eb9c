//! Configuration types shared by the loader binary and the ingestion library.

mod base;
mod ingest;
mod loader;
mod store;

pub use base::ValidationError;
pub use ingest::IngestConfig;
pub use loader::LoaderConfig;
pub use store::StoreConfig;
