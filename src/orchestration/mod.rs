//! Ingestion orchestration.
//!
//! Drives an `EventSource` into the `Ledger`, resuming from the persisted watermark and
//! retrying transient failures.

pub mod ingest;

pub use ingest::{IngestionError, IngestionReport, Ingestor};
