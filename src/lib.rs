pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod orchestration;

pub use config::Config;
pub use datasource::{EventSource, JsonlEventSource, MockEventSource, SourceError};
pub use db::{init_db, Repository};
pub use domain::{
    Account, Address, AssetIndex, Decimal, EventKind, EventMeta, EventPosition, Pool, PoolEvent,
    RecordId, Timestamp, TxHash,
};
pub use engine::{process_event, MemoryStore, TxContext, ZeroSupplyPolicy};
pub use error::AppError;
pub use ledger::{ApplyOutcome, Ledger, LedgerError};
pub use orchestration::{IngestionError, IngestionReport, Ingestor};
