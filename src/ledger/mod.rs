//! Durable application of pool events.
//!
//! This module provides:
//! - Effectively-once application over an at-least-once source (processed-event set)
//! - Staging of the touched aggregates into a `MemoryStore`
//! - A single SQLite transaction per event for every resulting change

use crate::engine::{EngineError, ZeroSupplyReport};
use thiserror::Error;

pub mod apply;

pub use apply::Ledger;

/// Result of offering one event to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The event's effects were committed.
    Applied(AppliedEvent),
    /// Already applied with an identical payload; nothing was written.
    Duplicate,
    /// Already applied under the same coordinates but with a different payload; skipped.
    Conflict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedEvent {
    pub records_inserted: usize,
    pub zero_supply_reports: Vec<ZeroSupplyReport>,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to encode event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl LedgerError {
    /// Store failures may clear up on retry; engine and payload failures never will.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Store(_))
    }
}
