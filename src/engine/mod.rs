//! Pure accounting engine: event routing, handlers and the entity-store seam.
//!
//! Nothing in here touches I/O. Handlers read and write aggregates through an `EntityStore`
//! and leave every change in that store for the caller to commit.

use crate::domain::{Address, EventPosition, TxHash};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod accountant;
pub mod audit;
pub mod context;
pub mod exchange;
pub mod liquidity;
pub mod router;
pub mod share;
pub mod store;
pub mod transfer;

pub use accountant::{Accountant, HandlerOutcome};
pub use context::TxContext;
pub use router::{process_event, route};
pub use share::{share_of_pool, ShareOfPool};
pub use store::{EntityStore, Fetched, MemoryStore, UnitOfWork};

/// What to do when a share must be computed while the pool's total supply is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroSupplyPolicy {
    /// Store a zero share, log a warning and count the occurrence.
    #[default]
    Report,
    /// Fail the event so nothing it touched is committed.
    Halt,
}

impl ZeroSupplyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZeroSupplyPolicy::Report => "report",
            ZeroSupplyPolicy::Halt => "halt",
        }
    }
}

impl fmt::Display for ZeroSupplyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZeroSupplyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" => Ok(ZeroSupplyPolicy::Report),
            "halt" => Ok(ZeroSupplyPolicy::Halt),
            other => Err(format!("expected 'report' or 'halt', got '{}'", other)),
        }
    }
}

/// A share computed against a zero total supply under `ZeroSupplyPolicy::Report`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroSupplyReport {
    pub pool: Address,
    pub account: Address,
    pub tx_hash: TxHash,
    pub position: EventPosition,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("pool {pool} has zero total supply while computing share of {account} at {position}")]
    ZeroTotalSupply {
        pool: Address,
        account: Address,
        position: EventPosition,
    },

    #[error("failed to encode event parameters at {position}: {message}")]
    Payload {
        position: EventPosition,
        message: String,
    },
}
