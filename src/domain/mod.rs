//! Domain types for the stable-swap pool ledger.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Fixed-width primitives: Address, TxHash, Timestamp, AssetIndex
//! - Deterministic record identifiers
//! - Typed pool events, mutable aggregates and write-once historical records

pub mod decimal;
pub mod entities;
pub mod event;
pub mod ids;
pub mod primitives;
pub mod records;

pub use decimal::Decimal;
pub use entities::{Account, Pool};
pub use event::{
    Approval, ApplyNewFee, EventKind, EventMeta, EventPosition, LiquidityChange, PoolEvent, RampA,
    RemoveLiquidityOne, SetNewMaTime, StopRampA, TokenExchange, Transfer,
};
pub use ids::RecordId;
pub use primitives::{Address, AssetIndex, AssetIndexError, HexParseError, Timestamp, TxHash};
pub use records::{
    AccountSnapshot, AuditEntry, HistoricalRecord, PoolSnapshot, PoolTransaction, RecordFamily,
    TransactionKind,
};
