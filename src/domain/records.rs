//! Append-only historical records. Written once, never mutated.

use super::entities::{Account, Pool};
use super::event::{EventMeta, EventPosition};
use super::ids::RecordId;
use super::primitives::{Address, AssetIndex, Timestamp, TxHash};
use super::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record table a `HistoricalRecord` belongs to. Ids are unique per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordFamily {
    Audit,
    AccountSnapshot,
    PoolSnapshot,
    PoolTransaction,
}

/// Verbatim copy of one raw event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: RecordId,
    pub event: String,
    #[serde(flatten)]
    pub meta: EventMeta,
    /// Event parameters as canonical JSON.
    pub params: String,
}

/// Account state right after an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub id: RecordId,
    pub account: Address,
    pub pool: Address,
    pub position: EventPosition,
    pub tx_hash: TxHash,
    pub timestamp: Timestamp,
    pub lp_balance: Decimal,
    pub share_of_pool: Decimal,
}

impl AccountSnapshot {
    pub fn capture(account: &Account, meta: &EventMeta) -> Self {
        Self {
            id: meta.owner_id(&account.id),
            account: account.id,
            pool: account.pool,
            position: meta.position(),
            tx_hash: meta.transaction_hash,
            timestamp: meta.block_timestamp,
            lp_balance: account.lp_balance.clone(),
            share_of_pool: account.share_of_pool.clone(),
        }
    }
}

/// Pool state right after an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshot {
    pub id: RecordId,
    pub pool: Address,
    pub position: EventPosition,
    pub tx_hash: TxHash,
    pub timestamp: Timestamp,
    pub reserves: [Decimal; 2],
    pub total_supply: Decimal,
    pub cumulative_volume: Decimal,
}

impl PoolSnapshot {
    pub fn capture(pool: &Pool, meta: &EventMeta) -> Self {
        Self {
            id: meta.owner_id(&pool.id),
            pool: pool.id,
            position: meta.position(),
            tx_hash: meta.transaction_hash,
            timestamp: meta.block_timestamp,
            reserves: pool.reserves.clone(),
            total_supply: pool.total_supply.clone(),
            cumulative_volume: pool.cumulative_volume.clone(),
        }
    }
}

/// Operation type tag of a `PoolTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Swap,
    AddLiquidity,
    RemoveLiquidity,
    RemoveLiquidityOne,
    RemoveLiquidityImbalance,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Swap => "swap",
            TransactionKind::AddLiquidity => "add_liquidity",
            TransactionKind::RemoveLiquidity => "remove_liquidity",
            TransactionKind::RemoveLiquidityOne => "remove_liquidity_one",
            TransactionKind::RemoveLiquidityImbalance => "remove_liquidity_imbalance",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "swap" => Ok(TransactionKind::Swap),
            "add_liquidity" => Ok(TransactionKind::AddLiquidity),
            "remove_liquidity" => Ok(TransactionKind::RemoveLiquidity),
            "remove_liquidity_one" => Ok(TransactionKind::RemoveLiquidityOne),
            "remove_liquidity_imbalance" => Ok(TransactionKind::RemoveLiquidityImbalance),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

/// One swap or liquidity operation, linked to both pool and account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolTransaction {
    pub id: RecordId,
    pub pool: Address,
    pub account: Address,
    pub kind: TransactionKind,
    /// Asset the trader sold; swaps only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sold_asset: Option<AssetIndex>,
    /// Per-asset amounts moved, indexed by `AssetIndex`.
    pub amounts: [Decimal; 2],
    pub position: EventPosition,
    pub tx_hash: TxHash,
    pub timestamp: Timestamp,
}

/// Any write-once record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoricalRecord {
    Audit(AuditEntry),
    AccountSnapshot(AccountSnapshot),
    PoolSnapshot(PoolSnapshot),
    PoolTransaction(PoolTransaction),
}

impl HistoricalRecord {
    pub fn id(&self) -> &RecordId {
        match self {
            HistoricalRecord::Audit(r) => &r.id,
            HistoricalRecord::AccountSnapshot(r) => &r.id,
            HistoricalRecord::PoolSnapshot(r) => &r.id,
            HistoricalRecord::PoolTransaction(r) => &r.id,
        }
    }

    pub fn family(&self) -> RecordFamily {
        match self {
            HistoricalRecord::Audit(_) => RecordFamily::Audit,
            HistoricalRecord::AccountSnapshot(_) => RecordFamily::AccountSnapshot,
            HistoricalRecord::PoolSnapshot(_) => RecordFamily::PoolSnapshot,
            HistoricalRecord::PoolTransaction(_) => RecordFamily::PoolTransaction,
        }
    }
}
