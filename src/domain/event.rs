//! Typed pool events as delivered by the event source.
//!
//! Field parsing is finished by the time a `PoolEvent` exists: addresses are 20 bytes, asset
//! indices are 0 or 1, and amounts are exact decimals.

use super::ids::RecordId;
use super::primitives::{Address, AssetIndex, Timestamp, TxHash};
use super::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Position of an event in the delivery order: block, then log index within the block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct EventPosition {
    pub block_number: u64,
    pub log_index: u32,
}

impl EventPosition {
    pub fn new(block_number: u64, log_index: u32) -> Self {
        Self {
            block_number,
            log_index,
        }
    }
}

impl std::fmt::Display for EventPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.block_number, self.log_index)
    }
}

/// Coordinates carried by every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    pub transaction_hash: TxHash,
    pub log_index: u32,
    pub block_number: u64,
    pub block_timestamp: Timestamp,
    pub contract_address: Address,
}

impl EventMeta {
    pub fn new(
        transaction_hash: TxHash,
        log_index: u32,
        block_number: u64,
        block_timestamp: Timestamp,
        contract_address: Address,
    ) -> Self {
        Self {
            transaction_hash,
            log_index,
            block_number,
            block_timestamp,
            contract_address,
        }
    }

    pub fn position(&self) -> EventPosition {
        EventPosition::new(self.block_number, self.log_index)
    }

    /// Id shared by every once-per-event record of this log.
    pub fn event_id(&self) -> RecordId {
        RecordId::for_event(&self.transaction_hash, self.log_index)
    }

    /// Id of the once-per-event record owned by `owner`.
    pub fn owner_id(&self, owner: &Address) -> RecordId {
        RecordId::for_owner(owner, self.block_number, self.log_index)
    }
}

/// LP-token transfer. A zero sender is a mint, a zero receiver a burn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub sender: Address,
    pub receiver: Address,
    pub value: Decimal,
}

/// Swap between the two pool assets (plain or underlying).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenExchange {
    pub buyer: Address,
    pub sold_id: AssetIndex,
    pub tokens_sold: Decimal,
    pub bought_id: AssetIndex,
    pub tokens_bought: Decimal,
}

/// Balanced add, proportional remove or imbalanced remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityChange {
    pub provider: Address,
    pub token_amounts: [Decimal; 2],
    pub fees: [Decimal; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invariant: Option<Decimal>,
    /// LP total supply after the operation; authoritative.
    pub token_supply: Decimal,
}

/// Single-asset withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLiquidityOne {
    pub provider: Address,
    pub token_id: AssetIndex,
    /// LP tokens burned.
    pub token_amount: Decimal,
    /// Units of `token_id` paid out of the pool.
    pub coin_amount: Decimal,
    pub token_supply: Decimal,
}

impl RemoveLiquidityOne {
    /// Two-element amount vector with the withdrawal at `token_id` and zero elsewhere.
    pub fn amounts(&self) -> [Decimal; 2] {
        let mut amounts = [Decimal::zero(), Decimal::zero()];
        amounts[self.token_id.index()] = self.coin_amount.clone();
        amounts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RampA {
    pub old_a: Decimal,
    pub new_a: Decimal,
    pub initial_time: Timestamp,
    pub future_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRampA {
    pub a: Decimal,
    pub t: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyNewFee {
    pub fee: Decimal,
    pub offpeg_fee_multiplier: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNewMaTime {
    pub ma_exp_time: Decimal,
    pub d_ma_time: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub owner: Address,
    pub spender: Address,
    pub value: Decimal,
}

/// Event kind with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "params")]
pub enum EventKind {
    Transfer(Transfer),
    TokenExchange(TokenExchange),
    TokenExchangeUnderlying(TokenExchange),
    AddLiquidity(LiquidityChange),
    RemoveLiquidity(LiquidityChange),
    RemoveLiquidityImbalance(LiquidityChange),
    RemoveLiquidityOne(RemoveLiquidityOne),
    RampA(RampA),
    StopRampA(StopRampA),
    ApplyNewFee(ApplyNewFee),
    SetNewMaTime(SetNewMaTime),
    Approval(Approval),
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Transfer(_) => "Transfer",
            EventKind::TokenExchange(_) => "TokenExchange",
            EventKind::TokenExchangeUnderlying(_) => "TokenExchangeUnderlying",
            EventKind::AddLiquidity(_) => "AddLiquidity",
            EventKind::RemoveLiquidity(_) => "RemoveLiquidity",
            EventKind::RemoveLiquidityImbalance(_) => "RemoveLiquidityImbalance",
            EventKind::RemoveLiquidityOne(_) => "RemoveLiquidityOne",
            EventKind::RampA(_) => "RampA",
            EventKind::StopRampA(_) => "StopRampA",
            EventKind::ApplyNewFee(_) => "ApplyNewFee",
            EventKind::SetNewMaTime(_) => "SetNewMaTime",
            EventKind::Approval(_) => "Approval",
        }
    }

    /// Non-null accounts whose aggregate state this event can mutate.
    pub fn participants(&self) -> Vec<Address> {
        let candidates = match self {
            EventKind::Transfer(t) => vec![t.sender, t.receiver],
            EventKind::TokenExchange(x) | EventKind::TokenExchangeUnderlying(x) => vec![x.buyer],
            EventKind::AddLiquidity(l)
            | EventKind::RemoveLiquidity(l)
            | EventKind::RemoveLiquidityImbalance(l) => vec![l.provider],
            EventKind::RemoveLiquidityOne(r) => vec![r.provider],
            EventKind::RampA(_)
            | EventKind::StopRampA(_)
            | EventKind::ApplyNewFee(_)
            | EventKind::SetNewMaTime(_)
            | EventKind::Approval(_) => Vec::new(),
        };
        let mut out: Vec<Address> = candidates.into_iter().filter(|a| !a.is_zero()).collect();
        out.dedup();
        out
    }
}

/// A single decoded log from the pool contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl PoolEvent {
    pub fn new(meta: EventMeta, kind: EventKind) -> Self {
        Self { meta, kind }
    }

    /// SHA-256 over the canonical JSON encoding, used to tell a faithful re-delivery from a
    /// conflicting event reusing the same coordinates.
    ///
    /// # Errors
    /// Returns an error if the event cannot be serialized.
    pub fn payload_digest(&self) -> Result<String, serde_json::Error> {
        let canonical = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&canonical);
        Ok(hex::encode(digest))
    }

    /// Parameters alone, as stored verbatim in the audit entry.
    ///
    /// # Errors
    /// Returns an error if the parameters cannot be serialized.
    pub fn params_json(&self) -> Result<String, serde_json::Error> {
        let tagged = serde_json::to_value(&self.kind)?;
        let params = tagged
            .get("params")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        serde_json::to_string(&params)
    }
}
