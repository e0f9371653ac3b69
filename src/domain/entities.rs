//! Mutable aggregates: Account and Pool.

use super::primitives::{Address, AssetIndex, Timestamp};
use super::Decimal;
use serde::{Deserialize, Serialize};

/// One liquidity participant, keyed by address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Address,
    /// Pool the account was first observed in.
    pub pool: Address,
    pub lp_balance: Decimal,
    pub share_of_pool: Decimal,
    pub last_activity: Timestamp,
    pub tx_count: u64,
}

impl Account {
    /// Fresh account with zero balance, stamped with the creating event's time.
    pub fn new(id: Address, pool: Address, created_at: Timestamp) -> Self {
        Self {
            id,
            pool,
            lp_balance: Decimal::zero(),
            share_of_pool: Decimal::zero(),
            last_activity: created_at,
            tx_count: 0,
        }
    }

    /// Record an operation performed by this account.
    pub fn touch(&mut self, at: Timestamp) {
        self.last_activity = at;
        self.tx_count += 1;
    }
}

/// Two-asset pool, keyed by contract address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: Address,
    /// Token-unit balances, indexed by `AssetIndex`.
    pub reserves: [Decimal; 2],
    pub total_supply: Decimal,
    pub cumulative_volume: Decimal,
    pub liquidity_added: [Decimal; 2],
    pub liquidity_removed: [Decimal; 2],
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Pool {
    pub fn new(id: Address, created_at: Timestamp) -> Self {
        Self {
            id,
            reserves: [Decimal::zero(), Decimal::zero()],
            total_supply: Decimal::zero(),
            cumulative_volume: Decimal::zero(),
            liquidity_added: [Decimal::zero(), Decimal::zero()],
            liquidity_removed: [Decimal::zero(), Decimal::zero()],
            created_at,
            updated_at: created_at,
        }
    }

    pub fn reserve(&self, asset: AssetIndex) -> Decimal {
        self.reserves[asset.index()].clone()
    }

    pub fn reserve_a(&self) -> Decimal {
        self.reserve(AssetIndex::A)
    }

    pub fn reserve_b(&self) -> Decimal {
        self.reserve(AssetIndex::B)
    }
}
