//! Event builders and database setup shared by the integration tests.
#![allow(dead_code)]

use stableswap_ledger::db::init_db;
use stableswap_ledger::domain::{
    Address, Approval, AssetIndex, Decimal, EventKind, EventMeta, LiquidityChange, PoolEvent,
    RemoveLiquidityOne, Timestamp, TokenExchange, Transfer, TxHash,
};
use stableswap_ledger::Repository;
use std::sync::Arc;
use tempfile::TempDir;

pub fn pool_addr() -> Address {
    Address::new([0x35; 20])
}

/// 2^256 - 1, the largest value a uint256 event field can carry.
pub const U256_MAX: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

pub fn addr(n: u8) -> Address {
    Address::new([n; 20])
}

pub fn dec(s: &str) -> Decimal {
    s.parse::<Decimal>().unwrap()
}

/// Event coordinates for log `log_index` of transaction `tx`, mined in `block`.
pub fn meta(tx: u8, block: u64, log_index: u32) -> EventMeta {
    meta_in(pool_addr(), tx, block, log_index)
}

/// Same as [`meta`] for a log emitted by `pool`.
pub fn meta_in(pool: Address, tx: u8, block: u64, log_index: u32) -> EventMeta {
    EventMeta::new(
        TxHash::new([tx; 32]),
        log_index,
        block,
        Timestamp::new(1_700_000_000 + block as i64 * 12),
        pool,
    )
}

pub fn transfer(meta: EventMeta, sender: Address, receiver: Address, value: &str) -> PoolEvent {
    PoolEvent::new(
        meta,
        EventKind::Transfer(Transfer {
            sender,
            receiver,
            value: dec(value),
        }),
    )
}

pub fn mint(meta: EventMeta, to: Address, value: &str) -> PoolEvent {
    transfer(meta, Address::ZERO, to, value)
}

pub fn burn(meta: EventMeta, from: Address, value: &str) -> PoolEvent {
    transfer(meta, from, Address::ZERO, value)
}

pub fn exchange(
    meta: EventMeta,
    buyer: Address,
    sold_id: AssetIndex,
    tokens_sold: &str,
    tokens_bought: &str,
) -> PoolEvent {
    PoolEvent::new(
        meta,
        EventKind::TokenExchange(TokenExchange {
            buyer,
            sold_id,
            tokens_sold: dec(tokens_sold),
            bought_id: sold_id.other(),
            tokens_bought: dec(tokens_bought),
        }),
    )
}

fn change(provider: Address, amounts: [&str; 2], supply: &str) -> LiquidityChange {
    LiquidityChange {
        provider,
        token_amounts: [dec(amounts[0]), dec(amounts[1])],
        fees: [Decimal::zero(), Decimal::zero()],
        invariant: None,
        token_supply: dec(supply),
    }
}

pub fn add_liquidity(meta: EventMeta, provider: Address, amounts: [&str; 2], supply: &str) -> PoolEvent {
    PoolEvent::new(meta, EventKind::AddLiquidity(change(provider, amounts, supply)))
}

pub fn remove_liquidity(
    meta: EventMeta,
    provider: Address,
    amounts: [&str; 2],
    supply: &str,
) -> PoolEvent {
    PoolEvent::new(meta, EventKind::RemoveLiquidity(change(provider, amounts, supply)))
}

pub fn remove_one(
    meta: EventMeta,
    provider: Address,
    token_id: AssetIndex,
    token_amount: &str,
    coin_amount: &str,
    supply: &str,
) -> PoolEvent {
    PoolEvent::new(
        meta,
        EventKind::RemoveLiquidityOne(RemoveLiquidityOne {
            provider,
            token_id,
            token_amount: dec(token_amount),
            coin_amount: dec(coin_amount),
            token_supply: dec(supply),
        }),
    )
}

pub fn approval(meta: EventMeta, owner: Address, spender: Address) -> PoolEvent {
    PoolEvent::new(
        meta,
        EventKind::Approval(Approval {
            owner,
            spender,
            value: dec("1000"),
        }),
    )
}

/// Mint `supply` LP to `provider` and seed the pool with the given reserves, in one transaction.
pub fn seed_pool(tx: u8, block: u64, provider: Address, reserves: [&str; 2], supply: &str) -> Vec<PoolEvent> {
    vec![
        mint(meta(tx, block, 0), provider, supply),
        add_liquidity(meta(tx, block, 1), provider, reserves, supply),
    ]
}

pub async fn setup_repo() -> (Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    (Arc::new(Repository::new(pool)), temp_dir)
}
