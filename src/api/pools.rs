use crate::api::{AppState, BlockRangeQuery};
use crate::domain::{Account, Address, Pool, PoolSnapshot, PoolTransaction};
use crate::error::AppError;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolResponse {
    pub pool: PoolDto,
    /// Liquidity providers, largest balance first.
    pub accounts: Vec<ProviderDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDto {
    pub id: String,
    pub reserve_a: String,
    pub reserve_b: String,
    pub total_supply: String,
    pub cumulative_volume: String,
    pub liquidity_added_a: String,
    pub liquidity_added_b: String,
    pub liquidity_removed_a: String,
    pub liquidity_removed_b: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Pool> for PoolDto {
    fn from(pool: &Pool) -> Self {
        Self {
            id: pool.id.to_string(),
            reserve_a: pool.reserves[0].to_canonical_string(),
            reserve_b: pool.reserves[1].to_canonical_string(),
            total_supply: pool.total_supply.to_canonical_string(),
            cumulative_volume: pool.cumulative_volume.to_canonical_string(),
            liquidity_added_a: pool.liquidity_added[0].to_canonical_string(),
            liquidity_added_b: pool.liquidity_added[1].to_canonical_string(),
            liquidity_removed_a: pool.liquidity_removed[0].to_canonical_string(),
            liquidity_removed_b: pool.liquidity_removed[1].to_canonical_string(),
            created_at: pool.created_at.as_secs(),
            updated_at: pool.updated_at.as_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDto {
    pub account: String,
    pub lp_balance: String,
    pub share_of_pool: String,
}

impl From<&Account> for ProviderDto {
    fn from(account: &Account) -> Self {
        Self {
            account: account.id.to_string(),
            lp_balance: account.lp_balance.to_canonical_string(),
            share_of_pool: account.share_of_pool.to_canonical_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshotsResponse {
    pub snapshots: Vec<PoolSnapshotDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshotDto {
    pub block_number: u64,
    pub log_index: u32,
    pub tx_hash: String,
    pub timestamp: i64,
    pub reserve_a: String,
    pub reserve_b: String,
    pub total_supply: String,
    pub cumulative_volume: String,
}

impl From<&PoolSnapshot> for PoolSnapshotDto {
    fn from(s: &PoolSnapshot) -> Self {
        Self {
            block_number: s.position.block_number,
            log_index: s.position.log_index,
            tx_hash: s.tx_hash.to_string(),
            timestamp: s.timestamp.as_secs(),
            reserve_a: s.reserves[0].to_canonical_string(),
            reserve_b: s.reserves[1].to_canonical_string(),
            total_supply: s.total_supply.to_canonical_string(),
            cumulative_volume: s.cumulative_volume.to_canonical_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolTransactionsResponse {
    pub transactions: Vec<PoolTransactionDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolTransactionDto {
    pub id: String,
    pub account: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sold_asset: Option<u64>,
    pub amount_a: String,
    pub amount_b: String,
    pub block_number: u64,
    pub log_index: u32,
    pub tx_hash: String,
    pub timestamp: i64,
}

impl From<&PoolTransaction> for PoolTransactionDto {
    fn from(t: &PoolTransaction) -> Self {
        Self {
            id: t.id.to_string(),
            account: t.account.to_string(),
            kind: t.kind.as_str().to_string(),
            sold_asset: t.sold_asset.map(u64::from),
            amount_a: t.amounts[0].to_canonical_string(),
            amount_b: t.amounts[1].to_canonical_string(),
            block_number: t.position.block_number,
            log_index: t.position.log_index,
            tx_hash: t.tx_hash.to_string(),
            timestamp: t.timestamp.as_secs(),
        }
    }
}

pub(crate) fn parse_address(input: &str) -> Result<Address, AppError> {
    Address::from_str(input).map_err(|_| AppError::BadRequest("Invalid address".into()))
}

pub async fn get_pool(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PoolResponse>, AppError> {
    let id = parse_address(&address)?;
    let pool = state
        .repo
        .load_pool(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pool {}", id)))?;
    let accounts = state.repo.list_pool_accounts(&id).await?;

    Ok(Json(PoolResponse {
        pool: PoolDto::from(&pool),
        accounts: accounts.iter().map(ProviderDto::from).collect(),
    }))
}

pub async fn get_pool_snapshots(
    Path(address): Path<String>,
    Query(params): Query<BlockRangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<PoolSnapshotsResponse>, AppError> {
    let id = parse_address(&address)?;
    let (from_block, to_block) = params.validate()?;
    let snapshots = state
        .repo
        .query_pool_snapshots(&id, from_block, to_block)
        .await?;

    Ok(Json(PoolSnapshotsResponse {
        snapshots: snapshots.iter().map(PoolSnapshotDto::from).collect(),
    }))
}

pub async fn get_pool_transactions(
    Path(address): Path<String>,
    Query(params): Query<BlockRangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<PoolTransactionsResponse>, AppError> {
    let id = parse_address(&address)?;
    let (from_block, to_block) = params.validate()?;
    let transactions = state
        .repo
        .query_pool_transactions(&id, from_block, to_block)
        .await?;

    Ok(Json(PoolTransactionsResponse {
        transactions: transactions.iter().map(PoolTransactionDto::from).collect(),
    }))
}
