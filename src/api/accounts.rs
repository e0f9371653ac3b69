use crate::api::pools::parse_address;
use crate::api::AppState;
use crate::domain::{Account, AccountSnapshot};
use crate::error::AppError;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountQuery {
    pub at_block: Option<u64>,
}

/// Current state, or the state as of `atBlock` when that parameter is given.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub pool: String,
    pub lp_balance: String,
    pub share_of_pool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of_block: Option<u64>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            pool: account.pool.to_string(),
            lp_balance: account.lp_balance.to_canonical_string(),
            share_of_pool: account.share_of_pool.to_canonical_string(),
            last_activity: Some(account.last_activity.as_secs()),
            tx_count: Some(account.tx_count),
            as_of_block: None,
        }
    }
}

impl From<&AccountSnapshot> for AccountResponse {
    fn from(snapshot: &AccountSnapshot) -> Self {
        Self {
            id: snapshot.account.to_string(),
            pool: snapshot.pool.to_string(),
            lp_balance: snapshot.lp_balance.to_canonical_string(),
            share_of_pool: snapshot.share_of_pool.to_canonical_string(),
            last_activity: None,
            tx_count: None,
            as_of_block: Some(snapshot.position.block_number),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshotsResponse {
    pub snapshots: Vec<AccountSnapshotDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshotDto {
    pub block_number: u64,
    pub log_index: u32,
    pub tx_hash: String,
    pub timestamp: i64,
    pub pool: String,
    pub lp_balance: String,
    pub share_of_pool: String,
}

impl From<&AccountSnapshot> for AccountSnapshotDto {
    fn from(s: &AccountSnapshot) -> Self {
        Self {
            block_number: s.position.block_number,
            log_index: s.position.log_index,
            tx_hash: s.tx_hash.to_string(),
            timestamp: s.timestamp.as_secs(),
            pool: s.pool.to_string(),
            lp_balance: s.lp_balance.to_canonical_string(),
            share_of_pool: s.share_of_pool.to_canonical_string(),
        }
    }
}

pub async fn get_account(
    Path(address): Path<String>,
    Query(params): Query<AccountQuery>,
    State(state): State<AppState>,
) -> Result<Json<AccountResponse>, AppError> {
    let id = parse_address(&address)?;

    let response = match params.at_block {
        Some(block) => state
            .repo
            .account_snapshot_at_or_before(&id, block)
            .await?
            .map(|s| AccountResponse::from(&s)),
        None => state
            .repo
            .load_account(&id)
            .await?
            .map(|a| AccountResponse::from(&a)),
    };

    response
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("account {}", id)))
}

pub async fn get_account_snapshots(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AccountSnapshotsResponse>, AppError> {
    let id = parse_address(&address)?;
    let snapshots = state.repo.query_account_snapshots(&id).await?;

    Ok(Json(AccountSnapshotsResponse {
        snapshots: snapshots.iter().map(AccountSnapshotDto::from).collect(),
    }))
}
