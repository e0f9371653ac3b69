pub mod accounts;
pub mod audit;
pub mod health;
pub mod pools;

use crate::db::Repository;
use crate::error::AppError;
use axum::{routing::get, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/pools/:address", get(pools::get_pool))
        .route("/v1/pools/:address/snapshots", get(pools::get_pool_snapshots))
        .route(
            "/v1/pools/:address/transactions",
            get(pools::get_pool_transactions),
        )
        .route("/v1/accounts/:address", get(accounts::get_account))
        .route(
            "/v1/accounts/:address/snapshots",
            get(accounts::get_account_snapshots),
        )
        .route("/v1/audit/:tx_hash", get(audit::get_audit_entries))
        .layer(cors)
        .with_state(state)
}

/// Inclusive block window shared by the history endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRangeQuery {
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

impl BlockRangeQuery {
    pub(crate) fn validate(&self) -> Result<(Option<u64>, Option<u64>), AppError> {
        if let (Some(from), Some(to)) = (self.from_block, self.to_block) {
            if from > to {
                return Err(AppError::BadRequest(
                    "fromBlock must not exceed toBlock".to_string(),
                ));
            }
        }
        Ok((self.from_block, self.to_block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_range_validation() {
        let open = BlockRangeQuery::default();
        assert_eq!(open.validate().unwrap(), (None, None));

        let inverted = BlockRangeQuery {
            from_block: Some(10),
            to_block: Some(5),
        };
        assert!(matches!(inverted.validate(), Err(AppError::BadRequest(_))));
    }
}
