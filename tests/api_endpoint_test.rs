mod common;

use axum::http::StatusCode;
use common::*;
use stableswap_ledger::api;
use stableswap_ledger::domain::AssetIndex;
use stableswap_ledger::engine::ZeroSupplyPolicy;
use stableswap_ledger::{Ledger, Repository};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    _repo: Arc<Repository>,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let (repo, temp) = setup_repo().await;

    let mut events = seed_pool(1, 100, addr(1), ["1000", "1000"], "1000");
    events.push(exchange(meta(2, 101, 0), addr(2), AssetIndex::A, "100", "99"));
    events.push(transfer(meta(3, 102, 0), addr(1), addr(3), "250"));
    events.push(approval(meta(3, 102, 1), addr(3), addr(2)));

    let mut ledger = Ledger::new(repo.clone(), ZeroSupplyPolicy::Report);
    for event in &events {
        ledger.apply(event).await.unwrap();
    }

    let app = api::create_router(api::AppState::new(repo.clone()));
    TestApp {
        app,
        _repo: repo,
        _temp: temp,
    }
}

async fn request(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_ready_reports_watermark() {
    let test_app = setup_test_app().await;
    let (status, body) = request(test_app.app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processedEvents"], 5);
    assert_eq!(body["watermark"]["blockNumber"], 102);
    assert_eq!(body["watermark"]["logIndex"], 1);
}

#[tokio::test]
async fn test_get_pool_renders_amounts_as_strings() {
    let test_app = setup_test_app().await;
    let uri = format!("/v1/pools/{}", pool_addr());
    let (status, body) = request(test_app.app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pool"]["reserveA"], "1100");
    assert_eq!(body["pool"]["reserveB"], "901");
    assert_eq!(body["pool"]["cumulativeVolume"], "199");
    assert_eq!(body["pool"]["totalSupply"], "1000");

    let accounts = body["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 3);
    assert_eq!(accounts[0]["account"], addr(1).to_string());
    assert_eq!(accounts[0]["lpBalance"], "750");
    assert_eq!(accounts[0]["shareOfPool"], "0.75");
}

#[tokio::test]
async fn test_unknown_pool_is_not_found() {
    let test_app = setup_test_app().await;
    let uri = format!("/v1/pools/{}", addr(0x77));
    let (status, body) = request(test_app.app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_malformed_address_is_bad_request() {
    let test_app = setup_test_app().await;
    let (status, _) = request(test_app.app, "/v1/accounts/0xnothex").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pool_snapshots_respect_block_window() {
    let test_app = setup_test_app().await;

    let uri = format!("/v1/pools/{}/snapshots", pool_addr());
    let (status, body) = request(test_app.app.clone(), &uri).await;
    assert_eq!(status, StatusCode::OK);
    // Swap and add-liquidity each snapshot the pool.
    assert_eq!(body["snapshots"].as_array().unwrap().len(), 2);

    let uri = format!("/v1/pools/{}/snapshots?fromBlock=101&toBlock=101", pool_addr());
    let (_, body) = request(test_app.app.clone(), &uri).await;
    let snapshots = body["snapshots"].as_array().unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0]["reserveB"], "901");

    let uri = format!("/v1/pools/{}/snapshots?fromBlock=200&toBlock=100", pool_addr());
    let (status, _) = request(test_app.app, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pool_transactions_list_operations() {
    let test_app = setup_test_app().await;
    let uri = format!("/v1/pools/{}/transactions", pool_addr());
    let (status, body) = request(test_app.app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let txs = body["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0]["kind"], "add_liquidity");
    assert!(txs[0].get("soldAsset").is_none());
    assert_eq!(txs[1]["kind"], "swap");
    assert_eq!(txs[1]["soldAsset"], 0);
    assert_eq!(txs[1]["amountA"], "100");
    assert_eq!(txs[1]["amountB"], "99");
}

#[tokio::test]
async fn test_account_current_and_at_block() {
    let test_app = setup_test_app().await;

    let uri = format!("/v1/accounts/{}", addr(3));
    let (status, body) = request(test_app.app.clone(), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lpBalance"], "250");
    assert_eq!(body["shareOfPool"], "0.25");
    assert!(body.get("asOfBlock").is_none());

    let uri = format!("/v1/accounts/{}?atBlock=101", addr(1));
    let (status, body) = request(test_app.app.clone(), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lpBalance"], "1000");
    assert_eq!(body["asOfBlock"], 100);

    let uri = format!("/v1/accounts/{}?atBlock=50", addr(1));
    let (status, _) = request(test_app.app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_account_snapshots_in_order() {
    let test_app = setup_test_app().await;
    let uri = format!("/v1/accounts/{}/snapshots", addr(1));
    let (status, body) = request(test_app.app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let balances: Vec<&str> = body["snapshots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["lpBalance"].as_str().unwrap())
        .collect();
    assert_eq!(balances, vec!["1000", "1000", "750"]);
}

#[tokio::test]
async fn test_audit_entries_for_transaction() {
    let test_app = setup_test_app().await;
    let tx = stableswap_ledger::TxHash::new([3; 32]);
    let uri = format!("/v1/audit/{}", tx);
    let (status, body) = request(test_app.app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["event"], "Transfer");
    assert_eq!(entries[0]["params"]["value"], "250");
    assert_eq!(entries[1]["event"], "Approval");
}
