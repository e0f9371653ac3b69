use crate::api::AppState;
use crate::error::AppError;
use axum::extract::State;
use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the database answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.repo.ping().await?;
    let processed = state.repo.processed_count().await?;
    let watermark = state.repo.watermark().await?;
    Ok(Json(serde_json::json!({
        "status": "ready",
        "processedEvents": processed,
        "watermark": watermark,
    })))
}
