use crate::api::AppState;
use crate::domain::{AuditEntry, TxHash};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub entries: Vec<AuditEntryDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryDto {
    pub id: String,
    pub event: String,
    pub log_index: u32,
    pub block_number: u64,
    pub block_timestamp: i64,
    pub contract_address: String,
    /// Raw parameters exactly as they were stored.
    pub params: serde_json::Value,
}

impl From<&AuditEntry> for AuditEntryDto {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            event: entry.event.clone(),
            log_index: entry.meta.log_index,
            block_number: entry.meta.block_number,
            block_timestamp: entry.meta.block_timestamp.as_secs(),
            contract_address: entry.meta.contract_address.to_string(),
            params: serde_json::from_str(&entry.params)
                .unwrap_or_else(|_| serde_json::Value::String(entry.params.clone())),
        }
    }
}

/// Every audit entry recorded for one transaction, in log order.
pub async fn get_audit_entries(
    Path(tx_hash): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AuditResponse>, AppError> {
    let tx_hash = TxHash::from_str(&tx_hash)?;
    let entries = state.repo.query_audit_entries(&tx_hash).await?;

    Ok(Json(AuditResponse {
        entries: entries.iter().map(AuditEntryDto::from).collect(),
    }))
}
