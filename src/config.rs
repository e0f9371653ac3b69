use crate::engine::ZeroSupplyPolicy;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// JSONL event file to ingest at startup, if any.
    pub events_path: Option<String>,
    pub zero_supply_policy: ZeroSupplyPolicy,
    pub ingest_batch_size: usize,
    pub retry_max_elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let events_path = env_map
            .get("EVENTS_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let zero_supply_policy = env_map
            .get("ZERO_SUPPLY_POLICY")
            .map(|s| s.as_str())
            .unwrap_or("report")
            .parse::<ZeroSupplyPolicy>()
            .map_err(|msg| ConfigError::InvalidValue("ZERO_SUPPLY_POLICY".to_string(), msg))?;

        let ingest_batch_size = env_map
            .get("INGEST_BATCH_SIZE")
            .map(|s| s.as_str())
            .unwrap_or("500")
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "INGEST_BATCH_SIZE".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let retry_max_elapsed_ms = env_map
            .get("RETRY_MAX_ELAPSED_MS")
            .map(|s| s.as_str())
            .unwrap_or("30000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "RETRY_MAX_ELAPSED_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_path,
            events_path,
            zero_supply_policy,
            ingest_batch_size,
            retry_max_elapsed: Duration::from_millis(retry_max_elapsed_ms),
        })
    }
}
