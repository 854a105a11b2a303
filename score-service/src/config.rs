use anyhow::Result;
use serde::{Deserialize, Serialize};

use shared::database::DatabaseConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub score: ScoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub cache_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// How many times a conflicting apply is retried before surfacing.
    pub conflict_retry_limit: u32,
    /// Base backoff between conflict retries; grows linearly per attempt.
    pub conflict_backoff_ms: u64,
    pub history_page_size: i64,
    pub audit_interval_secs: u64,
    pub audit_batch_size: i64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            conflict_retry_limit: 5,
            conflict_backoff_ms: 25,
            history_page_size: 50,
            audit_interval_secs: 300,
            audit_batch_size: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8087".to_string())
                    .parse()?,
                log_json: std::env::var("LOG_JSON")
                    .map(|v| v == "true")
                    .unwrap_or(false),
            },
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                cache_enabled: std::env::var("REDIS_CACHE_ENABLED")
                    .map(|v| v != "false")
                    .unwrap_or(true),
            },
            score: ScoreConfig {
                conflict_retry_limit: std::env::var("SCORE_CONFLICT_RETRY_LIMIT")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                conflict_backoff_ms: std::env::var("SCORE_CONFLICT_BACKOFF_MS")
                    .unwrap_or_else(|_| "25".to_string())
                    .parse()?,
                history_page_size: std::env::var("SCORE_HISTORY_PAGE_SIZE")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()?,
                audit_interval_secs: std::env::var("SCORE_AUDIT_INTERVAL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()?,
                audit_batch_size: std::env::var("SCORE_AUDIT_BATCH_SIZE")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()?,
            },
        })
    }
}
