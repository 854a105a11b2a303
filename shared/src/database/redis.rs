/// Redis utilities and helpers for caching
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use serde::{Deserialize, Serialize};

/// Redis connection wrapper with common cache operations
#[derive(Clone)]
pub struct RedisClient {
    connection: ConnectionManager,
}

impl RedisClient {
    /// Create a new Redis client from an existing connection manager
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Open a managed connection to the given Redis URL
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }

    /// Set a serialized value with expiration
    pub async fn set_with_expiry<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        expiry_seconds: u64,
    ) -> Result<(), RedisError> {
        let serialized = serde_json::to_string(value).map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "Serialization failed",
                e.to_string(),
            ))
        })?;

        self.connection
            .set_ex(key, serialized, expiry_seconds)
            .await
    }

    /// Get and deserialize a value
    pub async fn get<T: for<'de> Deserialize<'de>>(
        &mut self,
        key: &str,
    ) -> Result<Option<T>, RedisError> {
        let value: Option<String> = self.connection.get(key).await?;

        match value {
            Some(v) => {
                let deserialized = serde_json::from_str(&v).map_err(|e| {
                    RedisError::from((
                        redis::ErrorKind::TypeError,
                        "Deserialization failed",
                        e.to_string(),
                    ))
                })?;
                Ok(Some(deserialized))
            }
            None => Ok(None),
        }
    }

    /// Delete a key
    pub async fn delete(&mut self, key: &str) -> Result<bool, RedisError> {
        let result: i32 = self.connection.del(key).await?;
        Ok(result > 0)
    }

    /// Check if a key exists
    pub async fn exists(&mut self, key: &str) -> Result<bool, RedisError> {
        let result: bool = self.connection.exists(key).await?;
        Ok(result)
    }
}

/// Cache key builder for consistent key naming
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    pub fn score_snapshot(user_id: &str) -> String {
        format!("score:snapshot:{}", user_id)
    }

    pub fn score_stats() -> String {
        "score:stats".to_string()
    }

    pub fn rate_limit(user_id: &str, endpoint: &str) -> String {
        format!("ratelimit:{}:{}", user_id, endpoint)
    }
}

/// Common TTL values in seconds
pub mod ttl {
    pub const MINUTE: u64 = 60;
    pub const HOUR: u64 = 3600;
    pub const DAY: u64 = 86400;

    pub const SNAPSHOT: u64 = 5 * MINUTE;
    pub const STATS: u64 = MINUTE;
}
