/// PostgreSQL pool construction and maintenance helpers
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use super::{DatabaseConfig, DatabaseError, DatabaseResult};

/// Build a connection pool from configuration.
pub async fn create_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(DatabaseError::Connection)
}

/// Round-trip connectivity check, used by service health endpoints.
pub async fn health_check(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(DatabaseError::Connection)?;

    Ok(())
}
