//! Postgres-backed store: snapshot rows guarded by an optimistic version
//! column, ledger rows appended in the same transaction.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ScoreStore;
use crate::models::{ScoreError, ScoreHistoryEntry, ScoreResult, ScoreSnapshot};

pub struct PostgresScoreStore {
    pool: PgPool,
}

impl PostgresScoreStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreStore for PostgresScoreStore {
    async fn fetch_snapshot(&self, user_id: Uuid) -> ScoreResult<Option<ScoreSnapshot>> {
        sqlx::query_as::<_, ScoreSnapshot>("SELECT * FROM score_snapshots WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ScoreError::Store(e.to_string()))
    }

    async fn insert_snapshot_if_absent(&self, snapshot: &ScoreSnapshot) -> ScoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO score_snapshots
                (user_id, completion_score, verification_score, community_score,
                 reliability_score, overall_score, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(snapshot.user_id)
        .bind(snapshot.completion_score)
        .bind(snapshot.verification_score)
        .bind(snapshot.community_score)
        .bind(snapshot.reliability_score)
        .bind(snapshot.overall_score)
        .bind(snapshot.version)
        .bind(snapshot.created_at)
        .bind(snapshot.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ScoreError::Store(e.to_string()))?;

        Ok(())
    }

    async fn commit_event(
        &self,
        snapshot: &ScoreSnapshot,
        expected_version: i64,
        entry: &ScoreHistoryEntry,
    ) -> ScoreResult<ScoreHistoryEntry> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ScoreError::Store(e.to_string()))?;

        let updated = sqlx::query(
            r#"
            UPDATE score_snapshots
            SET completion_score = $1,
                verification_score = $2,
                community_score = $3,
                reliability_score = $4,
                overall_score = $5,
                version = $6,
                updated_at = $7
            WHERE user_id = $8 AND version = $9
            "#,
        )
        .bind(snapshot.completion_score)
        .bind(snapshot.verification_score)
        .bind(snapshot.community_score)
        .bind(snapshot.reliability_score)
        .bind(snapshot.overall_score)
        .bind(snapshot.version)
        .bind(snapshot.updated_at)
        .bind(snapshot.user_id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await
        .map_err(|e| ScoreError::Store(e.to_string()))?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back; a concurrent writer
            // moved the version.
            return Err(ScoreError::ConcurrentConflict);
        }

        let stored = sqlx::query_as::<_, ScoreHistoryEntry>(
            r#"
            INSERT INTO score_history
                (id, user_id, event_type, point_change, component,
                 new_component_score, new_score, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, sequence, user_id, event_type, point_change, component,
                      new_component_score, new_score, description, created_at
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.event_type)
        .bind(entry.point_change)
        .bind(entry.component)
        .bind(entry.new_component_score)
        .bind(entry.new_score)
        .bind(&entry.description)
        .bind(entry.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ScoreError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| ScoreError::Store(e.to_string()))?;

        Ok(stored)
    }

    async fn replace_snapshot(
        &self,
        snapshot: &ScoreSnapshot,
        expected_version: i64,
    ) -> ScoreResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE score_snapshots
            SET completion_score = $1,
                verification_score = $2,
                community_score = $3,
                reliability_score = $4,
                overall_score = $5,
                version = $6,
                updated_at = $7
            WHERE user_id = $8 AND version = $9
            "#,
        )
        .bind(snapshot.completion_score)
        .bind(snapshot.verification_score)
        .bind(snapshot.community_score)
        .bind(snapshot.reliability_score)
        .bind(snapshot.overall_score)
        .bind(snapshot.version)
        .bind(snapshot.updated_at)
        .bind(snapshot.user_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| ScoreError::Store(e.to_string()))?;

        if updated.rows_affected() == 0 {
            return Err(ScoreError::ConcurrentConflict);
        }

        Ok(())
    }

    async fn fetch_history_page(
        &self,
        user_id: Uuid,
        cursor: Option<i64>,
        limit: i64,
    ) -> ScoreResult<Vec<ScoreHistoryEntry>> {
        let entries = match cursor {
            Some(cursor) => {
                sqlx::query_as::<_, ScoreHistoryEntry>(
                    r#"
                    SELECT * FROM score_history
                    WHERE user_id = $1 AND sequence < $2
                    ORDER BY sequence DESC
                    LIMIT $3
                    "#,
                )
                .bind(user_id)
                .bind(cursor)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ScoreHistoryEntry>(
                    r#"
                    SELECT * FROM score_history
                    WHERE user_id = $1
                    ORDER BY sequence DESC
                    LIMIT $2
                    "#,
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        };

        entries.map_err(|e| ScoreError::Store(e.to_string()))
    }

    async fn fetch_full_history(&self, user_id: Uuid) -> ScoreResult<Vec<ScoreHistoryEntry>> {
        sqlx::query_as::<_, ScoreHistoryEntry>(
            "SELECT * FROM score_history WHERE user_id = $1 ORDER BY sequence ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ScoreError::Store(e.to_string()))
    }

    async fn fetch_overall_scores(&self) -> ScoreResult<Vec<i32>> {
        sqlx::query_scalar::<_, i32>("SELECT overall_score FROM score_snapshots")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ScoreError::Store(e.to_string()))
    }

    async fn fetch_recent_user_ids(&self, limit: i64) -> ScoreResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM score_snapshots ORDER BY updated_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ScoreError::Store(e.to_string()))
    }
}
