//! Durable storage seam for snapshots and the score ledger.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ScoreHistoryEntry, ScoreResult, ScoreSnapshot};

/// Store contract: one snapshot row per user plus the append-only ledger.
///
/// `commit_event` must persist the updated snapshot and the new ledger entry
/// as one atomic unit, guarded by the snapshot version the caller read. A
/// version mismatch yields `ScoreError::ConcurrentConflict` and leaves the
/// store untouched.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn fetch_snapshot(&self, user_id: Uuid) -> ScoreResult<Option<ScoreSnapshot>>;

    /// Insert the default snapshot unless the user already has one. Safe to
    /// race: losers are a no-op.
    async fn insert_snapshot_if_absent(&self, snapshot: &ScoreSnapshot) -> ScoreResult<()>;

    /// Atomically write the snapshot (expecting `expected_version` in the
    /// store) and append the ledger entry. Returns the stored entry with its
    /// assigned sequence number.
    async fn commit_event(
        &self,
        snapshot: &ScoreSnapshot,
        expected_version: i64,
        entry: &ScoreHistoryEntry,
    ) -> ScoreResult<ScoreHistoryEntry>;

    /// Replace the snapshot without touching the ledger (recalculation).
    async fn replace_snapshot(
        &self,
        snapshot: &ScoreSnapshot,
        expected_version: i64,
    ) -> ScoreResult<()>;

    /// Ledger page for one user, newest first, keyed by sequence number.
    async fn fetch_history_page(
        &self,
        user_id: Uuid,
        cursor: Option<i64>,
        limit: i64,
    ) -> ScoreResult<Vec<ScoreHistoryEntry>>;

    /// Full ledger for one user, oldest first (replay order).
    async fn fetch_full_history(&self, user_id: Uuid) -> ScoreResult<Vec<ScoreHistoryEntry>>;

    /// Every user's overall score (analytics).
    async fn fetch_overall_scores(&self) -> ScoreResult<Vec<i32>>;

    /// Users whose snapshots changed most recently (audit).
    async fn fetch_recent_user_ids(&self, limit: i64) -> ScoreResult<Vec<Uuid>>;
}
