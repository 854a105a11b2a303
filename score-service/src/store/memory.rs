//! In-memory store with the same compare-and-swap semantics as the Postgres
//! implementation. Test double for service-level and concurrency tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::ScoreStore;
use crate::models::{ScoreError, ScoreHistoryEntry, ScoreResult, ScoreSnapshot};

#[derive(Default)]
struct MemoryInner {
    snapshots: HashMap<Uuid, ScoreSnapshot>,
    history: Vec<ScoreHistoryEntry>,
    next_sequence: i64,
}

pub struct MemoryScoreStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                next_sequence: 1,
                ..Default::default()
            }),
        }
    }
}

impl Default for MemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn fetch_snapshot(&self, user_id: Uuid) -> ScoreResult<Option<ScoreSnapshot>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.snapshots.get(&user_id).cloned())
    }

    async fn insert_snapshot_if_absent(&self, snapshot: &ScoreSnapshot) -> ScoreResult<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner
            .snapshots
            .entry(snapshot.user_id)
            .or_insert_with(|| snapshot.clone());
        Ok(())
    }

    async fn commit_event(
        &self,
        snapshot: &ScoreSnapshot,
        expected_version: i64,
        entry: &ScoreHistoryEntry,
    ) -> ScoreResult<ScoreHistoryEntry> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");

        let current = inner
            .snapshots
            .get(&snapshot.user_id)
            .ok_or_else(|| ScoreError::NotFound(snapshot.user_id.to_string()))?;
        if current.version != expected_version {
            return Err(ScoreError::ConcurrentConflict);
        }

        let mut stored = entry.clone();
        stored.sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.snapshots.insert(snapshot.user_id, snapshot.clone());
        inner.history.push(stored.clone());

        Ok(stored)
    }

    async fn replace_snapshot(
        &self,
        snapshot: &ScoreSnapshot,
        expected_version: i64,
    ) -> ScoreResult<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");

        let current = inner
            .snapshots
            .get(&snapshot.user_id)
            .ok_or_else(|| ScoreError::NotFound(snapshot.user_id.to_string()))?;
        if current.version != expected_version {
            return Err(ScoreError::ConcurrentConflict);
        }

        inner.snapshots.insert(snapshot.user_id, snapshot.clone());
        Ok(())
    }

    async fn fetch_history_page(
        &self,
        user_id: Uuid,
        cursor: Option<i64>,
        limit: i64,
    ) -> ScoreResult<Vec<ScoreHistoryEntry>> {
        let inner = self.inner.lock().expect("store mutex poisoned");

        let mut entries: Vec<ScoreHistoryEntry> = inner
            .history
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| cursor.map_or(true, |c| e.sequence < c))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        entries.truncate(limit as usize);

        Ok(entries)
    }

    async fn fetch_full_history(&self, user_id: Uuid) -> ScoreResult<Vec<ScoreHistoryEntry>> {
        let inner = self.inner.lock().expect("store mutex poisoned");

        let mut entries: Vec<ScoreHistoryEntry> = inner
            .history
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.sequence);

        Ok(entries)
    }

    async fn fetch_overall_scores(&self) -> ScoreResult<Vec<i32>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.snapshots.values().map(|s| s.overall_score).collect())
    }

    async fn fetch_recent_user_ids(&self, limit: i64) -> ScoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().expect("store mutex poisoned");

        let mut snapshots: Vec<&ScoreSnapshot> = inner.snapshots.values().collect();
        snapshots.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(snapshots
            .iter()
            .take(limit as usize)
            .map(|s| s.user_id)
            .collect())
    }
}
