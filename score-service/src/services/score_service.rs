use std::sync::Arc;

use chrono::Utc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use shared::database::redis::{ttl, CacheKeyBuilder, RedisClient};
use shared::types::CursorPage;

use crate::analytics::stats::{self, ScoreStats};
use crate::catalog::{EventCatalog, RATING_EVENT_ID};
use crate::config::ScoreConfig;
use crate::models::{
    ApplyEventRequest, AuditReport, ScoreError, ScoreEventType, ScoreHistoryEntry, ScoreResult,
    ScoreSnapshot, SubmitRatingRequest,
};
use crate::scoring;
use crate::store::ScoreStore;

/// Stateless façade over the score store. All per-user state lives in the
/// store; the service owns only immutable configuration and the catalog, so
/// any number of instances can serve the same population.
pub struct ScoreService {
    config: ScoreConfig,
    catalog: Arc<EventCatalog>,
    store: Arc<dyn ScoreStore>,
    cache: Option<RedisClient>,
}

impl ScoreService {
    pub fn new(
        config: ScoreConfig,
        catalog: Arc<EventCatalog>,
        store: Arc<dyn ScoreStore>,
        cache: Option<RedisClient>,
    ) -> Self {
        Self {
            config,
            catalog,
            store,
            cache,
        }
    }

    // ============= Read Methods =============

    /// Current snapshot for a user, creating the all-zero default on first
    /// access.
    pub async fn get_score(&self, user_id: Uuid) -> ScoreResult<ScoreSnapshot> {
        if let Some(cached) = self.cached_snapshot(user_id).await {
            return Ok(cached);
        }

        let snapshot = self.load_or_create(user_id).await?;
        self.refresh_cache(&snapshot).await;
        Ok(snapshot)
    }

    /// Ledger page for a user, newest first. The cursor is the sequence
    /// number of the last entry on the previous page.
    pub async fn get_history(
        &self,
        user_id: Uuid,
        cursor: Option<i64>,
        limit: Option<i64>,
    ) -> ScoreResult<CursorPage<ScoreHistoryEntry>> {
        let limit = limit
            .unwrap_or(self.config.history_page_size)
            .clamp(1, self.config.history_page_size);

        let entries = self.store.fetch_history_page(user_id, cursor, limit).await?;
        let next_cursor = if (entries.len() as i64) < limit {
            None
        } else {
            entries.last().map(|e| e.sequence)
        };

        Ok(CursorPage {
            entries,
            next_cursor,
        })
    }

    // ============= Write Methods =============

    /// Apply one catalog event to a user's score.
    ///
    /// Rejects unknown event types before touching any state; on a version
    /// conflict the read-modify-write cycle is retried with linear backoff
    /// up to the configured limit.
    pub async fn apply_event(
        &self,
        user_id: Uuid,
        req: ApplyEventRequest,
    ) -> ScoreResult<ScoreHistoryEntry> {
        req.validate()
            .map_err(|e| ScoreError::Validation(format!("{}", e)))?;

        let event = self.catalog.lookup(&req.event_type_id)?.clone();
        let delta = req.magnitude_override.unwrap_or(event.base_points);

        self.apply(user_id, &event, delta).await
    }

    /// Apply a 1-5 star rating as a variable-magnitude community event.
    pub async fn apply_rating(
        &self,
        user_id: Uuid,
        req: SubmitRatingRequest,
    ) -> ScoreResult<ScoreHistoryEntry> {
        req.validate()
            .map_err(|e| ScoreError::Validation(format!("{}", e)))?;

        self.apply_event(
            user_id,
            ApplyEventRequest {
                event_type_id: RATING_EVENT_ID.to_string(),
                magnitude_override: Some(rating_points(req.stars)),
            },
        )
        .await
    }

    async fn apply(
        &self,
        user_id: Uuid,
        event: &ScoreEventType,
        delta: i32,
    ) -> ScoreResult<ScoreHistoryEntry> {
        let mut attempt = 0u32;

        loop {
            let current = self.load_or_create(user_id).await?;
            let (mut updated, applied) = scoring::apply_delta(&current, event.component, delta);
            updated.version = current.version + 1;
            updated.updated_at = Utc::now();

            let entry = ScoreHistoryEntry {
                id: Uuid::new_v4(),
                sequence: 0, // assigned by the store
                user_id,
                event_type: event.id.to_string(),
                point_change: applied,
                component: event.component,
                new_component_score: updated.component_score(event.component),
                new_score: updated.overall_score,
                description: describe(event, applied, delta),
                created_at: updated.updated_at,
            };

            match self.store.commit_event(&updated, current.version, &entry).await {
                Ok(stored) => {
                    debug!(
                        user_id = %user_id,
                        event = event.id,
                        points = applied,
                        new_score = updated.overall_score,
                        "score event applied"
                    );
                    self.refresh_cache(&updated).await;
                    return Ok(stored);
                }
                Err(ScoreError::ConcurrentConflict)
                    if attempt < self.config.conflict_retry_limit =>
                {
                    attempt += 1;
                    sleep(Duration::from_millis(
                        self.config.conflict_backoff_ms * u64::from(attempt),
                    ))
                    .await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    // ============= Maintenance Methods =============

    /// Rebuild a snapshot by replaying the user's full ledger.
    pub async fn recalculate(&self, user_id: Uuid) -> ScoreResult<ScoreSnapshot> {
        let current = self
            .store
            .fetch_snapshot(user_id)
            .await?
            .ok_or_else(|| ScoreError::NotFound(format!("no score snapshot for {}", user_id)))?;

        let mut replayed = self.replay(&current).await?;
        replayed.version = current.version + 1;
        replayed.updated_at = Utc::now();

        self.store.replace_snapshot(&replayed, current.version).await?;
        self.refresh_cache(&replayed).await;

        if replayed.overall_score != current.overall_score {
            info!(
                user_id = %user_id,
                before = current.overall_score,
                after = replayed.overall_score,
                "recalculation corrected a drifted snapshot"
            );
        }

        Ok(replayed)
    }

    /// Compare recently-updated snapshots against a fresh ledger replay.
    pub async fn audit(&self, limit: i64) -> ScoreResult<AuditReport> {
        let user_ids = self.store.fetch_recent_user_ids(limit).await?;
        let mut mismatched = Vec::new();

        for user_id in &user_ids {
            let live = match self.store.fetch_snapshot(*user_id).await? {
                Some(snapshot) => snapshot,
                None => continue,
            };
            let replayed = self.replay(&live).await?;

            if replayed.overall_score != live.overall_score
                || replayed.completion_score != live.completion_score
                || replayed.verification_score != live.verification_score
                || replayed.community_score != live.community_score
                || replayed.reliability_score != live.reliability_score
            {
                warn!(
                    user_id = %user_id,
                    live = live.overall_score,
                    replayed = replayed.overall_score,
                    "snapshot drifted from its ledger"
                );
                mismatched.push(*user_id);
            }
        }

        Ok(AuditReport {
            checked: user_ids.len(),
            mismatched,
        })
    }

    /// Population statistics over every user's overall score.
    pub async fn stats(&self) -> ScoreResult<ScoreStats> {
        if let Some(cache) = &self.cache {
            let mut cache = cache.clone();
            match cache.get::<ScoreStats>(&CacheKeyBuilder::score_stats()).await {
                Ok(Some(cached)) => return Ok(cached),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "stats cache read failed"),
            }
        }

        let scores = self.store.fetch_overall_scores().await?;
        let computed = stats::compute(&scores);

        if let Some(cache) = &self.cache {
            let mut cache = cache.clone();
            if let Err(err) = cache
                .set_with_expiry(&CacheKeyBuilder::score_stats(), &computed, ttl::STATS)
                .await
            {
                warn!(error = %err, "stats cache write failed");
            }
        }

        Ok(computed)
    }

    // ============= Internal Helpers =============

    /// Replay the user's full ledger into a fresh snapshot. Version and
    /// timestamps are carried over from the live snapshot so callers can
    /// compare or CAS-write the result.
    async fn replay(&self, current: &ScoreSnapshot) -> ScoreResult<ScoreSnapshot> {
        let history = self.store.fetch_full_history(current.user_id).await?;

        let mut snapshot = ScoreSnapshot::new(current.user_id, current.created_at);
        for entry in &history {
            let (next, _) = scoring::apply_delta(&snapshot, entry.component, entry.point_change);
            snapshot = next;
        }
        snapshot.version = current.version;
        snapshot.updated_at = current.updated_at;

        Ok(snapshot)
    }

    async fn load_or_create(&self, user_id: Uuid) -> ScoreResult<ScoreSnapshot> {
        if let Some(snapshot) = self.store.fetch_snapshot(user_id).await? {
            return Ok(snapshot);
        }

        let fresh = ScoreSnapshot::new(user_id, Utc::now());
        self.store.insert_snapshot_if_absent(&fresh).await?;

        // Re-read: a concurrent creator may have won the insert race.
        match self.store.fetch_snapshot(user_id).await? {
            Some(snapshot) => Ok(snapshot),
            None => Err(ScoreError::Store(
                "snapshot missing after insert".to_string(),
            )),
        }
    }

    async fn cached_snapshot(&self, user_id: Uuid) -> Option<ScoreSnapshot> {
        let mut cache = self.cache.clone()?;
        let key = CacheKeyBuilder::score_snapshot(&user_id.to_string());

        match cache.get::<ScoreSnapshot>(&key).await {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, "snapshot cache read failed");
                None
            }
        }
    }

    /// Best-effort: the cache mirrors committed state, Postgres stays the
    /// source of truth.
    async fn refresh_cache(&self, snapshot: &ScoreSnapshot) {
        let mut cache = match self.cache.clone() {
            Some(cache) => cache,
            None => return,
        };
        let key = CacheKeyBuilder::score_snapshot(&snapshot.user_id.to_string());

        if let Err(err) = cache.set_with_expiry(&key, snapshot, ttl::SNAPSHOT).await {
            warn!(error = %err, "snapshot cache write failed");
        }
    }
}

/// Point delta for a 1-5 star rating; 3 stars is neutral.
pub fn rating_points(stars: u8) -> i32 {
    (i32::from(stars) - 3) * 4
}

fn describe(event: &ScoreEventType, applied: i32, nominal: i32) -> String {
    if applied == nominal {
        event.display_name.to_string()
    } else {
        format!("{} (clamped from {:+})", event.display_name, nominal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::BadgeLevel;
    use crate::store::memory::MemoryScoreStore;
    use pretty_assertions::assert_eq;

    fn test_service() -> Arc<ScoreService> {
        let config = ScoreConfig {
            conflict_retry_limit: 64,
            conflict_backoff_ms: 1,
            history_page_size: 50,
            audit_interval_secs: 300,
            audit_batch_size: 100,
        };
        Arc::new(ScoreService::new(
            config,
            Arc::new(EventCatalog::builtin()),
            Arc::new(MemoryScoreStore::new()),
            None,
        ))
    }

    fn event_request(event_type_id: &str) -> ApplyEventRequest {
        ApplyEventRequest {
            event_type_id: event_type_id.to_string(),
            magnitude_override: None,
        }
    }

    #[tokio::test]
    async fn test_first_read_creates_default_snapshot() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let snapshot = service.get_score(user_id).await.unwrap();
        assert_eq!(snapshot.user_id, user_id);
        assert_eq!(snapshot.overall_score, 0);
        assert_eq!(snapshot.version, 0);
        assert_eq!(BadgeLevel::from_score(snapshot.overall_score), BadgeLevel::Newcomer);
    }

    #[tokio::test]
    async fn test_apply_event_result_matches_snapshot() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let entry = service
            .apply_event(user_id, event_request("swap_completed"))
            .await
            .unwrap();

        let snapshot = service.get_score(user_id).await.unwrap();
        assert_eq!(entry.new_score, snapshot.overall_score);
        assert_eq!(entry.new_component_score, snapshot.completion_score);
        assert_eq!(entry.point_change, 10);
        assert_eq!(snapshot.completion_score, 10);
        assert_eq!(snapshot.overall_score, 35);
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn test_unknown_event_type_mutates_nothing() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let err = service
            .apply_event(user_id, event_request("made_up_event"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScoreError::UnknownEventType(_)));

        let page = service.get_history(user_id, None, None).await.unwrap();
        assert!(page.entries.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_override_rejected() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let err = service
            .apply_event(
                user_id,
                ApplyEventRequest {
                    event_type_id: "swap_completed".to_string(),
                    magnitude_override: Some(500),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ScoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_clamped_delta_is_recorded() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        // Reliability starts at zero, so -15 truncates to a recorded zero.
        let entry = service
            .apply_event(user_id, event_request("ghost_incident"))
            .await
            .unwrap();
        assert_eq!(entry.point_change, 0);
        assert_eq!(entry.new_component_score, 0);
        assert!(entry.description.contains("clamped"));

        // The ledger sum still reconciles with the component value.
        let history = service.get_history(user_id, None, None).await.unwrap();
        let ledger_sum: i32 = history.entries.iter().map(|e| e.point_change).sum();
        let snapshot = service.get_score(user_id).await.unwrap();
        assert_eq!(ledger_sum, snapshot.reliability_score);
    }

    #[tokio::test]
    async fn test_documented_worked_example() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        for _ in 0..3 {
            service
                .apply_event(user_id, event_request("swap_completed"))
                .await
                .unwrap();
        }
        service
            .apply_event(user_id, event_request("ghost_incident"))
            .await
            .unwrap();

        let snapshot = service.get_score(user_id).await.unwrap();
        assert_eq!(snapshot.completion_score, 30);
        assert_eq!(snapshot.reliability_score, 0);
        assert_eq!(snapshot.overall_score, 105);

        let badge = BadgeLevel::from_score(snapshot.overall_score);
        assert_eq!(badge, BadgeLevel::Newcomer);
        assert_eq!(badge.points_to_next(snapshot.overall_score), Some(145));
    }

    #[tokio::test]
    async fn test_rating_maps_stars_to_magnitude() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let entry = service
            .apply_rating(user_id, SubmitRatingRequest { stars: 5 })
            .await
            .unwrap();
        assert_eq!(entry.point_change, 8);
        assert_eq!(entry.event_type, RATING_EVENT_ID);

        let entry = service
            .apply_rating(user_id, SubmitRatingRequest { stars: 1 })
            .await
            .unwrap();
        assert_eq!(entry.point_change, -8);

        let snapshot = service.get_score(user_id).await.unwrap();
        assert_eq!(snapshot.community_score, 0);
    }

    #[tokio::test]
    async fn test_invalid_star_count_rejected() {
        let service = test_service();
        let err = service
            .apply_rating(Uuid::new_v4(), SubmitRatingRequest { stars: 6 })
            .await
            .unwrap_err();
        assert!(matches!(err, ScoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_paginated() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        for _ in 0..5 {
            service
                .apply_event(user_id, event_request("on_time_exchange"))
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = service.get_history(user_id, cursor, Some(2)).await.unwrap();
            for window in page.entries.windows(2) {
                assert!(window[0].sequence > window[1].sequence);
            }
            seen.extend(page.entries);
            cursor = page.next_cursor;
            if cursor.is_none() {
                break;
            }
        }

        assert_eq!(seen.len(), 5);
        for window in seen.windows(2) {
            assert!(window[0].sequence > window[1].sequence);
        }
    }

    #[tokio::test]
    async fn test_reads_are_idempotent() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        service
            .apply_event(user_id, event_request("bill_verified"))
            .await
            .unwrap();

        let first = service.get_score(user_id).await.unwrap();
        let second = service.get_score(user_id).await.unwrap();
        assert_eq!(first, second);

        let first = service.get_history(user_id, None, None).await.unwrap();
        let second = service.get_history(user_id, None, None).await.unwrap();
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.next_cursor, second.next_cursor);
    }

    #[tokio::test]
    async fn test_replay_matches_live_snapshot() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let sequence = [
            ("swap_completed", None),
            ("bill_verified", None),
            ("rating_received", Some(8)),
            ("ghost_incident", None),
            ("swap_cancelled", None),
            ("identity_verified", None),
        ];
        for (event_type_id, magnitude_override) in sequence {
            service
                .apply_event(
                    user_id,
                    ApplyEventRequest {
                        event_type_id: event_type_id.to_string(),
                        magnitude_override,
                    },
                )
                .await
                .unwrap();
        }

        let live = service.get_score(user_id).await.unwrap();
        let recalculated = service.recalculate(user_id).await.unwrap();
        assert_eq!(recalculated.overall_score, live.overall_score);
        assert_eq!(recalculated.completion_score, live.completion_score);
        assert_eq!(recalculated.verification_score, live.verification_score);
        assert_eq!(recalculated.community_score, live.community_score);
        assert_eq!(recalculated.reliability_score, live.reliability_score);

        let report = service.audit(10).await.unwrap();
        assert_eq!(report.checked, 1);
        assert!(report.mismatched.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_applies_lose_no_updates() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .apply_event(
                        user_id,
                        ApplyEventRequest {
                            event_type_id: RATING_EVENT_ID.to_string(),
                            magnitude_override: Some(4),
                        },
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let snapshot = service.get_score(user_id).await.unwrap();
        assert_eq!(snapshot.community_score, 64);
        assert_eq!(snapshot.version, 16);

        let history = service.get_history(user_id, None, None).await.unwrap();
        assert_eq!(history.entries.len(), 16);
        let ledger_sum: i32 = history.entries.iter().map(|e| e.point_change).sum();
        assert_eq!(ledger_sum, snapshot.community_score);
    }

    #[tokio::test]
    async fn test_stats_over_population() {
        let service = test_service();

        for _ in 0..3 {
            let user_id = Uuid::new_v4();
            service
                .apply_event(user_id, event_request("swap_completed"))
                .await
                .unwrap();
        }

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_users, 3);
        // Every user sits at 35 points.
        assert_eq!(stats.avg_score, 35.0);
        assert_eq!(stats.median_score, 35.0);
    }

    #[test]
    fn test_rating_points_mapping() {
        assert_eq!(rating_points(1), -8);
        assert_eq!(rating_points(2), -4);
        assert_eq!(rating_points(3), 0);
        assert_eq!(rating_points(4), 4);
        assert_eq!(rating_points(5), 8);
    }
}
