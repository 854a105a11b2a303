use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use shared::types::CursorPage;

use crate::badges::BadgeInfo;
use crate::handlers::AppError;
use crate::models::{
    ApplyEventRequest, ScoreComponent, ScoreHistoryEntry, ScoreSnapshot, SubmitRatingRequest,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    #[serde(flatten)]
    pub snapshot: ScoreSnapshot,
    pub badge: BadgeInfo,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EventTypeInfo {
    pub id: &'static str,
    pub display_name: &'static str,
    pub base_points: i32,
    pub is_positive: bool,
    pub component: ScoreComponent,
}

/// Current score, badge, and distance to the next tier for a user.
pub async fn get_score(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ScoreResponse>, AppError> {
    let snapshot = state.score_service.get_score(user_id).await?;
    let badge = BadgeInfo::for_score(snapshot.overall_score);

    Ok(Json(ScoreResponse { snapshot, badge }))
}

/// Apply one catalog event to a user's score.
pub async fn apply_event(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ApplyEventRequest>,
) -> Result<(StatusCode, Json<ScoreHistoryEntry>), AppError> {
    let entry = state.score_service.apply_event(user_id, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Apply a 1-5 star rating to a user's community score.
pub async fn submit_rating(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SubmitRatingRequest>,
) -> Result<(StatusCode, Json<ScoreHistoryEntry>), AppError> {
    let entry = state.score_service.apply_rating(user_id, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Score ledger for a user, newest first.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<CursorPage<ScoreHistoryEntry>>, AppError> {
    let page = state
        .score_service
        .get_history(user_id, query.cursor, query.limit)
        .await?;

    Ok(Json(page))
}

/// Registered event types and their point deltas.
pub async fn list_event_types(State(state): State<Arc<AppState>>) -> Json<Vec<EventTypeInfo>> {
    let mut events: Vec<EventTypeInfo> = state
        .catalog
        .iter()
        .map(|e| EventTypeInfo {
            id: e.id,
            display_name: e.display_name,
            base_points: e.base_points,
            is_positive: e.is_positive(),
            component: e.component,
        })
        .collect();
    events.sort_by_key(|e| e.id);

    Json(events)
}
