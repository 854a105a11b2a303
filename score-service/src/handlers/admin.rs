use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::AppError;
use crate::models::ScoreSnapshot;
use crate::AppState;

/// Rebuild a user's snapshot from their ledger. Repairs drifted snapshots
/// flagged by the audit worker.
pub async fn recalculate_score(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = state.score_service.recalculate(user_id).await?;
    Ok(Json(snapshot))
}
