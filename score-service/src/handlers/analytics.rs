use axum::{extract::State, Json};
use std::sync::Arc;

use crate::analytics::stats::ScoreStats;
use crate::handlers::AppError;
use crate::AppState;

/// Score distribution and population statistics.
pub async fn get_score_distribution(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ScoreStats>, AppError> {
    let stats = state.score_service.stats().await?;
    Ok(Json(stats))
}
