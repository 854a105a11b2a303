pub mod admin;
pub mod analytics;
pub mod health;
pub mod score;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::ScoreError;

/// Maps service errors onto HTTP responses.
#[derive(Debug)]
pub struct AppError(ScoreError);

impl From<ScoreError> for AppError {
    fn from(err: ScoreError) -> Self {
        AppError(err)
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            ScoreError::UnknownEventType(_) => StatusCode::NOT_FOUND,
            ScoreError::Validation(_) => StatusCode::BAD_REQUEST,
            ScoreError::NotFound(_) => StatusCode::NOT_FOUND,
            ScoreError::ConcurrentConflict => StatusCode::CONFLICT,
            ScoreError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            ScoreError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self.0 {
            ScoreError::Store(msg) => {
                tracing::error!("Store error: {}", msg);
                "Score temporarily unavailable, try again".to_string()
            }
            ScoreError::Cache(msg) => {
                tracing::error!("Cache error: {}", msg);
                "Internal server error".to_string()
            }
            other => format!("{}", other),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
            "retryable": self.0.is_retryable(),
        }));

        (status, body).into_response()
    }
}
