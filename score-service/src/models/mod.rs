use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

pub type ScoreResult<T> = Result<T, ScoreError>;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Concurrent update conflict")]
    ConcurrentConflict,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl ScoreError {
    /// Whether the caller may re-submit the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScoreError::ConcurrentConflict | ScoreError::Store(_) | ScoreError::Cache(_)
        )
    }
}

impl From<sqlx::Error> for ScoreError {
    fn from(err: sqlx::Error) -> Self {
        ScoreError::Store(err.to_string())
    }
}

impl From<redis::RedisError> for ScoreError {
    fn from(err: redis::RedisError) -> Self {
        ScoreError::Cache(err.to_string())
    }
}

/// The four weighted sub-scores composing the overall Billix score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "score_component", rename_all = "snake_case")]
pub enum ScoreComponent {
    Completion,
    Verification,
    Community,
    Reliability,
}

impl ScoreComponent {
    pub const ALL: [ScoreComponent; 4] = [
        ScoreComponent::Completion,
        ScoreComponent::Verification,
        ScoreComponent::Community,
        ScoreComponent::Reliability,
    ];

    /// Fixed component weight. The four weights sum to exactly 1.0.
    pub fn weight(self) -> Decimal {
        match self {
            ScoreComponent::Completion => Decimal::new(35, 2),
            ScoreComponent::Verification => Decimal::new(25, 2),
            ScoreComponent::Community => Decimal::new(25, 2),
            ScoreComponent::Reliability => Decimal::new(15, 2),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreComponent::Completion => "completion",
            ScoreComponent::Verification => "verification",
            ScoreComponent::Community => "community",
            ScoreComponent::Reliability => "reliability",
        }
    }
}

impl std::fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Catalog entry describing one event type that can move a score.
///
/// `base_points` carries the sign, so whether an event is positive never
/// disagrees with its delta.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreEventType {
    pub id: &'static str,
    pub display_name: &'static str,
    pub base_points: i32,
    pub component: ScoreComponent,
}

impl ScoreEventType {
    pub fn is_positive(&self) -> bool {
        self.base_points >= 0
    }
}

/// Current materialized score state for one user.
///
/// `version` increments on every committed mutation and guards the
/// optimistic read-modify-write cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScoreSnapshot {
    pub user_id: Uuid,
    pub completion_score: i32,
    pub verification_score: i32,
    pub community_score: i32,
    pub reliability_score: i32,
    pub overall_score: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScoreSnapshot {
    /// Fresh all-zero snapshot for a user seen for the first time.
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            completion_score: 0,
            verification_score: 0,
            community_score: 0,
            reliability_score: 0,
            overall_score: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn component_score(&self, component: ScoreComponent) -> i32 {
        match component {
            ScoreComponent::Completion => self.completion_score,
            ScoreComponent::Verification => self.verification_score,
            ScoreComponent::Community => self.community_score,
            ScoreComponent::Reliability => self.reliability_score,
        }
    }

    pub fn set_component_score(&mut self, component: ScoreComponent, value: i32) {
        match component {
            ScoreComponent::Completion => self.completion_score = value,
            ScoreComponent::Verification => self.verification_score = value,
            ScoreComponent::Community => self.community_score = value,
            ScoreComponent::Reliability => self.reliability_score = value,
        }
    }
}

/// One applied event in the append-only score ledger.
///
/// `point_change` is the delta that was actually applied after clamping, so
/// summing a user's ledger always reconciles with their snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScoreHistoryEntry {
    pub id: Uuid,
    pub sequence: i64,
    pub user_id: Uuid,
    pub event_type: String,
    pub point_change: i32,
    pub component: ScoreComponent,
    pub new_component_score: i32,
    pub new_score: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ApplyEventRequest {
    #[validate(length(min = 1, max = 64))]
    pub event_type_id: String,

    /// Replaces the event's base point delta, e.g. for rating-derived
    /// variable deltas. A component spans 100 points, so larger magnitudes
    /// are rejected.
    #[validate(range(min = -100, max = 100))]
    pub magnitude_override: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitRatingRequest {
    #[validate(range(min = 1, max = 5))]
    pub stars: u8,
}

/// Outcome of one ledger-audit pass.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub checked: usize,
    pub mismatched: Vec<Uuid>,
}
