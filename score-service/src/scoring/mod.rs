//! Score aggregation math: per-component clamping and weighted composition.
//!
//! A component lives on a 0-100 scale; the overall score is the weighted sum
//! of the four components scaled to 0-1000. Deltas that would push a
//! component outside its range are truncated, never rejected, and callers
//! receive the delta that was actually applied.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{ScoreComponent, ScoreSnapshot};

pub const COMPONENT_MIN: i32 = 0;
pub const COMPONENT_MAX: i32 = 100;
pub const OVERALL_MIN: i32 = 0;
pub const OVERALL_MAX: i32 = 1000;

/// Clamp a raw component value into its valid range.
pub fn clamp_component(value: i64) -> i32 {
    value.clamp(i64::from(COMPONENT_MIN), i64::from(COMPONENT_MAX)) as i32
}

/// Weighted 0-1000 overall score for a snapshot's component scores.
///
/// Computed in decimal arithmetic so the weighted sum is exact; the midpoint
/// rounds away from zero.
pub fn overall_score(snapshot: &ScoreSnapshot) -> i32 {
    let composite: Decimal = ScoreComponent::ALL
        .iter()
        .map(|&component| Decimal::from(snapshot.component_score(component)) * component.weight())
        .sum();

    let scaled = (composite * Decimal::from(10))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    scaled
        .to_i32()
        .unwrap_or(OVERALL_MAX)
        .clamp(OVERALL_MIN, OVERALL_MAX)
}

/// Apply a signed delta to one component of a snapshot.
///
/// Returns the updated snapshot (with the overall score recomputed) and the
/// post-clamp delta that was actually applied.
pub fn apply_delta(
    snapshot: &ScoreSnapshot,
    component: ScoreComponent,
    delta: i32,
) -> (ScoreSnapshot, i32) {
    let current = snapshot.component_score(component);
    let clamped = clamp_component(i64::from(current) + i64::from(delta));
    let applied = clamped - current;

    let mut updated = snapshot.clone();
    updated.set_component_score(component, clamped);
    updated.overall_score = overall_score(&updated);

    (updated, applied)
}
