//! Population statistics over overall scores.

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution, Median};

use crate::badges::BadgeLevel;

/// Width of one distribution bucket on the 0-1000 scale.
const BUCKET_WIDTH: i32 = 100;
const BUCKET_COUNT: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreStats {
    pub total_users: u64,
    pub avg_score: f64,
    pub median_score: f64,
    pub distribution: Vec<ScoreBucket>,
    pub tier_counts: Vec<TierCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub range_start: i32,
    pub range_end: i32,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierCount {
    pub tier: BadgeLevel,
    pub count: u64,
}

/// Compute statistics for a score population. An empty population yields
/// zeroed aggregates with the full (empty) bucket layout.
pub fn compute(scores: &[i32]) -> ScoreStats {
    let mut distribution: Vec<ScoreBucket> = (0..BUCKET_COUNT)
        .map(|i| ScoreBucket {
            range_start: i * BUCKET_WIDTH,
            // The last bucket is closed at the top of the scale.
            range_end: if i == BUCKET_COUNT - 1 {
                BUCKET_COUNT * BUCKET_WIDTH
            } else {
                (i + 1) * BUCKET_WIDTH
            },
            count: 0,
        })
        .collect();

    let mut tier_counts: Vec<TierCount> = BadgeLevel::ALL
        .iter()
        .map(|&tier| TierCount { tier, count: 0 })
        .collect();

    for &score in scores {
        let bucket = (score / BUCKET_WIDTH).clamp(0, BUCKET_COUNT - 1) as usize;
        distribution[bucket].count += 1;

        let tier = BadgeLevel::from_score(score);
        for entry in tier_counts.iter_mut() {
            if entry.tier == tier {
                entry.count += 1;
            }
        }
    }

    let (avg_score, median_score) = if scores.is_empty() {
        (0.0, 0.0)
    } else {
        let data = Data::new(scores.iter().map(|&s| f64::from(s)).collect::<Vec<_>>());
        (data.mean().unwrap_or(0.0), data.median())
    };

    ScoreStats {
        total_users: scores.len() as u64,
        avg_score,
        median_score,
        distribution,
        tier_counts,
    }
}
