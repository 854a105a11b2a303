//! Badge tiers derived from the overall score.

use serde::{Deserialize, Serialize};

pub const TRUSTED_FLOOR: i32 = 250;
pub const VERIFIED_FLOOR: i32 = 500;
pub const ELITE_FLOOR: i32 = 750;

/// Ordered trust tiers. Each tier owns a contiguous half-open score range;
/// elite is closed at the top of the 0-1000 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeLevel {
    Newcomer,
    Trusted,
    Verified,
    Elite,
}

impl BadgeLevel {
    pub const ALL: [BadgeLevel; 4] = [
        BadgeLevel::Newcomer,
        BadgeLevel::Trusted,
        BadgeLevel::Verified,
        BadgeLevel::Elite,
    ];

    pub fn from_score(score: i32) -> Self {
        if score >= ELITE_FLOOR {
            BadgeLevel::Elite
        } else if score >= VERIFIED_FLOOR {
            BadgeLevel::Verified
        } else if score >= TRUSTED_FLOOR {
            BadgeLevel::Trusted
        } else {
            BadgeLevel::Newcomer
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BadgeLevel::Newcomer => "Newcomer",
            BadgeLevel::Trusted => "Trusted",
            BadgeLevel::Verified => "Verified",
            BadgeLevel::Elite => "Elite",
        }
    }

    /// Lowest overall score belonging to this tier.
    pub fn floor(self) -> i32 {
        match self {
            BadgeLevel::Newcomer => 0,
            BadgeLevel::Trusted => TRUSTED_FLOOR,
            BadgeLevel::Verified => VERIFIED_FLOOR,
            BadgeLevel::Elite => ELITE_FLOOR,
        }
    }

    pub fn next(self) -> Option<BadgeLevel> {
        match self {
            BadgeLevel::Newcomer => Some(BadgeLevel::Trusted),
            BadgeLevel::Trusted => Some(BadgeLevel::Verified),
            BadgeLevel::Verified => Some(BadgeLevel::Elite),
            BadgeLevel::Elite => None,
        }
    }

    /// Points still needed to reach the next tier; `None` at the top tier.
    pub fn points_to_next(self, score: i32) -> Option<i32> {
        self.next().map(|next| next.floor() - score)
    }
}

impl std::fmt::Display for BadgeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Badge payload attached to score responses.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeInfo {
    pub level: BadgeLevel,
    pub display_name: &'static str,
    pub points_to_next: Option<i32>,
}

impl BadgeInfo {
    pub fn for_score(score: i32) -> Self {
        let level = BadgeLevel::from_score(score);
        Self {
            level,
            display_name: level.display_name(),
            points_to_next: level.points_to_next(score),
        }
    }
}
