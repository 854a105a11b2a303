//! Event catalog: every event type that can move a Billix score.
//!
//! The catalog is immutable configuration assembled once at startup and
//! shared behind an `Arc`; lookups never take a lock.

use std::collections::HashMap;

use crate::models::{ScoreComponent, ScoreError, ScoreEventType, ScoreResult};

/// Event type used for star ratings; the rating determines the magnitude.
pub const RATING_EVENT_ID: &str = "rating_received";

const BUILTIN_EVENTS: &[ScoreEventType] = &[
    ScoreEventType {
        id: "swap_completed",
        display_name: "Swap completed",
        base_points: 10,
        component: ScoreComponent::Completion,
    },
    ScoreEventType {
        id: "swap_cancelled",
        display_name: "Swap cancelled",
        base_points: -8,
        component: ScoreComponent::Completion,
    },
    ScoreEventType {
        id: "first_swap_completed",
        display_name: "First swap completed",
        base_points: 20,
        component: ScoreComponent::Completion,
    },
    ScoreEventType {
        id: "bill_verified",
        display_name: "Bill verified",
        base_points: 15,
        component: ScoreComponent::Verification,
    },
    ScoreEventType {
        id: "verification_rejected",
        display_name: "Verification rejected",
        base_points: -12,
        component: ScoreComponent::Verification,
    },
    ScoreEventType {
        id: "identity_verified",
        display_name: "Identity verified",
        base_points: 20,
        component: ScoreComponent::Verification,
    },
    ScoreEventType {
        id: RATING_EVENT_ID,
        display_name: "Rating received",
        base_points: 4,
        component: ScoreComponent::Community,
    },
    ScoreEventType {
        id: "positive_review",
        display_name: "Positive review received",
        base_points: 8,
        component: ScoreComponent::Community,
    },
    ScoreEventType {
        id: "report_upheld",
        display_name: "Report against user upheld",
        base_points: -20,
        component: ScoreComponent::Community,
    },
    ScoreEventType {
        id: "on_time_exchange",
        display_name: "Exchange completed on time",
        base_points: 5,
        component: ScoreComponent::Reliability,
    },
    ScoreEventType {
        id: "late_response",
        display_name: "Late response",
        base_points: -5,
        component: ScoreComponent::Reliability,
    },
    ScoreEventType {
        id: "ghost_incident",
        display_name: "Ghosted a confirmed swap",
        base_points: -15,
        component: ScoreComponent::Reliability,
    },
];

pub struct EventCatalog {
    events: HashMap<&'static str, ScoreEventType>,
}

impl EventCatalog {
    /// Catalog holding the builtin Billix event set.
    pub fn builtin() -> Self {
        let mut events = HashMap::with_capacity(BUILTIN_EVENTS.len());
        for event in BUILTIN_EVENTS {
            events.insert(event.id, event.clone());
        }
        Self { events }
    }

    pub fn lookup(&self, event_type_id: &str) -> ScoreResult<&ScoreEventType> {
        self.events
            .get(event_type_id)
            .ok_or_else(|| ScoreError::UnknownEventType(event_type_id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoreEventType> {
        self.events.values()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
