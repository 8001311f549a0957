//! Outbound notification events derived from tracker state transitions.

use chrono::{DateTime, Utc};
use pulsemap_types::{Attributes, OriginRecord};
use serde::{Deserialize, Serialize};

/// One notification to observers.
///
/// Serialized as tagged JSON with camelCase fields because the payloads feed
/// a browser map client directly, e.g.
/// `{"event":"TOTAL_CHANGED","total":7}`.
///
/// For a single observer, `Hydrate` is always delivered first and live
/// events follow in the order the tracker produced them. Every observe call
/// yields a `TotalChanged` immediately followed by the `Created` or
/// `Updated` it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum TrackerEvent {
    /// The lifetime occurrence counter advanced.
    TotalChanged {
        /// New counter value. Monotonically non-decreasing.
        total: u64,
    },

    /// A previously unseen origin entered the live set.
    Created {
        origin: String,
        /// Always 1 for a fresh entity.
        count: u64,
        attributes: Attributes,
        first_seen_at: DateTime<Utc>,
    },

    /// A live origin was seen again within its activity window.
    Updated {
        origin: String,
        count: u64,
        attributes: Attributes,
        last_seen_at: DateTime<Utc>,
    },

    /// An origin went quiet for the full cooldown and left the live set.
    Removed { origin: String },

    /// Initial state for a newly attached observer.
    Hydrate {
        total: u64,
        origins: Vec<OriginRecord>,
    },
}

impl TrackerEvent {
    /// Returns the wire tag for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TotalChanged { .. } => "TOTAL_CHANGED",
            Self::Created { .. } => "CREATED",
            Self::Updated { .. } => "UPDATED",
            Self::Removed { .. } => "REMOVED",
            Self::Hydrate { .. } => "HYDRATE",
        }
    }

    /// Returns the origin this event concerns, when it concerns one.
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::Created { origin, .. }
            | Self::Updated { origin, .. }
            | Self::Removed { origin } => Some(origin),
            Self::TotalChanged { .. } | Self::Hydrate { .. } => None,
        }
    }
}
