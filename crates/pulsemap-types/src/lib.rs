//! Shared types for the Pulsemap live origin tracker.
//!
//! This crate provides the data model used across all Pulsemap crates:
//! enrichment attributes, the public view of a tracked origin, and the
//! point-in-time snapshot handed to newly attached observers.
//!
//! No crate in the workspace depends on anything *except* `pulsemap-types`
//! for cross-cutting type definitions. This keeps the dependency graph clean
//! and prevents circular dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive attributes resolved for an origin, fixed at first sighting.
///
/// Enrichment is best-effort: when the lookup is not ready, has no match for
/// the origin, or the origin cannot be parsed, the origin carries the
/// explicit [`Attributes::Unknown`] placeholder instead. Consumers render
/// unknowns however they see fit; no fabricated coordinates are ever emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Attributes {
    /// The origin resolved to a geographic position with labels.
    Located {
        /// Latitude in decimal degrees.
        lat: f64,
        /// Longitude in decimal degrees.
        lon: f64,
        /// City label, `"Unknown"` when the dataset row carries none.
        city: String,
        /// Country label, `"Unknown"` when the dataset row carries none.
        country: String,
    },
    /// The origin could not be resolved.
    Unknown,
}

impl Attributes {
    /// Label used in dataset rows and logs for an absent city or country.
    pub const UNKNOWN_LABEL: &'static str = "Unknown";

    /// Returns true when this is the unresolved placeholder.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Public view of a currently tracked origin.
///
/// This is the shape carried by hydration payloads and the snapshot API.
/// Field names serialize in camelCase because the payloads feed a browser
/// map client directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginRecord {
    /// The origin identifier (e.g. a source address).
    pub origin: String,
    /// Occurrences observed since this entry was created. Always >= 1.
    pub count: u64,
    /// Enrichment result, fixed at creation.
    pub attributes: Attributes,
    /// Time of the first occurrence for this entry. Immutable.
    pub first_seen_at: DateTime<Utc>,
    /// Time of the most recent occurrence.
    pub last_seen_at: DateTime<Utc>,
}

/// Consistent point-in-time copy of the tracker state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    /// Total occurrences observed over the process lifetime. Never decreases.
    pub total: u64,
    /// All origins currently within their activity window.
    pub origins: Vec<OriginRecord>,
}
