//! Live origin lifecycle tracking for Pulsemap.
//!
//! Ingests discrete occurrences keyed by an origin identifier, deduplicates
//! repeated occurrences from the same origin within a sliding activity
//! window, and expires an origin's state once it has been quiet for the
//! configured cooldown. Every state transition is fanned out to attached
//! observers as an ordered event stream, and a newly attached observer is
//! hydrated with a consistent snapshot before any live event reaches it.
//!
//! # Event stream
//!
//! | Event | Meaning |
//! |-------|---------|
//! | `TOTAL_CHANGED` | The lifetime occurrence counter advanced |
//! | `CREATED` | A previously unseen origin entered the live set |
//! | `UPDATED` | A live origin was seen again within its window |
//! | `REMOVED` | An origin went quiet for the full cooldown |
//! | `HYDRATE` | Initial snapshot, first event for every observer |
//!
//! # Usage
//!
//! ```rust,ignore
//! use pulsemap_tracker::{OriginTracker, TrackerConfig};
//!
//! let tracker = OriginTracker::new(TrackerConfig::default(), |_: &str| None);
//! let mut sub = tracker.attach();
//! tracker.observe("81.2.69.142");
//! while let Some(event) = sub.recv().await {
//!     println!("{}", event.event_type());
//! }
//! ```

mod enrich;
mod event;
mod hub;
mod tracker;

pub use enrich::EnrichOrigin;
pub use event::TrackerEvent;
pub use hub::Subscription;
pub use tracker::{OriginTracker, TrackerConfig};
