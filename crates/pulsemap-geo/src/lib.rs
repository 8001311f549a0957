//! Geographic enrichment for the Pulsemap live origin tracker.
//!
//! Resolves an origin identifier (an IP address) into coordinates and
//! city/country labels via an in-memory network-prefix table. The table is
//! loaded asynchronously at process start; until the load completes every
//! lookup reports "unavailable" rather than erroring, and a failed load
//! leaves the resolver permanently unavailable without taking the service
//! down.
//!
//! Lookups never fail: the caller receives `Some(Attributes)` on a match and
//! `None` otherwise, and substitutes its own placeholder for `None`.

mod dataset;
mod error;
mod resolver;

pub use dataset::GeoEntry;
pub use error::GeoError;
pub use resolver::GeoResolver;
