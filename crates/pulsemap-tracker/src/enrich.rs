//! Seam between the tracker and whatever resolves origin attributes.

use pulsemap_types::Attributes;

/// Resolves descriptive attributes for an origin at first sighting.
///
/// Implementations must be bounded and in-memory: the tracker calls
/// `resolve` on the ingestion path (outside its state lock, but still
/// synchronously). `None` means the lookup is unavailable, whether not ready
/// yet, without a match, or handed an unparseable origin, and the tracker
/// substitutes the explicit placeholder. Resolution happens once per tracked
/// entity; the result is fixed at creation.
pub trait EnrichOrigin: Send + Sync {
    fn resolve(&self, origin: &str) -> Option<Attributes>;
}

/// Any `Fn(&str) -> Option<Attributes>` closure is a resolver. This is the
/// wiring shape used by the server and by scripted test resolvers.
impl<F> EnrichOrigin for F
where
    F: Fn(&str) -> Option<Attributes> + Send + Sync,
{
    fn resolve(&self, origin: &str) -> Option<Attributes> {
        self(origin)
    }
}
