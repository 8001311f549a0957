//! The origin tracker: dedupe, cooldown expiry, and the live snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use pulsemap_types::{Attributes, OriginRecord, TrackerSnapshot};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::enrich::EnrichOrigin;
use crate::event::TrackerEvent;
use crate::hub::{EventHub, Subscription};

/// Tunables for the tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Inactivity window after which an origin's tracked state expires.
    pub cooldown: Duration,
    /// Capacity of each observer's event queue.
    pub observer_queue: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(30_000),
            observer_queue: 256,
        }
    }
}

/// One currently-active origin. Owns exactly one pending expiry timer.
struct TrackedEntity {
    attributes: Attributes,
    count: u64,
    first_seen_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
    /// Bumped on every rearm. An expiry fire carrying an older epoch is
    /// stale and must not remove the entity.
    epoch: u64,
    expiry: JoinHandle<()>,
}

impl TrackedEntity {
    fn record(&self, origin: &str) -> OriginRecord {
        OriginRecord {
            origin: origin.to_string(),
            count: self.count,
            attributes: self.attributes.clone(),
            first_seen_at: self.first_seen_at,
            last_seen_at: self.last_seen_at,
        }
    }
}

struct TrackerState {
    origins: HashMap<String, TrackedEntity>,
    total: u64,
}

/// Tracks live origins and fans state transitions out to observers.
///
/// Cheap to clone; all clones share the same state. One mutex guards the
/// origin map, the total counter, and timer rearms together, and no
/// operation holds it across an await, so `observe` is safe to call from
/// any number of concurrent tasks or threads. Expiry timers run as spawned
/// tasks that re-enter the same lock like any other mutator.
///
/// Lock ordering: tracker state first, observer registry second, never the
/// reverse.
#[derive(Clone)]
pub struct OriginTracker {
    state: Arc<Mutex<TrackerState>>,
    hub: Arc<EventHub>,
    resolver: Arc<dyn EnrichOrigin>,
    cooldown: Duration,
    runtime: Handle,
}

impl OriginTracker {
    /// Creates an empty tracker.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime: expiry timers are
    /// spawned onto the runtime that is current at construction, which is
    /// what lets `observe` itself be called from plain threads later.
    pub fn new(config: TrackerConfig, resolver: impl EnrichOrigin + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState {
                origins: HashMap::new(),
                total: 0,
            })),
            hub: Arc::new(EventHub::new(config.observer_queue)),
            resolver: Arc::new(resolver),
            cooldown: config.cooldown,
            runtime: Handle::current(),
        }
    }

    /// Records one occurrence for `origin`. Never fails.
    ///
    /// A known origin has its count bumped and its expiry timer rearmed. An
    /// unknown origin is enriched (best-effort) and enters the live set
    /// with `count = 1`. Either way the total counter advances and observers
    /// receive a `TotalChanged` followed by the `Created` or `Updated`.
    pub fn observe(&self, origin: &str) {
        {
            let mut state = self.lock_state();
            if state.origins.contains_key(origin) {
                self.touch(&mut state, origin);
                return;
            }
        }

        // First sighting: resolve attributes outside the lock, then
        // re-check. A racing observe for the same origin may have inserted
        // meanwhile, in which case this call degrades to a plain increment
        // and the resolved attributes are discarded.
        let attributes = match self.resolver.resolve(origin) {
            Some(attributes) => attributes,
            None => {
                tracing::info!(origin = %origin, "enrichment unavailable, using placeholder");
                Attributes::Unknown
            }
        };

        let mut state = self.lock_state();
        if state.origins.contains_key(origin) {
            self.touch(&mut state, origin);
        } else {
            self.insert(&mut state, origin, attributes);
        }
    }

    /// Returns a consistent point-in-time copy of the live state.
    pub fn snapshot(&self) -> TrackerSnapshot {
        Self::snapshot_locked(&self.lock_state())
    }

    /// Attaches a new observer.
    ///
    /// The observer's queue starts with a `Hydrate` built from the current
    /// state. Registration happens under the state lock, so every event
    /// published after the snapshot was taken reaches the new observer and
    /// none arrives before the hydration.
    pub fn attach(&self) -> Subscription {
        let state = self.lock_state();
        let snapshot = Self::snapshot_locked(&state);
        self.hub.attach_with(TrackerEvent::Hydrate {
            total: snapshot.total,
            origins: snapshot.origins,
        })
    }

    /// Detaches an observer. Unknown ids are ignored.
    pub fn detach(&self, id: Uuid) {
        self.hub.detach(id);
    }

    /// Total occurrences observed over the process lifetime.
    pub fn total(&self) -> u64 {
        self.lock_state().total
    }

    /// Number of origins currently within their activity window.
    pub fn origin_count(&self) -> usize {
        self.lock_state().origins.len()
    }

    /// Number of currently attached observers.
    pub fn observer_count(&self) -> usize {
        self.hub.observer_count()
    }

    /// Removes `origin` if its epoch still matches the timer that fired.
    ///
    /// Runs on the expiry task. An entity that was re-touched after this
    /// timer was armed carries a newer epoch; the fire is then stale and
    /// discarded, because the rearm's abort may lose the race against a
    /// fire that already started.
    pub(crate) fn expire(&self, origin: &str, epoch: u64) {
        let mut state = self.lock_state();
        match state.origins.get(origin) {
            // Already gone; nothing to do.
            None => return,
            Some(entity) if entity.epoch != epoch => {
                tracing::debug!(origin = %origin, "stale expiry discarded");
                return;
            }
            Some(_) => {}
        }
        state.origins.remove(origin);
        self.hub
            .publish(&TrackerEvent::Removed {
                origin: origin.to_string(),
            });
        tracing::info!(origin = %origin, live = state.origins.len(), "origin expired after cooldown");
    }

    /// Increment path. Caller verified presence under the held lock.
    fn touch(&self, state: &mut TrackerState, origin: &str) {
        state.total += 1;
        self.hub.publish(&TrackerEvent::TotalChanged {
            total: state.total,
        });

        let now = Utc::now();
        let Some(entity) = state.origins.get_mut(origin) else {
            return;
        };
        entity.count += 1;
        entity.last_seen_at = now;
        entity.epoch += 1;
        let rearmed = self.arm_expiry(origin, entity.epoch);
        let previous = std::mem::replace(&mut entity.expiry, rearmed);
        previous.abort();

        let event = TrackerEvent::Updated {
            origin: origin.to_string(),
            count: entity.count,
            attributes: entity.attributes.clone(),
            last_seen_at: now,
        };
        tracing::debug!(origin = %origin, count = entity.count, "origin seen again");
        self.hub.publish(&event);
    }

    /// Creation path. Caller verified absence under the held lock.
    fn insert(&self, state: &mut TrackerState, origin: &str, attributes: Attributes) {
        state.total += 1;
        self.hub.publish(&TrackerEvent::TotalChanged {
            total: state.total,
        });

        let now = Utc::now();
        let entity = TrackedEntity {
            attributes: attributes.clone(),
            count: 1,
            first_seen_at: now,
            last_seen_at: now,
            epoch: 0,
            expiry: self.arm_expiry(origin, 0),
        };
        state.origins.insert(origin.to_string(), entity);
        tracing::info!(origin = %origin, live = state.origins.len(), "tracking new origin");
        self.hub.publish(&TrackerEvent::Created {
            origin: origin.to_string(),
            count: 1,
            attributes,
            first_seen_at: now,
        });
    }

    /// Schedules an expiry fire for `origin` after the cooldown.
    fn arm_expiry(&self, origin: &str, epoch: u64) -> JoinHandle<()> {
        let tracker = self.clone();
        let origin = origin.to_string();
        let cooldown = self.cooldown;
        self.runtime.spawn(async move {
            tokio::time::sleep(cooldown).await;
            tracker.expire(&origin, epoch);
        })
    }

    fn snapshot_locked(state: &TrackerState) -> TrackerSnapshot {
        TrackerSnapshot {
            total: state.total,
            origins: state
                .origins
                .iter()
                .map(|(origin, entity)| entity.record(origin))
                .collect(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("tracker state lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
