//! Observer registry with per-observer bounded delivery.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::event::TrackerEvent;

/// Fans tracker events out to attached observers.
///
/// Each observer owns an independent bounded queue. Delivery is `try_send`
/// only: a full queue drops the new event for that observer alone (with a
/// warning), a closed queue prunes the observer. Publishing never blocks,
/// so a slow or gone observer cannot stall the tracker or its peers.
pub(crate) struct EventHub {
    observers: Mutex<Vec<Observer>>,
    capacity: usize,
}

struct Observer {
    id: Uuid,
    tx: mpsc::Sender<TrackerEvent>,
}

impl EventHub {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
            // A zero-capacity queue could never hold the hydration message.
            capacity: capacity.max(1),
        }
    }

    /// Registers a new observer whose queue starts with `first`.
    ///
    /// The caller holds the tracker state lock across this call, so nothing
    /// can be published between building `first` and the registration.
    pub(crate) fn attach_with(&self, first: TrackerEvent) -> Subscription {
        let (tx, receiver) = mpsc::channel(self.capacity);
        // Fresh channel with capacity >= 1: the hydration message always fits.
        let _ = tx.try_send(first);
        let id = Uuid::new_v4();
        let mut observers = self.lock_observers();
        observers.push(Observer { id, tx });
        tracing::debug!(observer = %id, observers = observers.len(), "observer attached");
        Subscription { id, receiver }
    }

    /// Removes an observer explicitly. Unknown ids are ignored; a dropped
    /// subscription is also pruned lazily on the next publish.
    pub(crate) fn detach(&self, id: Uuid) {
        let mut observers = self.lock_observers();
        let before = observers.len();
        observers.retain(|observer| observer.id != id);
        if observers.len() < before {
            tracing::debug!(observer = %id, observers = observers.len(), "observer detached");
        }
    }

    /// Queues `event` for every attached observer.
    pub(crate) fn publish(&self, event: &TrackerEvent) {
        let mut observers = self.lock_observers();
        observers.retain(|observer| match observer.tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    observer = %observer.id,
                    event = event.event_type(),
                    "observer queue full, dropping event"
                );
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(observer = %observer.id, "observer gone, pruning");
                false
            }
        });
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.lock_observers().len()
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<Observer>> {
        match self.observers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("observer registry lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// A single observer's event stream.
///
/// The first event received is always [`TrackerEvent::Hydrate`]; live events
/// follow in publication order. Dropping the subscription detaches the
/// observer lazily; transports call [`OriginTracker::detach`] when they know
/// the observer is gone.
///
/// [`OriginTracker::detach`]: crate::OriginTracker::detach
pub struct Subscription {
    id: Uuid,
    receiver: mpsc::Receiver<TrackerEvent>,
}

impl Subscription {
    /// Identifier for this observer, used with `detach`.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receives the next event. Returns `None` once detached and drained.
    pub async fn recv(&mut self) -> Option<TrackerEvent> {
        self.receiver.recv().await
    }

    /// Consumes the subscription, exposing the raw receiver so transports
    /// can wrap it in a stream.
    pub fn into_receiver(self) -> mpsc::Receiver<TrackerEvent> {
        self.receiver
    }
}
