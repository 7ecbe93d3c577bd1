// ── Update subscribers ──
//
// Callbacks are keyed by an opaque handle, never by identity, so the same
// callback registered twice is removed once per handle. Messages arrive on
// the network loop task; the `Dispatcher` hands each snapshot to its own
// task on the owning runtime, which is the only place callbacks run.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::store::TopicSnapshot;

/// Invoked with the full topic store after every ingested message.
pub type UpdateCallback = Arc<dyn Fn(Arc<TopicSnapshot>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// ── Registry ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct SubscriberRegistry {
    callbacks: DashMap<SubscriptionId, UpdateCallback>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(self: &Arc<Self>, callback: UpdateCallback) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.insert(id, callback);
        debug!(%id, "update subscriber registered");
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        self.callbacks.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Cloned callback list, in registration order. No map lock is held
    /// once this returns.
    pub fn callbacks(&self) -> Vec<UpdateCallback> {
        let mut entries: Vec<_> = self
            .callbacks
            .iter()
            .map(|r| (*r.key(), Arc::clone(r.value())))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, cb)| cb).collect()
    }
}

/// Handle returned by [`SubscriberRegistry::subscribe`].
///
/// Dropping it keeps the callback registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<SubscriberRegistry>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove this registration. Returns `false` if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id))
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────

/// Hands snapshots from the network loop to the owning runtime.
pub struct Dispatcher {
    sender: mpsc::UnboundedSender<Arc<TopicSnapshot>>,
}

impl Dispatcher {
    /// Spawn the delivery task on `handle`. The task ends when the
    /// dispatcher is dropped.
    pub fn spawn(handle: &Handle, registry: Arc<SubscriberRegistry>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Arc<TopicSnapshot>>();

        handle.spawn(async move {
            while let Some(snapshot) = receiver.recv().await {
                for callback in registry.callbacks() {
                    let snapshot = Arc::clone(&snapshot);
                    if catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
                        warn!("update subscriber panicked; delivery continues");
                    }
                }
            }
            debug!("update dispatcher exiting");
        });

        Self { sender }
    }

    /// Queue `snapshot` for delivery. Never blocks.
    pub fn notify(&self, snapshot: Arc<TopicSnapshot>) {
        if self.sender.send(snapshot).is_err() {
            debug!("update dispatcher gone, dropping notification");
        }
    }
}
