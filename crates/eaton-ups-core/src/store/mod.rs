// ── Reactive topic store ──
//
// Lock-free topic storage with push-based change notification.

mod snapshot;

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::watch;

use crate::stream::TopicStream;

pub use snapshot::TopicSnapshot;

/// Last-known decoded payload per prefix-stripped topic.
///
/// Uses `DashMap` for atomic single-key replace and a `watch` channel for
/// push-based change notification. Every write bumps a version counter and
/// rebuilds the immutable snapshot that readers receive, so a reader never
/// iterates the map while it is being written.
pub struct TopicStore {
    by_topic: DashMap<String, Arc<Value>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<TopicSnapshot>>,
}

impl TopicStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(TopicSnapshot::default()));

        Self {
            by_topic: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Store `value` at `key`, replacing whatever was there.
    /// Returns the snapshot that includes the write.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Arc<TopicSnapshot> {
        let (key, value) = (key.into(), Arc::new(value));
        self.write(move |map| {
            map.insert(key, value);
        })
    }

    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.by_topic.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<TopicSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> TopicStream {
        TopicStream::new(self.snapshot.subscribe())
    }

    /// Drop every stored topic.
    pub fn clear(&self) {
        self.write(|map| map.clear());
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn len(&self) -> usize {
        self.by_topic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_topic.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Apply `mutate` and publish the rebuilt snapshot while holding the
    /// snapshot channel's write lock, so writers publish in write order.
    fn write(&self, mutate: impl FnOnce(&DashMap<String, Arc<Value>>)) -> Arc<TopicSnapshot> {
        let mut published = Arc::default();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|current| {
            mutate(&self.by_topic);
            published = Arc::new(
                self.by_topic
                    .iter()
                    .map(|r| (r.key().clone(), Arc::clone(r.value())))
                    .collect::<TopicSnapshot>(),
            );
            *current = Arc::clone(&published);
            self.version.send_modify(|v| *v += 1);
        });
        published
    }
}

impl Default for TopicStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn insert_overwrites_wholesale() {
        let store = TopicStore::new();
        store.insert("powerDistributions/1/status", json!({"operating": "inService"}));
        store.insert("powerDistributions/1/status", json!({"health": "ok"}));

        let value = store.get("powerDistributions/1/status").unwrap();
        assert_eq!(*value, json!({"health": "ok"}));
    }

    #[test]
    fn insert_leaves_other_keys_alone() {
        let store = TopicStore::new();
        store.insert("a", json!(1));
        let snap = store.insert("b", json!(2));

        assert_eq!(snap.get("a").map(|v| (**v).clone()), Some(json!(1)));
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn version_bumps_on_every_write() {
        let store = TopicStore::new();
        assert_eq!(store.version(), 0);
        store.insert("a", json!(1));
        store.insert("a", json!(1));
        assert_eq!(store.version(), 2);
        store.clear();
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn clear_empties_snapshot() {
        let store = TopicStore::new();
        store.insert("a", json!(1));
        store.clear();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn concurrent_writers_publish_the_final_state() {
        let store = Arc::new(TopicStore::new());
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        if w == 0 && i % 50 == 0 {
                            store.clear();
                        } else {
                            store.insert(format!("w{w}/{i}"), json!(i));
                        }
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let snap = store.snapshot();
        assert_eq!(snap.len(), store.len());
        assert!(snap.keys().all(|k| store.get(k).is_some()));
        assert_eq!(store.version(), 800);
    }

    #[test]
    fn earlier_snapshots_are_immutable() {
        let store = TopicStore::new();
        let before = store.insert("a", json!(1));
        store.insert("a", json!(2));

        assert_eq!(before.get("a").map(|v| (**v).clone()), Some(json!(1)));
        assert_eq!(
            store.snapshot().get("a").map(|v| (**v).clone()),
            Some(json!(2))
        );
    }
}
