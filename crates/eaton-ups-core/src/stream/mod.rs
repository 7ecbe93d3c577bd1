// ── Topic snapshot subscriptions ──
//
// Readers that need to wait for telemetry (a given topic, or the end of
// the retained burst after SUBSCRIBE) do it through a `TopicStream`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::store::TopicSnapshot;

/// Receiver side of the topic store's snapshot channel.
///
/// Writes between two reads coalesce: a reader sees the newest snapshot,
/// not every intermediate one.
pub struct TopicStream {
    current: Arc<TopicSnapshot>,
    receiver: watch::Receiver<Arc<TopicSnapshot>>,
}

impl TopicStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<TopicSnapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot as of creation or the last wait.
    pub fn current(&self) -> &Arc<TopicSnapshot> {
        &self.current
    }

    pub fn latest(&self) -> Arc<TopicSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Next store write. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Arc<TopicSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// First snapshot, starting with the latest one, for which `ready`
    /// holds.
    pub async fn wait_for<F>(&mut self, ready: F) -> Option<Arc<TopicSnapshot>>
    where
        F: Fn(&TopicSnapshot) -> bool,
    {
        let mut snapshot = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snapshot);
        while !ready(&snapshot) {
            snapshot = self.changed().await?;
        }
        Some(snapshot)
    }

    /// Follow writes until none arrives for `quiet`, then return the last
    /// snapshot seen.
    pub async fn settle(&mut self, quiet: Duration) -> Arc<TopicSnapshot> {
        while let Ok(Some(_)) = tokio::time::timeout(quiet, self.changed()).await {}
        Arc::clone(&self.current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use crate::store::TopicStore;

    const IDENTIFICATION: &str = "managers/1/identification";

    #[tokio::test]
    async fn changed_yields_new_snapshot() {
        let store = TopicStore::new();
        let mut stream = store.subscribe();
        assert!(stream.current().is_empty());

        store.insert(IDENTIFICATION, json!({"macAddress": "00:20:85"}));
        let snap = stream.changed().await.unwrap();
        assert!(snap.contains(IDENTIFICATION));
        assert_eq!(stream.current().len(), 1);
    }

    #[test]
    fn changed_is_pending_until_a_write() {
        let store = TopicStore::new();
        let mut stream = store.subscribe();
        let mut changed = tokio_test::task::spawn(stream.changed());
        tokio_test::assert_pending!(changed.poll());

        store.insert("a", json!(1));
        assert!(changed.is_woken());
        let snap = tokio_test::assert_ready!(changed.poll()).unwrap();
        assert!(snap.contains("a"));
    }

    #[tokio::test]
    async fn latest_sees_writes_after_creation() {
        let store = TopicStore::new();
        let stream = store.subscribe();
        store.insert("a", json!(1));
        assert!(stream.current().is_empty());
        assert_eq!(stream.latest().len(), 1);
    }

    #[tokio::test]
    async fn wait_for_accepts_data_already_stored() {
        let store = TopicStore::new();
        let mut stream = store.subscribe();
        store.insert(IDENTIFICATION, json!({}));

        let snap = stream.wait_for(|s| s.contains(IDENTIFICATION)).await.unwrap();
        assert!(snap.contains(IDENTIFICATION));
        assert_eq!(stream.current().len(), 1);
    }

    #[test]
    fn wait_for_skips_unrelated_topics() {
        let store = TopicStore::new();
        let mut stream = store.subscribe();
        let mut wait = tokio_test::task::spawn(stream.wait_for(|s| s.contains(IDENTIFICATION)));
        tokio_test::assert_pending!(wait.poll());

        store.insert("powerDistributions/1/status", json!({"health": "ok"}));
        tokio_test::assert_pending!(wait.poll());

        store.insert(IDENTIFICATION, json!({}));
        let snap = tokio_test::assert_ready!(wait.poll()).unwrap();
        assert_eq!(snap.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_returns_once_writes_stop() {
        let store = std::sync::Arc::new(TopicStore::new());
        let mut stream = store.subscribe();

        let writer = {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..5 {
                    store.insert(format!("inputs/{i}/measures"), json!(i));
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            })
        };

        let snap = stream.settle(Duration::from_millis(300)).await;
        writer.await.unwrap();
        assert_eq!(snap.len(), 5);
    }
}
