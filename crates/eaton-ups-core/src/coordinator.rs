// ── Update coordinator ──
//
// Bridges the push-driven client to consumers that want "latest data plus
// a success flag". Each ingested message refreshes the coordinator's
// snapshot; an optional polling task covers the lazy-connect path and
// turns connection failures into `UpdateError`s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::UpsClient;
use crate::error::UpdateError;
use crate::store::TopicSnapshot;
use crate::subscribers::Subscription;

/// Cheaply cloneable via `Arc<CoordinatorInner>`.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    client: UpsClient,
    data: ArcSwap<TopicSnapshot>,
    updates: watch::Sender<Arc<TopicSnapshot>>,
    last_update_success: AtomicBool,
    last_error: ArcSwapOption<UpdateError>,
    last_update: ArcSwapOption<DateTime<Utc>>,
    subscription: Mutex<Option<Subscription>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    pub fn new(client: UpsClient) -> Self {
        let initial = client.snapshot();
        let (updates, _) = watch::channel(Arc::clone(&initial));

        Self {
            inner: Arc::new(CoordinatorInner {
                client,
                data: ArcSwap::new(initial),
                updates,
                last_update_success: AtomicBool::new(false),
                last_error: ArcSwapOption::empty(),
                last_update: ArcSwapOption::empty(),
                subscription: Mutex::new(None),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn client(&self) -> &UpsClient {
        &self.inner.client
    }

    /// Register for pushed updates. Calling twice keeps one registration.
    pub async fn start(&self) {
        let mut slot = self.inner.subscription.lock().await;
        if slot.is_some() {
            return;
        }
        let weak: Weak<CoordinatorInner> = Arc::downgrade(&self.inner);
        let subscription = self.inner.client.subscribe_to_updates(move |snapshot| {
            if let Some(inner) = weak.upgrade() {
                inner.publish(snapshot);
            }
        });
        debug!(id = %subscription.id(), "coordinator subscribed to updates");
        *slot = Some(subscription);
    }

    /// Fetch the current data, connecting if needed.
    ///
    /// [`CoreError::Authentication`](crate::CoreError::Authentication) maps
    /// to [`UpdateError::AuthFailed`]; everything else to
    /// [`UpdateError::UpdateFailed`].
    pub async fn refresh(&self) -> Result<Arc<TopicSnapshot>, UpdateError> {
        match self.inner.client.get_data().await {
            Ok(snapshot) => {
                self.inner.publish(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                let err = UpdateError::from(e);
                warn!(error = %err, "coordinator refresh failed");
                self.inner.last_update_success.store(false, Ordering::Release);
                self.inner.last_error.store(Some(Arc::new(err.clone())));
                Err(err)
            }
        }
    }

    /// Periodic `refresh()` until `shutdown()`.
    pub async fn spawn_polling(&self, interval: Duration) {
        let coordinator = self.clone();
        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        // Failures are recorded on the coordinator.
                        let _ = coordinator.refresh().await;
                    }
                }
            }
        });
        self.inner.task_handles.lock().await.push(handle);
    }

    /// Unsubscribe, stop background tasks, and disconnect the client.
    pub async fn shutdown(&self) {
        if let Some(subscription) = self.inner.subscription.lock().await.take() {
            subscription.unsubscribe();
        }

        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.client.disconnect().await;
        debug!("coordinator shut down");
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn data(&self) -> Arc<TopicSnapshot> {
        self.inner.data.load_full()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TopicSnapshot>> {
        self.inner.updates.subscribe()
    }

    /// Whether the last update attempt succeeded.
    pub fn available(&self) -> bool {
        self.inner.last_update_success.load(Ordering::Acquire)
    }

    pub fn last_error(&self) -> Option<UpdateError> {
        self.inner.last_error.load_full().map(|e| (*e).clone())
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.inner.last_update.load_full().map(|t| *t)
    }
}

impl CoordinatorInner {
    fn publish(&self, snapshot: Arc<TopicSnapshot>) {
        self.data.store(Arc::clone(&snapshot));
        self.last_update_success.store(true, Ordering::Release);
        self.last_error.store(None);
        self.last_update.store(Some(Arc::new(Utc::now())));
        self.updates.send_replace(snapshot);
    }
}
