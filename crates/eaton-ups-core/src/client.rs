// ── UPS client ──
//
// Full lifecycle management for one management-card broker connection.
// Stages certificates, opens the MQTT session, waits for the CONNACK,
// re-subscribes on every (re)connect, and streams ingested telemetry to
// subscribers on the owning runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use eaton_ups_api::{
    BrokerSession, CertificatePaths, ConnectOutcome, Connector, LinkHandler, MqttConnector,
    SessionOptions, StagedCertificates,
};

use crate::config::{ClientOptions, ConnectionConfig};
use crate::error::CoreError;
use crate::ingest::Ingestor;
use crate::store::{TopicSnapshot, TopicStore};
use crate::stream::TopicStream;
use crate::subscribers::{Dispatcher, SubscriberRegistry, Subscription, UpdateCallback};
use crate::topic::{COMMAND_TOPIC, SUBSCRIPTIONS};

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    /// No session, or the last setup attempt failed.
    Unconnected,
    /// Handshake in progress, or reconnecting after a drop.
    Connecting,
    Connected,
    /// Torn down by `disconnect()`.
    Disconnected,
}

// ── UpsClient ────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ClientInner>`. Connection is lazy: reading
/// data or sending a command connects first when needed.
#[derive(Clone)]
pub struct UpsClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ConnectionConfig,
    options: ClientOptions,
    connector: Arc<dyn Connector>,
    state: watch::Sender<ConnectionState>,
    /// Held for the whole of `setup()` so concurrent callers never open
    /// two sessions.
    session: Mutex<Option<Box<dyn BrokerSession>>>,
    certs: Mutex<Option<StagedCertificates>>,
    ingestor: Ingestor,
    registry: Arc<SubscriberRegistry>,
    dispatcher: ArcSwapOption<Dispatcher>,
    cancel: CancellationToken,
    /// Child token for the current connection. Cancelled on disconnect,
    /// replaced on the next setup.
    cancel_child: Mutex<CancellationToken>,
    /// Bumped by every `disconnect()` so a setup that swaps in its token
    /// after the cancel still notices it.
    disconnects: AtomicU64,
    last_refusal: ArcSwapOption<String>,
    /// Most recent link error reported by the network loop.
    last_link_error: ArcSwapOption<String>,
}

impl UpsClient {
    /// Client backed by the rumqttc connector with default options.
    /// Does NOT connect.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(config, ClientOptions::default(), Arc::new(MqttConnector))
    }

    pub fn with_options(config: ConnectionConfig, options: ClientOptions) -> Self {
        Self::with_connector(config, options, Arc::new(MqttConnector))
    }

    pub fn with_connector(
        config: ConnectionConfig,
        options: ClientOptions,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Unconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ClientInner {
                config,
                options,
                connector,
                state,
                session: Mutex::new(None),
                certs: Mutex::new(None),
                ingestor: Ingestor::new(Arc::new(TopicStore::new())),
                registry: Arc::new(SubscriberRegistry::new()),
                dispatcher: ArcSwapOption::empty(),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                disconnects: AtomicU64::new(0),
                last_refusal: ArcSwapOption::empty(),
                last_link_error: ArcSwapOption::empty(),
            }),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Connect to the broker if not already connected.
    ///
    /// Fails with [`CoreError::Communication`] when the broker does not
    /// accept the session within `connect_attempts * poll_interval`. A
    /// failed fresh attempt leaves no session and no staged files behind.
    pub async fn setup(&self) -> Result<(), CoreError> {
        let epoch = self.inner.disconnects.load(Ordering::SeqCst);
        let mut session = self.inner.session.lock().await;

        if session.is_some() {
            if self.is_connected() {
                return Ok(());
            }
            // The network loop is already reconnecting; wait on it rather
            // than racing it with a second session.
            debug!(address = %self.inner.config.address(), "waiting on reconnecting session");
            let cancel = self.inner.cancel_child.lock().await.clone();
            if self.wait_connected(&cancel).await {
                return Ok(());
            }
            return Err(self.communication_error("session is still reconnecting"));
        }

        // Fresh child token for this connection (supports reconnect).
        let cancel = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = cancel.clone();
        if self.inner.disconnects.load(Ordering::SeqCst) != epoch {
            cancel.cancel();
            return Err(self.communication_error("setup cancelled by disconnect"));
        }
        self.inner.last_refusal.store(None);
        self.inner.last_link_error.store(None);
        self.inner.state.send_replace(ConnectionState::Connecting);

        self.inner.dispatcher.store(Some(Arc::new(Dispatcher::spawn(
            &Handle::current(),
            Arc::clone(&self.inner.registry),
        ))));

        let paths = match self.stage_certificates().await {
            Ok(paths) => paths,
            Err(e) => {
                self.abort_setup(&mut session).await;
                return Err(e);
            }
        };

        let client_id = format!("eaton-ups-{}", uuid::Uuid::new_v4().simple());
        let mut options = SessionOptions::new(
            client_id,
            &self.inner.config.host,
            self.inner.config.port,
            paths,
        );
        options.keep_alive = self.inner.options.keep_alive;
        options.reconnect = self.inner.options.reconnect.clone();

        let handler = Arc::new(LinkEvents {
            inner: Arc::downgrade(&self.inner),
            cancel: cancel.clone(),
        });

        match self.inner.connector.open(options, handler).await {
            Ok(opened) => *session = Some(opened),
            Err(e) => {
                self.abort_setup(&mut session).await;
                return Err(self.transport_error(e));
            }
        }

        if self.wait_connected(&cancel).await {
            info!(address = %self.inner.config.address(), "connected to UPS broker");
            return Ok(());
        }

        self.abort_setup(&mut session).await;
        let reason = if cancel.is_cancelled() {
            "setup cancelled by disconnect".to_string()
        } else {
            let attempts = self.inner.options.connect_attempts;
            match (
                self.inner.last_refusal.load_full(),
                self.inner.last_link_error.load_full(),
            ) {
                (Some(refusal), _) => format!("broker refused the connection ({refusal})"),
                (None, Some(link)) => {
                    format!("no CONNACK after {attempts} attempts (last error: {link})")
                }
                (None, None) => format!("no CONNACK after {attempts} attempts"),
            }
        };
        Err(self.communication_error(reason))
    }

    /// Tear down the session and remove staged certificate files.
    ///
    /// Safe before `setup()`, during it, and when repeated.
    pub async fn disconnect(&self) {
        // Cancel the child token first: an in-flight setup releases the
        // session lock as soon as its wait observes it.
        self.inner.disconnects.fetch_add(1, Ordering::SeqCst);
        self.inner.cancel_child.lock().await.cancel();

        if let Some(session) = self.inner.session.lock().await.take() {
            session.close();
            info!(address = %self.inner.config.address(), "disconnected from UPS broker");
        }
        self.inner.dispatcher.store(None);

        if let Some(staged) = self.inner.certs.lock().await.take() {
            staged.cleanup();
        }

        self.inner.state.send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Data access ──────────────────────────────────────────────────

    /// Current topic store, connecting first if needed.
    pub async fn get_data(&self) -> Result<Arc<TopicSnapshot>, CoreError> {
        if !self.is_connected() {
            self.setup().await?;
        }
        Ok(self.snapshot())
    }

    /// Current topic store without touching the connection.
    pub fn snapshot(&self) -> Arc<TopicSnapshot> {
        self.inner.ingestor.store().snapshot()
    }

    /// Drop every stored topic. Retained topics repopulate on the next
    /// (re)subscribe; silent topics stay empty until they publish again.
    pub fn clear_data(&self) {
        self.inner.ingestor.store().clear();
    }

    pub fn updates(&self) -> TopicStream {
        self.inner.ingestor.store().subscribe()
    }

    /// Register `callback` for every ingested message. Callbacks run on
    /// the runtime that called `setup()`, never on the network loop.
    pub fn subscribe_to_updates<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Arc<TopicSnapshot>) + Send + Sync + 'static,
    {
        let callback: UpdateCallback = Arc::new(callback);
        self.inner.registry.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.len()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Publish `{"command": value}` to the UPS command topic.
    /// Fire-and-forget: no acknowledgement topic is consumed.
    pub async fn send_command(&self, value: &str) -> Result<(), CoreError> {
        if !self.is_connected() {
            self.setup().await?;
        }

        let payload = serde_json::to_vec(&serde_json::json!({ "command": value }))
            .map_err(|e| CoreError::Internal(format!("command encoding failed: {e}")))?;

        let session = self.inner.session.lock().await;
        let Some(session) = session.as_ref() else {
            return Err(CoreError::client("no MQTT session available"));
        };
        session
            .publish(COMMAND_TOPIC, Bytes::from(payload))
            .map_err(|e| self.transport_error(e))?;
        info!(command = value, "command published");
        Ok(())
    }

    /// Paths of the currently staged certificate files, if any.
    pub async fn staged_certificate_paths(&self) -> Option<CertificatePaths> {
        self.inner
            .certs
            .lock()
            .await
            .as_ref()
            .map(StagedCertificates::paths)
    }

    // ── Private helpers ──────────────────────────────────────────────

    async fn stage_certificates(&self) -> Result<CertificatePaths, CoreError> {
        let mut certs = self.inner.certs.lock().await;
        if let Some(previous) = certs.take() {
            previous.cleanup();
        }
        let staged = StagedCertificates::stage_blocking(self.inner.config.certificate_bundle())
            .await
            .map_err(CoreError::from)?;
        let paths = staged.paths();
        debug!(ca = %paths.ca.display(), "certificates staged");
        *certs = Some(staged);
        Ok(paths)
    }

    /// Check the state up to `connect_attempts` times, sleeping
    /// `poll_interval` between checks.
    async fn wait_connected(&self, cancel: &CancellationToken) -> bool {
        for attempt in 0..self.inner.options.connect_attempts {
            if self.is_connected() {
                return true;
            }
            debug!(attempt, "waiting for CONNACK");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return false,
                () = tokio::time::sleep(self.inner.options.poll_interval) => {}
            }
        }
        self.is_connected()
    }

    async fn abort_setup(&self, session: &mut Option<Box<dyn BrokerSession>>) {
        if let Some(opened) = session.take() {
            opened.close();
        }
        self.inner.dispatcher.store(None);
        if let Some(staged) = self.inner.certs.lock().await.take() {
            staged.cleanup();
        }
        self.inner.state.send_replace(ConnectionState::Unconnected);
        warn!(address = %self.inner.config.address(), "setup failed, session torn down");
    }

    fn communication_error(&self, reason: impl Into<String>) -> CoreError {
        CoreError::Communication {
            host: self.inner.config.host.clone(),
            port: self.inner.config.port,
            reason: reason.into(),
        }
    }

    fn transport_error(&self, err: eaton_ups_api::Error) -> CoreError {
        match CoreError::from(err) {
            CoreError::Communication { reason, .. } => self.communication_error(reason),
            other => other,
        }
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(session) = self.session.get_mut().take() {
            session.close();
        }
    }
}

// ── Link events ──────────────────────────────────────────────────────

/// Network-loop side of the client. Holds only a weak reference so a
/// dropped client is not kept alive by its own session.
struct LinkEvents {
    inner: Weak<ClientInner>,
    cancel: CancellationToken,
}

impl LinkEvents {
    fn live(&self) -> Option<Arc<ClientInner>> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.inner.upgrade()
    }
}

impl LinkHandler for LinkEvents {
    fn on_connect(&self, outcome: ConnectOutcome, session: &dyn BrokerSession) {
        let Some(inner) = self.live() else { return };

        match outcome {
            ConnectOutcome::Accepted => {
                inner.last_refusal.store(None);
                inner.last_link_error.store(None);
                inner.state.send_replace(ConnectionState::Connected);
                // The broker forgets subscriptions across reconnects.
                if let Err(e) = session.subscribe(&SUBSCRIPTIONS) {
                    warn!(error = %e, "subscribe failed");
                } else {
                    debug!(filters = ?SUBSCRIPTIONS, "subscribed");
                }
            }
            ConnectOutcome::Refused(reason) => {
                warn!(reason = %reason, "broker refused connection");
                inner.last_refusal.store(Some(Arc::new(reason)));
                inner.state.send_if_modified(|state| {
                    if *state == ConnectionState::Connected {
                        *state = ConnectionState::Connecting;
                        true
                    } else {
                        false
                    }
                });
            }
        }
    }

    fn on_message(&self, topic: &str, payload: &[u8]) {
        let Some(inner) = self.live() else { return };

        if let Some(snapshot) = inner.ingestor.handle(topic, payload) {
            if let Some(dispatcher) = inner.dispatcher.load_full() {
                dispatcher.notify(snapshot);
            }
        }
    }

    fn on_disconnect(&self, reason: &str) {
        let Some(inner) = self.live() else { return };
        inner.last_link_error.store(Some(Arc::new(reason.to_string())));

        let dropped = inner.state.send_if_modified(|state| {
            if *state == ConnectionState::Connected {
                *state = ConnectionState::Connecting;
                true
            } else {
                false
            }
        });
        if dropped {
            info!(reason, "connection lost, reconnecting");
        }
    }
}
