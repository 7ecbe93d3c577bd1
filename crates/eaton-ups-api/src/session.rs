// ── Broker session seam ──
//
// The connection manager talks to the broker only through these traits.
// `MqttConnector` is the production implementation; tests substitute a
// scripted connector so lifecycle logic runs without a live broker.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;

use crate::certs::CertificatePaths;
use crate::error::Error;
use crate::mqtt::ReconnectConfig;

const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);
const DEFAULT_REQUEST_CAPACITY: usize = 16;

/// Result of a connection handshake as reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Accepted,
    /// CONNACK carried a non-success return code.
    Refused(String),
}

impl ConnectOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Parameters for opening one broker session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub client_id: String,
    pub host: String,
    pub port: u16,
    pub keep_alive: Duration,
    /// Staged PEM files the TLS configuration is read from.
    pub certificates: CertificatePaths,
    pub reconnect: ReconnectConfig,
    /// Bound on queued outgoing requests.
    pub request_capacity: usize,
}

impl SessionOptions {
    pub fn new(
        client_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        certificates: CertificatePaths,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            host: host.into(),
            port,
            keep_alive: DEFAULT_KEEP_ALIVE,
            certificates,
            reconnect: ReconnectConfig::default(),
            request_capacity: DEFAULT_REQUEST_CAPACITY,
        }
    }
}

/// Receives link events from the network loop.
///
/// Every method runs on the network loop task. Implementations must return
/// quickly and must not block; anything heavier belongs on another task.
pub trait LinkHandler: Send + Sync + 'static {
    /// A CONNACK arrived (or the broker refused the session).
    fn on_connect(&self, outcome: ConnectOutcome, session: &dyn BrokerSession);

    /// An application message arrived on a subscribed topic.
    fn on_message(&self, topic: &str, payload: &[u8]);

    /// The link dropped. Reconnection is handled by the loop itself.
    fn on_disconnect(&self, reason: &str);
}

/// A live broker session. All requests are queued without blocking.
pub trait BrokerSession: Send + Sync {
    /// Subscribe to each filter at QoS 0.
    fn subscribe(&self, filters: &[&str]) -> Result<(), Error>;

    /// Publish at QoS 0, not retained.
    fn publish(&self, topic: &str, payload: Bytes) -> Result<(), Error>;

    /// Send DISCONNECT and stop the network loop. Idempotent.
    fn close(&self);
}

/// Opens broker sessions.
///
/// `open` returns as soon as the network loop is running; the handshake
/// completes asynchronously and is reported through [`LinkHandler::on_connect`].
pub trait Connector: Send + Sync + 'static {
    fn open(
        &self,
        options: SessionOptions,
        handler: Arc<dyn LinkHandler>,
    ) -> BoxFuture<'_, Result<Box<dyn BrokerSession>, Error>>;
}
