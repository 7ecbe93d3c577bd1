//! MQTT session over mutual TLS with auto-reconnect.
//!
//! Connects to the broker embedded in an Eaton network management card,
//! drives the rumqttc event loop on a background task, and reports
//! connect / message / disconnect events to a [`LinkHandler`]. Handles
//! reconnection with exponential backoff + jitter automatically.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use eaton_ups_api::{Connector, MqttConnector, SessionOptions, StagedCertificates};
//!
//! let staged = StagedCertificates::stage_blocking(bundle).await?;
//! let options = SessionOptions::new("eaton-ups-1", "ups.local", 8883, staged.paths());
//!
//! let session = MqttConnector.open(options, Arc::new(MyHandler)).await?;
//! // ... handler.on_connect fires once the CONNACK arrives
//! session.close();
//! staged.cleanup();
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS, SubscribeFilter, Transport,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::certs::CertificatePaths;
use crate::error::Error;
use crate::session::{BrokerSession, ConnectOutcome, Connector, LinkHandler, SessionOptions};

// ── Shutdown flush window ────────────────────────────────────────────

const DISCONNECT_FLUSH: Duration = Duration::from_millis(500);

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for broker reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

// ── MqttConnector ────────────────────────────────────────────────────

/// Production [`Connector`] backed by rumqttc (MQTT 3.1.1, rustls).
///
/// Server verification is always on: the broker must present a chain
/// rooted in the staged CA, and the client authenticates with the staged
/// certificate and key. There is no switch to relax either side.
#[derive(Debug, Clone, Copy, Default)]
pub struct MqttConnector;

impl Connector for MqttConnector {
    fn open(
        &self,
        options: SessionOptions,
        handler: Arc<dyn LinkHandler>,
    ) -> BoxFuture<'_, Result<Box<dyn BrokerSession>, Error>> {
        Box::pin(async move {
            let transport = load_tls(&options.certificates).await?;

            let mut mqtt = MqttOptions::new(&options.client_id, &options.host, options.port);
            mqtt.set_keep_alive(options.keep_alive);
            mqtt.set_clean_session(true);
            mqtt.set_transport(transport);

            let (client, eventloop) = AsyncClient::new(mqtt, options.request_capacity);
            let session = MqttSession {
                client,
                cancel: CancellationToken::new(),
            };

            tokio::spawn(event_loop(
                eventloop,
                session.clone(),
                handler,
                options.reconnect,
            ));

            info!(
                host = %options.host,
                port = options.port,
                client_id = %options.client_id,
                "MQTT session opened (handshake in progress)"
            );
            Ok(Box::new(session) as Box<dyn BrokerSession>)
        })
    }
}

/// Read the staged PEM files into a rustls transport.
///
/// rumqttc only parses the PEM material when the first handshake starts,
/// so it is checked here and a bad blob fails `open` with [`Error::Tls`].
async fn load_tls(paths: &CertificatePaths) -> Result<Transport, Error> {
    let ca = read_pem(&paths.ca).await?;
    let client_cert = read_pem(&paths.client_cert).await?;
    let client_key = read_pem(&paths.client_key).await?;

    check_certificates("server CA", &ca)?;
    check_certificates("client certificate", &client_cert)?;
    check_private_key(&client_key)?;

    Ok(Transport::tls(ca, Some((client_cert, client_key)), None))
}

fn check_certificates(what: &str, pem: &[u8]) -> Result<(), Error> {
    let mut reader = pem;
    let mut found = 0usize;
    for cert in rustls_pemfile::certs(&mut reader) {
        cert.map_err(|e| Error::Tls(format!("{what}: {e}")))?;
        found += 1;
    }
    if found == 0 {
        return Err(Error::Tls(format!("{what}: no PEM certificate found")));
    }
    Ok(())
}

fn check_private_key(pem: &[u8]) -> Result<(), Error> {
    let mut reader = pem;
    match rustls_pemfile::private_key(&mut reader) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(Error::Tls("client key: no PEM private key found".into())),
        Err(e) => Err(Error::Tls(format!("client key: {e}"))),
    }
}

async fn read_pem(path: &Path) -> Result<Vec<u8>, Error> {
    tokio::fs::read(path)
        .await
        .map_err(|source| Error::Certificate {
            path: path.to_path_buf(),
            source,
        })
}

// ── MqttSession ──────────────────────────────────────────────────────

/// Handle to a running rumqttc client. Cheap to clone.
#[derive(Clone)]
struct MqttSession {
    client: AsyncClient,
    cancel: CancellationToken,
}

impl BrokerSession for MqttSession {
    fn subscribe(&self, filters: &[&str]) -> Result<(), Error> {
        let filters = filters
            .iter()
            .map(|f| SubscribeFilter::new((*f).to_string(), QoS::AtMostOnce));
        self.client.try_subscribe_many(filters)?;
        Ok(())
    }

    fn publish(&self, topic: &str, payload: Bytes) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Closed);
        }
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, Vec::from(payload))?;
        Ok(())
    }

    fn close(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        if let Err(e) = self.client.try_disconnect() {
            debug!(error = %e, "could not queue DISCONNECT");
        }
        self.cancel.cancel();
    }
}

// ── Background network loop ──────────────────────────────────────────

/// Main loop: poll → dispatch → on error, backoff → poll again.
///
/// rumqttc re-establishes the connection on the next `poll()` after an
/// error, so reconnecting is just a matter of waiting and polling.
async fn event_loop(
    mut eventloop: EventLoop,
    session: MqttSession,
    handler: Arc<dyn LinkHandler>,
    reconnect: ReconnectConfig,
) {
    let cancel = session.cancel.clone();
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                flush_disconnect(&mut eventloop).await;
                break;
            }
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        if ack.code == ConnectReturnCode::Success {
                            info!(session_present = ack.session_present, "MQTT connected");
                            attempt = 0;
                            handler.on_connect(ConnectOutcome::Accepted, &session);
                        } else {
                            warn!(code = ?ack.code, "MQTT connection refused");
                            let reason = format!("{:?}", ack.code);
                            handler.on_connect(ConnectOutcome::Refused(reason), &session);
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        handler.on_message(&publish.topic, &publish.payload);
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        info!("broker sent DISCONNECT");
                        handler.on_disconnect("broker sent DISCONNECT");
                    }
                    Ok(_) => {
                        // Pings, acks, outgoing notifications
                    }
                    Err(ConnectionError::ConnectionRefused(code)) => {
                        warn!(code = ?code, attempt, "MQTT connection refused");
                        handler.on_connect(ConnectOutcome::Refused(format!("{code:?}")), &session);
                        let Some(next) = backoff(attempt, &reconnect, &cancel).await else {
                            break;
                        };
                        attempt = next;
                    }
                    Err(e) => {
                        let err = Error::from(e);
                        if err.is_transient() {
                            warn!(error = %err, attempt, "MQTT connection error");
                        } else {
                            error!(error = %err, attempt, "MQTT link failed");
                        }
                        handler.on_disconnect(&err.to_string());
                        let Some(next) = backoff(attempt, &reconnect, &cancel).await else {
                            break;
                        };
                        attempt = next;
                    }
                }
            }
        }
    }

    debug!("MQTT loop exiting");
}

/// Sleep out the backoff for `attempt`. `None` when cancelled meanwhile.
async fn backoff(
    attempt: u32,
    reconnect: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<u32> {
    let delay = calculate_backoff(attempt, reconnect);
    info!(
        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        attempt,
        "Waiting before reconnect"
    );

    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        () = tokio::time::sleep(delay) => Some(attempt.saturating_add(1)),
    }
}

/// Give a queued DISCONNECT a brief window to reach the wire.
async fn flush_disconnect(eventloop: &mut EventLoop) {
    let drain = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };
    if tokio::time::timeout(DISCONNECT_FLUSH, drain).await.is_err() {
        debug!("DISCONNECT not flushed before shutdown");
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% so several management cards rebooting together do not
/// reconnect in lockstep.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(16)).unwrap_or(16);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
