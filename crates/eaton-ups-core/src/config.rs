// ── Runtime connection configuration ──
//
// These types describe *how* to reach one UPS management card. They carry
// PEM material and connection tuning, but never touch disk. The CLI builds
// a `ConnectionConfig` from its profile and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use eaton_ups_api::{CertificateBundle, ReconnectConfig};

/// Default MQTT-over-TLS port of the Network-M2/M3 card.
pub const DEFAULT_PORT: u16 = 8883;

/// Broker address and mutual-TLS material. Immutable once built.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// CA certificate (PEM) used to verify the card's broker.
    pub server_cert: String,
    /// Client certificate (PEM) registered on the card.
    pub client_cert: String,
    /// Client private key (PEM).
    pub client_key: SecretString,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        server_cert: impl Into<String>,
        client_cert: impl Into<String>,
        client_key: SecretString,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            server_cert: server_cert.into(),
            client_cert: client_cert.into(),
            client_key,
        }
    }

    /// `host:port`, as used in error messages and logs.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn certificate_bundle(&self) -> CertificateBundle {
        CertificateBundle {
            server_ca: self.server_cert.clone(),
            client_cert: self.client_cert.clone(),
            client_key: SecretString::from(self.client_key.expose_secret().to_owned()),
        }
    }
}

/// Connection tuning for [`UpsClient`](crate::UpsClient).
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// How many times `setup()` checks for an established connection.
    pub connect_attempts: u32,
    /// Pause between those checks. Worst-case setup latency is
    /// `connect_attempts * poll_interval`.
    pub poll_interval: Duration,
    /// MQTT keep-alive.
    pub keep_alive: Duration,
    /// Backoff bounds for automatic reconnection after a drop.
    pub reconnect: ReconnectConfig,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_attempts: 10,
            poll_interval: Duration::from_secs(1),
            keep_alive: Duration::from_secs(60),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl ClientOptions {
    /// Upper bound on how long `setup()` waits for the broker.
    pub fn connect_budget(&self) -> Duration {
        self.poll_interval * self.connect_attempts
    }
}
