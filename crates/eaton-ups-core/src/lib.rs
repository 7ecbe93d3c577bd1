// eaton-ups-core: topic store, connection lifecycle and entity model
// between eaton-ups-api and its consumers.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod device;
pub mod diagnostics;
pub mod entity;
pub mod error;
pub mod ingest;
pub mod probe;
pub mod store;
pub mod stream;
pub mod subscribers;
pub mod topic;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::{ConnectionState, UpsClient};
pub use config::{ClientOptions, ConnectionConfig, DEFAULT_PORT};
pub use coordinator::Coordinator;
pub use device::DeviceInfo;
pub use diagnostics::{Diagnostics, redact};
pub use error::{CoreError, ErrorCategory, UpdateError};
pub use ingest::{IngestError, Ingestor};
pub use probe::{Identification, PROBE_TIMEOUT, ProbeOutcome, probe_identification};
pub use store::{TopicSnapshot, TopicStore};
pub use stream::TopicStream;
pub use subscribers::{SubscriberRegistry, Subscription, SubscriptionId, UpdateCallback};
pub use topic::{FieldPath, MQTT_PREFIX, strip_prefix};

// Transport types consumers need for custom connectors and tests.
pub use eaton_ups_api::{
    BrokerSession, CertificatePaths, ConnectOutcome, Connector, LinkHandler, ReconnectConfig,
    SessionOptions,
};
