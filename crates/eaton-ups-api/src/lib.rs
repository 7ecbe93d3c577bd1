// eaton-ups-api: Mutual-TLS MQTT transport for Eaton UPS network management cards

pub mod certs;
pub mod error;
pub mod mqtt;
pub mod session;

pub use certs::{CertificateBundle, CertificatePaths, StagedCertificates};
pub use error::Error;
pub use mqtt::{MqttConnector, ReconnectConfig};
pub use session::{BrokerSession, ConnectOutcome, Connector, LinkHandler, SessionOptions};
