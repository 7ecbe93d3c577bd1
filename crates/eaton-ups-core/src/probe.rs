// ── Identification probe ──
//
// One-shot connect used to validate a new profile: wait for the card's
// identification topic, read its MAC address, always disconnect.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::client::UpsClient;
use crate::error::{CoreError, ErrorCategory};
use crate::topic::MANAGER_IDENTIFICATION;

/// Default wait for the identification message after connecting.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    pub mac_address: Option<String>,
    /// Full `managers/1/identification` payload, if one arrived.
    pub raw: Option<Value>,
}

/// Classified probe result, as reported by an onboarding form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Identified { mac_address: String },
    Auth { message: String },
    Connection { message: String },
    Unknown { message: String },
    /// Connected, but no MAC address was published in time.
    CannotConnect,
}

impl ProbeOutcome {
    pub fn from_result(result: Result<Identification, CoreError>) -> Self {
        match result {
            Ok(Identification {
                mac_address: Some(mac_address),
                ..
            }) => Self::Identified { mac_address },
            Ok(_) => Self::CannotConnect,
            Err(e) => {
                let message = e.to_string();
                match e.category() {
                    ErrorCategory::Auth => Self::Auth { message },
                    ErrorCategory::Connection => Self::Connection { message },
                    ErrorCategory::Unknown => Self::Unknown { message },
                }
            }
        }
    }

    /// Form error key: `auth`, `connection`, `unknown` or `cannot_connect`.
    pub fn error_key(&self) -> Option<&'static str> {
        match self {
            Self::Identified { .. } => None,
            Self::Auth { .. } => Some("auth"),
            Self::Connection { .. } => Some("connection"),
            Self::Unknown { .. } => Some("unknown"),
            Self::CannotConnect => Some("cannot_connect"),
        }
    }
}

/// Connect, wait up to `timeout` for the identification topic, then
/// disconnect regardless of the outcome.
pub async fn probe_identification(
    client: &UpsClient,
    timeout: Duration,
) -> Result<Identification, CoreError> {
    let result = wait_for_identification(client, timeout).await;
    client.disconnect().await;
    result
}

async fn wait_for_identification(
    client: &UpsClient,
    timeout: Duration,
) -> Result<Identification, CoreError> {
    client.setup().await?;

    let mut updates = client.updates();
    let wait = async {
        let snapshot = updates
            .wait_for(|snap| snap.contains(MANAGER_IDENTIFICATION))
            .await?;
        snapshot.get(MANAGER_IDENTIFICATION).map(|raw| raw.as_ref().clone())
    };

    let raw = tokio::time::timeout(timeout, wait).await.ok().flatten();
    debug!(found = raw.is_some(), "identification probe finished");

    let mac_address = raw
        .as_ref()
        .and_then(|v| v.get("macAddress"))
        .and_then(Value::as_str)
        .map(String::from);

    Ok(Identification { mac_address, raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_keys_match_form_errors() {
        let ok = ProbeOutcome::from_result(Ok(Identification {
            mac_address: Some("00:20:85:AA:BB:CC".into()),
            raw: None,
        }));
        assert_eq!(ok.error_key(), None);

        let missing = ProbeOutcome::from_result(Ok(Identification {
            mac_address: None,
            raw: None,
        }));
        assert_eq!(missing.error_key(), Some("cannot_connect"));

        let conn = ProbeOutcome::from_result(Err(CoreError::Communication {
            host: "h".into(),
            port: 1,
            reason: "r".into(),
        }));
        assert_eq!(conn.error_key(), Some("connection"));

        let unknown = ProbeOutcome::from_result(Err(CoreError::Internal("x".into())));
        assert_eq!(unknown.error_key(), Some("unknown"));
    }
}
