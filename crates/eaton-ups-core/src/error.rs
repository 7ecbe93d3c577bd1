// ── Core error types ──
//
// User-facing errors from eaton-ups-core. Consumers never see rumqttc or
// filesystem errors directly; the `From<eaton_ups_api::Error>` impl folds
// transport failures into the three categories the client exposes.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    /// The broker could not be reached within the attempt budget.
    #[error("Failed to connect to MQTT broker at {host}:{port}: {reason}")]
    Communication {
        host: String,
        port: u16,
        reason: String,
    },

    /// Reserved for credential-specific rejection.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Client errors ────────────────────────────────────────────────
    /// Catch-all: operation on a missing session, staging failure, etc.
    #[error("Client error: {message}")]
    Client { message: String },

    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Timed out after {timeout_secs}s waiting for {what}")]
    Timeout { what: String, timeout_secs: u64 },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure category, as shown on an onboarding form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Auth,
    Connection,
    Unknown,
}

impl CoreError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication { .. } => ErrorCategory::Auth,
            Self::Communication { .. } | Self::Timeout { .. } => ErrorCategory::Connection,
            Self::Client { .. } | Self::Validation { .. } | Self::Internal(_) => {
                ErrorCategory::Unknown
            }
        }
    }

    pub(crate) fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<eaton_ups_api::Error> for CoreError {
    fn from(err: eaton_ups_api::Error) -> Self {
        match err {
            eaton_ups_api::Error::Staging { source } => CoreError::Client {
                message: format!("failed to stage certificate files: {source}"),
            },
            eaton_ups_api::Error::Certificate { path, source } => CoreError::Client {
                message: format!("failed to read {}: {source}", path.display()),
            },
            eaton_ups_api::Error::Connect(reason) => CoreError::Communication {
                host: String::new(),
                port: 0,
                reason,
            },
            eaton_ups_api::Error::Tls(reason) => CoreError::Communication {
                host: String::new(),
                port: 0,
                reason: format!("TLS setup failed: {reason}"),
            },
            eaton_ups_api::Error::Request(e) => CoreError::Client {
                message: format!("MQTT request rejected: {e}"),
            },
            eaton_ups_api::Error::Closed => CoreError::client("MQTT session closed"),
        }
    }
}

/// Failure signal of the update coordinator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpdateError {
    /// Credentials were rejected; the user must reconfigure.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Data could not be fetched; entities become unavailable.
    #[error("Update failed: {0}")]
    UpdateFailed(String),
}

impl From<CoreError> for UpdateError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { message } => Self::AuthFailed(message),
            other => Self::UpdateFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn communication_error_names_host_and_port() {
        let err = CoreError::Communication {
            host: "ups.local".into(),
            port: 8883,
            reason: "no CONNACK".into(),
        };
        assert!(err.to_string().contains("ups.local:8883"));
        assert_eq!(err.category(), ErrorCategory::Connection);
    }

    #[test]
    fn categories_match_form_errors() {
        let auth = CoreError::Authentication {
            message: "bad cert".into(),
        };
        assert_eq!(auth.category().to_string(), "auth");
        assert_eq!(CoreError::client("x").category().to_string(), "unknown");
    }

    #[test]
    fn update_error_distinguishes_auth() {
        let auth: UpdateError = CoreError::Authentication {
            message: "rejected".into(),
        }
        .into();
        assert_eq!(auth, UpdateError::AuthFailed("rejected".into()));

        let other: UpdateError = CoreError::client("no session").into();
        assert!(matches!(other, UpdateError::UpdateFailed(_)));
    }

    #[test]
    fn tls_errors_become_communication() {
        let err: CoreError = eaton_ups_api::Error::Tls("unknown issuer".into()).into();
        assert!(matches!(err, CoreError::Communication { .. }));
    }
}
