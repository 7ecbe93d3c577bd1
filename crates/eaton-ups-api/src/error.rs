use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the `eaton-ups-api` crate.
///
/// Covers certificate staging, broker connection, and request submission.
/// `eaton-ups-core` maps these into its own communication / client errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Certificate staging ─────────────────────────────────────────
    /// Writing a PEM blob to a temporary file failed.
    #[error("Failed to stage certificate files: {source}")]
    Staging {
        #[source]
        source: std::io::Error,
    },

    /// A staged certificate file could not be read back.
    #[error("Failed to read certificate file {}: {source}", path.display())]
    Certificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Connection ──────────────────────────────────────────────────
    /// The broker could not be reached or refused the session.
    #[error("MQTT connection failed: {0}")]
    Connect(String),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Requests ────────────────────────────────────────────────────
    /// The request could not be queued for the network loop.
    #[error("MQTT request rejected: {0}")]
    Request(#[from] rumqttc::ClientError),

    /// The session was closed before the request was issued.
    #[error("MQTT session closed")]
    Closed,
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Request(_))
    }
}

impl From<rumqttc::ConnectionError> for Error {
    fn from(err: rumqttc::ConnectionError) -> Self {
        match err {
            rumqttc::ConnectionError::Tls(e) => Self::Tls(e.to_string()),
            other => Self::Connect(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_errors_are_transient() {
        assert!(Error::Connect("refused".into()).is_transient());
        assert!(!Error::Tls("bad certificate".into()).is_transient());
        assert!(!Error::Closed.is_transient());
    }

    #[test]
    fn staging_error_keeps_io_cause() {
        let err = Error::Staging {
            source: std::io::Error::other("disk full"),
        };
        assert!(!err.is_transient());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn connection_errors_fold_into_connect() {
        let err = Error::from(rumqttc::ConnectionError::NetworkTimeout);
        assert!(matches!(err, Error::Connect(_)), "{err:?}");
        assert!(err.is_transient());
    }
}
