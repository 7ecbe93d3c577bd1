// ── Message ingestion ──
//
// Decode → strip prefix → overwrite. Runs on the network loop task, so
// `handle` must never panic or propagate: a bad payload is logged and the
// next message proceeds as normal.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{trace, warn};

use crate::store::{TopicSnapshot, TopicStore};
use crate::topic::strip_prefix;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes broker messages into a [`TopicStore`].
#[derive(Clone)]
pub struct Ingestor {
    store: Arc<TopicStore>,
}

impl Ingestor {
    pub fn new(store: Arc<TopicStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<TopicStore> {
        &self.store
    }

    /// Decode one message and store it at its prefix-stripped key.
    pub fn ingest(&self, topic: &str, payload: &[u8]) -> Result<Arc<TopicSnapshot>, IngestError> {
        let text = std::str::from_utf8(payload)?;
        let value: Value = serde_json::from_str(text)?;
        let key = strip_prefix(topic);
        trace!(topic = key, bytes = payload.len(), "ingested message");
        Ok(self.store.insert(key, value))
    }

    /// Like [`ingest`](Self::ingest), but absorbs every failure.
    pub fn handle(&self, topic: &str, payload: &[u8]) -> Option<Arc<TopicSnapshot>> {
        match self.ingest(topic, payload) {
            Ok(snap) => Some(snap),
            Err(e) => {
                warn!(topic, error = %e, "dropping undecodable MQTT message");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ingestor() -> Ingestor {
        Ingestor::new(Arc::new(TopicStore::new()))
    }

    #[test]
    fn identification_message_lands_at_stripped_key() {
        let ingestor = ingestor();
        let snap = ingestor
            .ingest(
                "mbdetnrs/1.0/managers/1/identification",
                br#"{"serialNumber": "ABC123"}"#,
            )
            .unwrap();

        assert_eq!(
            snap.get("managers/1/identification").map(|v| (**v).clone()),
            Some(json!({"serialNumber": "ABC123"}))
        );
    }

    #[test]
    fn second_message_replaces_first() {
        let ingestor = ingestor();
        let topic = "mbdetnrs/1.0/powerDistributions/1/status";
        ingestor.ingest(topic, br#"{"operating": "inService", "health": "ok"}"#).unwrap();
        ingestor.ingest(topic, br"[1, 2, 3]").unwrap();

        let stored = ingestor.store().get("powerDistributions/1/status").unwrap();
        assert_eq!(*stored, json!([1, 2, 3]));
    }

    #[test]
    fn malformed_json_leaves_store_unchanged() {
        let ingestor = ingestor();
        let topic = "mbdetnrs/1.0/powerDistributions/1/status";
        ingestor.ingest(topic, br#"{"health": "ok"}"#).unwrap();

        assert!(ingestor.handle(topic, b"{not json").is_none());
        assert!(matches!(
            ingestor.ingest(topic, b"{not json"),
            Err(IngestError::Json(_))
        ));
        let stored = ingestor.store().get("powerDistributions/1/status").unwrap();
        assert_eq!(*stored, json!({"health": "ok"}));
        assert_eq!(ingestor.store().version(), 1);
    }

    #[test]
    fn invalid_utf8_is_absorbed() {
        let ingestor = ingestor();
        assert!(ingestor.handle("mbdetnrs/1.0/x", &[0xff, 0xfe]).is_none());
        assert!(ingestor.store().is_empty());
    }

    #[test]
    fn unprefixed_topic_is_stored_verbatim() {
        let ingestor = ingestor();
        ingestor.ingest("other/topic", b"true").unwrap();
        assert!(ingestor.store().get("other/topic").is_some());
    }
}
