// ── Device identity ──

use serde::Serialize;
use serde_json::Value;

use crate::store::TopicSnapshot;
use crate::topic::{FieldPath, MANAGER_IDENTIFICATION, UPS_IDENTIFICATION};

const FALLBACK_MODEL: &str = "Eaton UPS";

/// Identity of one UPS, as shown in device registries and `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub sw_version: Option<String>,
    pub mac_address: Option<String>,
}

impl DeviceInfo {
    pub fn from_snapshot(host: &str, snapshot: &TopicSnapshot) -> Self {
        let ups = |field: &str| text_field(snapshot, UPS_IDENTIFICATION, field);

        Self {
            name: format!("Eaton UPS ({host})"),
            manufacturer: "Eaton".to_string(),
            model: ups("model").unwrap_or_else(|| FALLBACK_MODEL.to_string()),
            serial_number: ups("serialNumber"),
            sw_version: ups("firmwareVersion"),
            mac_address: text_field(snapshot, MANAGER_IDENTIFICATION, "macAddress"),
        }
    }
}

/// Non-empty string at `topic$field`.
fn text_field(snapshot: &TopicSnapshot, topic: &str, field: &str) -> Option<String> {
    let path = FieldPath::Topic {
        topic: topic.to_string(),
        fields: vec![field.to_string()],
    };
    match snapshot.lookup(&path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
