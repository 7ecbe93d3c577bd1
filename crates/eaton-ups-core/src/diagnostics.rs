// ── Diagnostics bundle ──
//
// Everything needed to debug a card remotely, minus key material and
// serial numbers.

use serde::Serialize;
use serde_json::{Value, json};

use crate::config::ConnectionConfig;
use crate::store::TopicSnapshot;
use crate::topic::MQTT_PREFIX;

pub const REDACTED: &str = "**REDACTED**";

/// Config fields never exported.
pub const CONFIG_TO_REDACT: [&str; 3] = ["server_cert", "client_cert", "client_key"];

/// Topic payload fields never exported.
pub const DATA_TO_REDACT: [&str; 1] = ["serialNumber"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub config: Value,
    pub mqtt_prefix: &'static str,
    pub topic_data: Value,
}

impl Diagnostics {
    pub fn collect(config: &ConnectionConfig, snapshot: &TopicSnapshot) -> Self {
        let mut config_value = json!({
            "host": config.host,
            "port": config.port,
            "server_cert": config.server_cert,
            "client_cert": config.client_cert,
            "client_key": REDACTED,
        });
        redact(&mut config_value, &CONFIG_TO_REDACT);

        let mut topic_data = snapshot.to_value();
        redact(&mut topic_data, &DATA_TO_REDACT);

        Self {
            config: config_value,
            mqtt_prefix: MQTT_PREFIX,
            topic_data,
        }
    }
}

/// Replace the value of every object key in `keys`, at any depth.
pub fn redact(value: &mut Value, keys: &[&str]) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if keys.contains(&key.as_str()) {
                    *child = Value::String(REDACTED.to_string());
                } else {
                    redact(child, keys);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact(item, keys);
            }
        }
        _ => {}
    }
}
