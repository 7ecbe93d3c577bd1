// ── Topic namespace ──
//
// Every topic the card publishes lives under one fixed prefix. Storage keys
// are the prefix-stripped remainder, e.g. `powerDistributions/1/status`.
// Entity tables address individual scalars inside those payloads with a
// `FieldPath`.

use std::fmt;

/// Literal prefix shared by every topic on the card's broker.
pub const MQTT_PREFIX: &str = "mbdetnrs/1.0/";

/// Topic filters subscribed on every (re)connect.
pub const SUBSCRIPTIONS: [&str; 2] = [
    "mbdetnrs/1.0/managers/#",
    "mbdetnrs/1.0/powerDistributions/#",
];

/// Command topic, prefix included.
pub const COMMAND_TOPIC: &str = "mbdetnrs/1.0/powerDistributions/1/command";

/// Storage key carrying the management card's identity.
pub const MANAGER_IDENTIFICATION: &str = "managers/1/identification";

/// Storage key carrying the UPS identity.
pub const UPS_IDENTIFICATION: &str = "powerDistributions/1/identification";

/// Strip [`MQTT_PREFIX`]. Topics without the prefix are returned unchanged.
pub fn strip_prefix(topic: &str) -> &str {
    topic.strip_prefix(MQTT_PREFIX).unwrap_or(topic)
}

/// Address of one value inside the topic store.
///
/// Two spellings are accepted:
/// - `topic$field/path`: explicit topic key, then fields inside its payload
/// - `a/b/c`: slash-only; the longest topic key that prefixes the path is
///   used and the remaining segments are walked as fields
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Topic { topic: String, fields: Vec<String> },
    Nested(Vec<String>),
}

impl FieldPath {
    pub fn parse(key: &str) -> Self {
        match key.split_once('$') {
            Some((topic, fields)) => Self::Topic {
                topic: topic.to_string(),
                fields: split_segments(fields),
            },
            None => Self::Nested(split_segments(key)),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topic { topic, fields } => write!(f, "{topic}${}", fields.join("/")),
            Self::Nested(segments) => f.write_str(&segments.join("/")),
        }
    }
}

fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
