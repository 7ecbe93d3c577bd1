use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::topic::FieldPath;

/// Immutable, ordered view of the topic store at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TopicSnapshot {
    topics: BTreeMap<String, Arc<Value>>,
}

impl TopicSnapshot {
    pub fn get(&self, key: &str) -> Option<&Arc<Value>> {
        self.topics.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.topics.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.topics.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// True when any stored key starts with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.topics
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .next()
            .is_some_and(|(k, _)| k.starts_with(prefix))
    }

    /// Resolve a [`FieldPath`] to a single value.
    ///
    /// Returns `None` when the topic is absent, any field segment is
    /// missing, or a non-object is traversed.
    pub fn lookup(&self, path: &FieldPath) -> Option<&Value> {
        match path {
            FieldPath::Topic { topic, fields } => {
                walk(self.topics.get(topic)?, fields.iter().map(String::as_str))
            }
            FieldPath::Nested(segments) => {
                // Longest topic key that is a whole-segment prefix of the path.
                (1..=segments.len()).rev().find_map(|split| {
                    let topic = segments[..split].join("/");
                    let value = self.topics.get(&topic)?;
                    walk(value, segments[split..].iter().map(String::as_str))
                })
            }
        }
    }

    /// Plain JSON object keyed by topic.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.topics
                .iter()
                .map(|(k, v)| (k.clone(), (**v).clone()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Arc<Value>)> for TopicSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Arc<Value>)>>(iter: I) -> Self {
        Self {
            topics: iter.into_iter().collect(),
        }
    }
}

fn walk<'a, 'b>(root: &'a Value, fields: impl Iterator<Item = &'b str>) -> Option<&'a Value> {
    fields.fold(Some(root), |node, field| node?.as_object()?.get(field))
}
