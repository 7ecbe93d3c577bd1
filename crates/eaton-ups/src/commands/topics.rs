//! `topics` and `get` handlers over raw topic payloads.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use eaton_ups_core::{FieldPath, UpsClient};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

use super::util;

const PAYLOAD_WIDTH: usize = 72;

#[derive(Debug, Serialize)]
struct TopicEntry {
    topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

#[derive(Tabled)]
struct TopicRow {
    #[tabled(rename = "Topic")]
    topic: String,
    #[tabled(rename = "Fields")]
    fields: String,
    #[tabled(rename = "Payload")]
    payload: String,
}

fn field_count(value: &Value) -> String {
    match value {
        Value::Object(map) => map.len().to_string(),
        _ => "-".into(),
    }
}

fn truncate(text: String) -> String {
    if text.chars().count() <= PAYLOAD_WIDTH {
        return text;
    }
    let mut cut: String = text.chars().take(PAYLOAD_WIDTH - 1).collect();
    cut.push('…');
    cut
}

pub async fn list(
    client: &UpsClient,
    target: &Target,
    global: &GlobalOpts,
    prefix: Option<&str>,
    values: bool,
) -> Result<(), CliError> {
    let snapshot = util::await_snapshot(client, global, target.timeout, |snap| !snap.is_empty())
        .await?
        .map_err(|_| CliError::Timeout {
            what: "the first topic".into(),
            seconds: target.timeout.as_secs(),
        })?;

    let entries: Vec<TopicEntry> = snapshot
        .iter()
        .filter(|(topic, _)| prefix.is_none_or(|p| topic.starts_with(p)))
        .map(|(topic, payload)| TopicEntry {
            topic: topic.to_owned(),
            payload: values.then(|| payload.clone()),
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &entries,
        |e| {
            let raw = snapshot.get(&e.topic);
            TopicRow {
                topic: e.topic.clone(),
                fields: raw.map_or_else(|| "-".into(), |v| field_count(v)),
                payload: e
                    .payload
                    .as_ref()
                    .map(|p| truncate(output::render_json_compact(p)))
                    .unwrap_or_default(),
            }
        },
        |e| match e.payload {
            Some(ref p) => format!("{} {}", e.topic, output::render_json_compact(p)),
            None => e.topic.clone(),
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn get(
    client: &UpsClient,
    target: &Target,
    global: &GlobalOpts,
    path: &str,
) -> Result<(), CliError> {
    let field = FieldPath::parse(path);
    let snapshot = match util::await_snapshot(client, global, target.timeout, |snap| {
        snap.lookup(&field).is_some()
    })
    .await?
    {
        Ok(snapshot) => snapshot,
        Err(last) if last.is_empty() => {
            return Err(CliError::Timeout {
                what: "the first topic".into(),
                seconds: target.timeout.as_secs(),
            });
        }
        Err(_) => {
            return Err(CliError::NotFound {
                resource_type: "field".into(),
                identifier: path.into(),
                list_command: "topics --values".into(),
            });
        }
    };

    let value = snapshot.lookup(&field).cloned().unwrap_or(Value::Null);
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => match value {
            Value::Object(_) | Value::Array(_) => output::render_json_pretty(&value),
            ref scalar => output::scalar_text(scalar),
        },
        ref format => output::render_single(format, &value, |_| String::new(), |_| String::new()),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn long_payloads_are_cut() {
        let long = "x".repeat(100);
        let cut = truncate(long);
        assert_eq!(cut.chars().count(), PAYLOAD_WIDTH);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate("short".into()), "short");
    }

    #[test]
    fn counts_object_fields() {
        assert_eq!(field_count(&json!({"a": 1, "b": 2})), "2");
        assert_eq!(field_count(&json!(3)), "-");
    }
}
