//! `watch` and `dump`: live message capture.
//!
//! Both register an update callback before connecting so the retained
//! burst that follows SUBSCRIBE is not missed.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use eaton_ups_core::{TopicSnapshot, UpsClient};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Watch ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessageLine<'a> {
    received_at: DateTime<Utc>,
    topic: &'a str,
    payload: &'a Value,
}

/// Topics whose payload differs from `before`. Every stored message gets
/// a fresh `Arc`, so pointer inequality means "received since".
fn changed<'a>(before: &TopicSnapshot, after: &'a TopicSnapshot) -> Vec<(&'a str, &'a Arc<Value>)> {
    after
        .keys()
        .filter_map(|topic| {
            let payload = after.get(topic)?;
            match before.get(topic) {
                Some(old) if Arc::ptr_eq(old, payload) => None,
                _ => Some((topic, payload)),
            }
        })
        .collect()
}

fn format_line(format: &OutputFormat, topic: &str, payload: &Value, color: bool) -> String {
    match format {
        OutputFormat::Table | OutputFormat::Plain => {
            let time = Local::now().format("%H:%M:%S").to_string();
            let body = output::render_json_compact(payload);
            if color {
                format!("{} {} {body}", time.dimmed(), topic.cyan())
            } else {
                format!("{time} {topic} {body}")
            }
        }
        // One JSON document per line, whatever the structured format.
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_json_compact(&MessageLine {
                received_at: Utc::now(),
                topic,
                payload,
            })
        }
    }
}

pub async fn watch(
    client: &UpsClient,
    global: &GlobalOpts,
    count: Option<usize>,
) -> Result<(), CliError> {
    let mut previous = client.snapshot();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = client.subscribe_to_updates(move |snapshot: Arc<TopicSnapshot>| {
        let _ = tx.send(snapshot);
    });

    util::connect(client, global).await?;
    if !global.quiet {
        eprintln!("Watching {} (Ctrl-C to stop)", client.config().address());
    }

    let color = output::should_color(&global.color);
    let mut printed = 0usize;
    'outer: loop {
        let snapshot = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            next = rx.recv() => match next {
                Some(snapshot) => snapshot,
                None => break,
            },
        };

        for (topic, payload) in changed(&previous, &snapshot) {
            output::print_output(&format_line(&global.output, topic, payload, color), global.quiet);
            printed += 1;
            if count.is_some_and(|n| printed >= n) {
                break 'outer;
            }
        }
        previous = snapshot;
    }

    subscription.unsubscribe();
    tracing::debug!(printed, "watch finished");
    Ok(())
}

// ── Dump ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct DumpFile {
    captured_at: DateTime<Utc>,
    host: String,
    port: u16,
    duration_seconds: u64,
    message_count: usize,
    data: Arc<TopicSnapshot>,
}

pub async fn dump(
    client: &UpsClient,
    target: &Target,
    global: &GlobalOpts,
    duration: Duration,
    file: Option<&Path>,
) -> Result<(), CliError> {
    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    let subscription = client.subscribe_to_updates(move |_: Arc<TopicSnapshot>| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    util::connect(client, global).await?;

    let pb = util::spinner(
        global,
        format!("Capturing for {}", humantime::format_duration(duration)),
    );
    let interrupted = tokio::select! {
        () = tokio::time::sleep(duration) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    subscription.unsubscribe();

    let snapshot = client.snapshot();
    let dump = DumpFile {
        captured_at: Utc::now(),
        host: target.connection.host.clone(),
        port: target.connection.port,
        duration_seconds: duration.as_secs(),
        message_count: received.load(Ordering::Relaxed),
        data: Arc::clone(&snapshot),
    };
    let body = serde_json::to_string_pretty(&dump)?;

    match file {
        Some(path) => {
            std::fs::write(path, body)?;
            if !global.quiet {
                let note = if interrupted { " (interrupted)" } else { "" };
                eprintln!(
                    "✓ Wrote {} topics from {} messages to {}{note}",
                    snapshot.len(),
                    dump.message_count,
                    path.display()
                );
            }
        }
        None => output::print_output(&body, global.quiet),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snap(entries: &[(&str, &Arc<Value>)]) -> TopicSnapshot {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), Arc::clone(v)))
            .collect()
    }

    #[test]
    fn changed_reports_new_and_replaced_topics() {
        let a = Arc::new(json!({"v": 1}));
        let b = Arc::new(json!({"v": 2}));
        let b2 = Arc::new(json!({"v": 2}));

        let before = snap(&[("a", &a), ("b", &b)]);
        let after = snap(&[("a", &a), ("b", &b2), ("c", &a)]);

        let topics: Vec<_> = changed(&before, &after).into_iter().map(|(t, _)| t).collect();
        // Equal payloads still count: a new message arrived.
        assert_eq!(topics, vec!["b", "c"]);
    }

    #[test]
    fn structured_lines_are_single_json_documents() {
        let line = format_line(&OutputFormat::Json, "x/1", &json!({"ok": true}), false);
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["topic"], "x/1");
        assert_eq!(parsed["payload"]["ok"], true);
        assert!(!line.contains('\n'));
    }
}
