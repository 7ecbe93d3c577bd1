//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use eaton_ups_core::topic::UPS_IDENTIFICATION;
use eaton_ups_core::{TopicSnapshot, UpsClient};

use crate::cli::GlobalOpts;
use crate::config::Target;
use crate::error::CliError;

/// Quiet period after which a retained-message burst counts as delivered.
const SETTLE: Duration = Duration::from_millis(300);

/// Stderr spinner, only when someone is watching.
pub fn spinner(global: &GlobalOpts, message: String) -> Option<ProgressBar> {
    if global.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Open the session, with a spinner while the broker answers.
pub async fn connect(client: &UpsClient, global: &GlobalOpts) -> Result<(), CliError> {
    let pb = spinner(global, format!("Connecting to {}", client.config().address()));
    let result = client.setup().await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(result?)
}

/// Connect, then wait up to `timeout` for `ready` to hold on the topic
/// snapshot and for the retained burst to go quiet.
///
/// `Err` carries the last snapshot seen when the deadline passed first.
pub async fn await_snapshot<F>(
    client: &UpsClient,
    global: &GlobalOpts,
    timeout: Duration,
    ready: F,
) -> Result<Result<Arc<TopicSnapshot>, Arc<TopicSnapshot>>, CliError>
where
    F: Fn(&TopicSnapshot) -> bool,
{
    connect(client, global).await?;

    let pb = spinner(global, "Waiting for telemetry".into());
    let mut updates = client.updates();
    let wait = async {
        updates.wait_for(&ready).await?;
        Some(updates.settle(SETTLE).await)
    };
    let result = tokio::time::timeout(timeout, wait).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    Ok(match result {
        Ok(Some(snapshot)) => {
            tracing::debug!(topics = snapshot.len(), "telemetry ready");
            Ok(snapshot)
        }
        _ => Err(client.snapshot()),
    })
}

/// Snapshot that includes the UPS identification topic, or a timeout.
pub async fn identified_snapshot(
    client: &UpsClient,
    target: &Target,
    global: &GlobalOpts,
) -> Result<Arc<TopicSnapshot>, CliError> {
    await_snapshot(client, global, target.timeout, |snap| {
        snap.contains(UPS_IDENTIFICATION)
    })
    .await?
    .map_err(|_| CliError::Timeout {
        what: "UPS identification".into(),
        seconds: target.timeout.as_secs(),
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
