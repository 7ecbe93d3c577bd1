//! `status` and `diagnostics` handlers.

use std::fmt::Write as _;

use serde::Serialize;

use eaton_ups_core::entity::{EntityState, sensor_states};
use eaton_ups_core::{DeviceInfo, Diagnostics, UpsClient};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

use super::util;

/// Sensors shown on the status page, in display order.
const HEADLINE_KEYS: [&str; 8] = [
    "powerDistributions/1/status$operating",
    "powerDistributions/1/status$health",
    "powerDistributions/1/status$mode",
    "powerDistributions/1/backupSystem/powerBank/measures$stateOfCharge",
    "powerDistributions/1/backupSystem/powerBank/measures$remainingTime",
    "powerDistributions/1/inputs/1/measures$voltage",
    "powerDistributions/1/outputs/1/measures$activePower",
    "powerDistributions/1/outputs/1/measures$percentLoad",
];

#[derive(Debug, Serialize)]
struct StatusView {
    profile: String,
    address: String,
    device: DeviceInfo,
    topics: usize,
    readings: Vec<EntityState>,
}

fn detail(view: &StatusView, color: bool) -> String {
    let mut out = String::new();
    let d = &view.device;
    let line = |out: &mut String, name: &str, value: &str| {
        let _ = writeln!(out, "{:<22} {value}", output::label(name, color));
    };

    line(&mut out, "Device", &d.name);
    line(&mut out, "Model", &d.model);
    line(&mut out, "Serial", d.serial_number.as_deref().unwrap_or("-"));
    line(&mut out, "Firmware", d.sw_version.as_deref().unwrap_or("-"));
    line(&mut out, "Card MAC", d.mac_address.as_deref().unwrap_or("-"));
    line(&mut out, "Broker", &view.address);
    line(&mut out, "Topics", &view.topics.to_string());
    let _ = writeln!(out);
    for reading in &view.readings {
        let value = output::paint_state(&reading.display, color);
        match reading.unit {
            Some(ref unit) => line(&mut out, &reading.name, &format!("{value} {unit}")),
            None => line(&mut out, &reading.name, &value),
        }
    }
    out.trim_end().to_owned()
}

pub async fn handle(
    client: &UpsClient,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = util::identified_snapshot(client, target, global).await?;

    let all = sensor_states(&snapshot, false);
    let readings = HEADLINE_KEYS
        .iter()
        .filter_map(|key| all.iter().find(|s| s.key == *key).cloned())
        .collect();

    let view = StatusView {
        profile: target.profile_name.clone(),
        address: target.connection.address(),
        device: DeviceInfo::from_snapshot(&target.connection.host, &snapshot),
        topics: snapshot.len(),
        readings,
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| detail(v, color),
        |v| v.device.model.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn diagnostics(
    client: &UpsClient,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = util::identified_snapshot(client, target, global).await?;
    let bundle = Diagnostics::collect(&target.connection, &snapshot);

    // Table has no sensible shape here; fall back to pretty JSON.
    let format = match global.output {
        OutputFormat::Table | OutputFormat::Plain => &OutputFormat::Json,
        ref other => other,
    };
    let out = output::render_single(format, &bundle, |_| String::new(), |_| String::new());
    output::print_output(&out, global.quiet);
    Ok(())
}
