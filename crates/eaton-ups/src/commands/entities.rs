//! `sensors`, `binary-sensors` and `switches` handlers.

use tabled::Tabled;

use eaton_ups_core::UpsClient;
use eaton_ups_core::entity::{EntityState, binary_sensor_states, sensor_states, switch_states};

use crate::cli::GlobalOpts;
use crate::config::Target;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "Sensor")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Category")]
    category: String,
}

#[derive(Tabled)]
struct FlagRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Class")]
    class: String,
}

fn sensor_row(s: &EntityState, color: bool) -> SensorRow {
    SensorRow {
        name: s.name.clone(),
        value: output::paint_state(&s.display, color),
        unit: s.unit.clone().unwrap_or_default(),
        category: s.category.clone().unwrap_or_default(),
    }
}

fn flag_row(s: &EntityState, color: bool) -> FlagRow {
    FlagRow {
        name: s.name.clone(),
        state: output::paint_state(&s.display, color),
        class: s.device_class.clone().unwrap_or_default(),
    }
}

/// `key=value` lines for scripts.
fn plain_line(s: &EntityState) -> String {
    format!("{}={}", s.key, s.display)
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn sensors(
    client: &UpsClient,
    target: &Target,
    global: &GlobalOpts,
    all: bool,
) -> Result<(), CliError> {
    let snapshot = util::identified_snapshot(client, target, global).await?;
    let rows = sensor_states(&snapshot, all);

    let color = output::should_color(&global.color);
    let out = output::render_list(&global.output, &rows, |s| sensor_row(s, color), plain_line);
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn binary_sensors(
    client: &UpsClient,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = util::identified_snapshot(client, target, global).await?;
    let rows = binary_sensor_states(&snapshot);

    let color = output::should_color(&global.color);
    let out = output::render_list(&global.output, &rows, |s| flag_row(s, color), plain_line);
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn switches(
    client: &UpsClient,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = util::identified_snapshot(client, target, global).await?;
    let rows = switch_states(&snapshot);

    let color = output::should_color(&global.color);
    let out = output::render_list(&global.output, &rows, |s| flag_row(s, color), plain_line);
    output::print_output(&out, global.quiet);
    Ok(())
}
