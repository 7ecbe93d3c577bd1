// ── Entity state rows ──
//
// Flattened, render-ready view of every entity against one snapshot.

use serde::Serialize;
use serde_json::Value;

use crate::store::TopicSnapshot;

use super::binary_sensor::binary_sensor_descriptions;
use super::description::{SensorDescription, unit};
use super::sensor::sensor_descriptions;
use super::switch::SWITCHES;
use super::value::SensorValue;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub key: String,
    pub name: String,
    /// `None` when the path is missing or the value failed conversion.
    pub value: Option<Value>,
    /// Human-readable value with display precision and unit applied.
    pub display: String,
    pub unit: Option<String>,
    pub device_class: Option<String>,
    pub category: Option<String>,
}

impl EntityState {
    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

/// Sensor rows in table order. With `include_missing == false`, sensors
/// whose path is absent are skipped.
pub fn sensor_states(snapshot: &TopicSnapshot, include_missing: bool) -> Vec<EntityState> {
    sensor_descriptions(snapshot)
        .iter()
        .map(|desc| sensor_state(desc, snapshot))
        .filter(|row| include_missing || row.is_available())
        .collect()
}

pub fn sensor_state(desc: &SensorDescription, snapshot: &TopicSnapshot) -> EntityState {
    let value = snapshot
        .lookup(&desc.path())
        .and_then(|raw| SensorValue::convert(desc.device_class, raw));

    let (display, shown_unit) = match &value {
        Some(v) => format_sensor(desc, v),
        None => ("unavailable".to_string(), desc.unit),
    };

    EntityState {
        key: desc.key.clone(),
        name: desc.name.clone(),
        value: value.as_ref().map(SensorValue::to_json),
        display,
        unit: shown_unit.map(String::from),
        device_class: desc.device_class.map(|c| c.to_string()),
        category: desc.entity_category.map(|c| c.to_string()),
    }
}

pub fn binary_sensor_states(snapshot: &TopicSnapshot) -> Vec<EntityState> {
    binary_sensor_descriptions(snapshot)
        .into_iter()
        .map(|desc| {
            let on = desc.is_on(snapshot);
            EntityState {
                value: Some(Value::Bool(on)),
                display: if on { "on" } else { "off" }.to_string(),
                unit: None,
                device_class: desc.device_class.map(|c| c.to_string()),
                category: None,
                key: desc.key,
                name: desc.name,
            }
        })
        .collect()
}

pub fn switch_states(snapshot: &TopicSnapshot) -> Vec<EntityState> {
    SWITCHES
        .iter()
        .map(|desc| {
            let on = desc.is_on(snapshot);
            EntityState {
                key: desc.key.to_string(),
                name: desc.name.to_string(),
                value: Some(Value::Bool(on)),
                display: if on { "on" } else { "off" }.to_string(),
                unit: None,
                device_class: Some("switch".to_string()),
                category: None,
            }
        })
        .collect()
}

// ── Formatting ───────────────────────────────────────────────────────

/// Apply suggested unit (Wh → kWh) and display precision.
fn format_sensor(desc: &SensorDescription, value: &SensorValue) -> (String, Option<&'static str>) {
    let SensorValue::Json(Value::Number(n)) = value else {
        return (value.to_string(), desc.unit);
    };
    let Some(raw) = n.as_f64() else {
        return (value.to_string(), desc.unit);
    };

    let (scaled, shown_unit) = match (desc.unit, desc.suggested_unit) {
        (Some(unit::WATT_HOUR), Some(unit::KILO_WATT_HOUR)) => {
            (raw / 1000.0, Some(unit::KILO_WATT_HOUR))
        }
        _ => (raw, desc.unit),
    };

    let text = match desc.display_precision {
        Some(digits) => format!("{scaled:.prec$}", prec = usize::from(digits)),
        None if shown_unit == desc.unit => value.to_string(),
        None => scaled.to_string(),
    };
    (text, shown_unit)
}
