// ── Entity description types ──
//
// Declarative metadata mapping a topic-store path to a display entity.
// Enums render in snake_case (strum) and serialise the same way (serde),
// matching the identifiers home-automation front ends expect.

use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

use crate::topic::FieldPath;

// ── Classification enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorDeviceClass {
    Timestamp,
    Date,
    Duration,
    Battery,
    Voltage,
    Current,
    Frequency,
    Power,
    Energy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityCategory {
    Diagnostic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BinarySensorDeviceClass {
    Problem,
    Safety,
    Battery,
    Power,
    BatteryCharging,
}

// ── Units ────────────────────────────────────────────────────────────

pub mod unit {
    pub const SECONDS: &str = "s";
    pub const PERCENTAGE: &str = "%";
    pub const VOLT: &str = "V";
    pub const AMPERE: &str = "A";
    pub const HERTZ: &str = "Hz";
    pub const WATT: &str = "W";
    pub const VOLT_AMPERE: &str = "VA";
    pub const WATT_HOUR: &str = "Wh";
    pub const KILO_WATT_HOUR: &str = "kWh";
    pub const AMPERE_HOUR: &str = "Ah";
}

// ── SensorDescription ────────────────────────────────────────────────

/// One numeric or textual sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorDescription {
    /// `topic$field/path` address inside the topic store.
    pub key: String,
    pub name: String,
    pub icon: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<SensorDeviceClass>,
    pub state_class: Option<StateClass>,
    pub entity_category: Option<EntityCategory>,
    pub display_precision: Option<u8>,
    pub suggested_unit: Option<&'static str>,
}

impl SensorDescription {
    pub fn new(key: impl Into<String>, name: impl Into<String>, icon: &'static str) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            icon,
            unit: None,
            device_class: None,
            state_class: None,
            entity_category: None,
            display_precision: None,
            suggested_unit: None,
        }
    }

    #[must_use]
    pub fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    #[must_use]
    pub fn device_class(mut self, class: SensorDeviceClass) -> Self {
        self.device_class = Some(class);
        self
    }

    #[must_use]
    pub fn measurement(mut self) -> Self {
        self.state_class = Some(StateClass::Measurement);
        self
    }

    #[must_use]
    pub fn total_increasing(mut self) -> Self {
        self.state_class = Some(StateClass::TotalIncreasing);
        self
    }

    #[must_use]
    pub fn diagnostic(mut self) -> Self {
        self.entity_category = Some(EntityCategory::Diagnostic);
        self
    }

    #[must_use]
    pub fn precision(mut self, digits: u8) -> Self {
        self.display_precision = Some(digits);
        self
    }

    #[must_use]
    pub fn suggested_unit(mut self, unit: &'static str) -> Self {
        self.suggested_unit = Some(unit);
        self
    }

    pub fn path(&self) -> FieldPath {
        FieldPath::parse(&self.key)
    }
}

// ── BinarySensorDescription ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinarySensorDescription {
    pub key: String,
    pub name: String,
    pub device_class: Option<BinarySensorDeviceClass>,
}

impl BinarySensorDescription {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        device_class: Option<BinarySensorDeviceClass>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            device_class,
        }
    }

    pub fn path(&self) -> FieldPath {
        FieldPath::parse(&self.key)
    }
}

// ── SwitchDescription ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwitchDescription {
    /// Slash-only control path, e.g. `control/outlet1`.
    pub key: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn enums_render_snake_case() {
        assert_eq!(StateClass::TotalIncreasing.to_string(), "total_increasing");
        assert_eq!(
            BinarySensorDeviceClass::BatteryCharging.as_ref(),
            "battery_charging"
        );
        assert_eq!(
            serde_json::to_value(SensorDeviceClass::Timestamp).ok(),
            Some(serde_json::json!("timestamp"))
        );
        assert_eq!(
            SensorDeviceClass::from_str("voltage").ok(),
            Some(SensorDeviceClass::Voltage)
        );
    }

    #[test]
    fn builder_sets_every_field() {
        let desc = SensorDescription::new("a$b", "A B", "mdi:flash")
            .unit(unit::WATT_HOUR)
            .device_class(SensorDeviceClass::Energy)
            .total_increasing()
            .precision(3)
            .suggested_unit(unit::KILO_WATT_HOUR)
            .diagnostic();

        assert_eq!(desc.unit, Some("Wh"));
        assert_eq!(desc.state_class, Some(StateClass::TotalIncreasing));
        assert_eq!(desc.entity_category, Some(EntityCategory::Diagnostic));
        assert_eq!(desc.display_precision, Some(3));
        assert_eq!(desc.suggested_unit, Some("kWh"));
    }
}
