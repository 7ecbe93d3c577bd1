// ── Sensor tables ──
//
// Fixed sensors present on every card, plus per-instance tables generated
// for each input, output and outlet the snapshot reveals.

use crate::store::TopicSnapshot;

use super::description::{SensorDescription as S, SensorDeviceClass as Class, unit};

const PD: &str = "powerDistributions/1";
const BANK: &str = "powerDistributions/1/backupSystem/powerBank";

/// Highest instance number probed for inputs, outputs and outlets.
pub const MAX_INSTANCES: u8 = 9;

/// Sensors for one card, in display order.
pub fn sensor_descriptions(snapshot: &TopicSnapshot) -> Vec<S> {
    let mut descriptions = base_sensors();
    for n in present_instances(snapshot, "inputs") {
        descriptions.extend(input_sensors(n));
    }
    for n in present_instances(snapshot, "outputs") {
        descriptions.extend(output_sensors(n));
    }
    for n in present_instances(snapshot, "outlets") {
        descriptions.extend(outlet_sensors(n));
    }
    descriptions
}

/// Instance numbers in `1..=9` with at least one topic under
/// `powerDistributions/1/{group}/{n}/`.
pub fn present_instances<'a>(
    snapshot: &'a TopicSnapshot,
    group: &'a str,
) -> impl Iterator<Item = u8> + 'a {
    (1..=MAX_INSTANCES).filter(move |n| snapshot.has_prefix(&format!("{PD}/{group}/{n}/")))
}

// ── Base table ───────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn base_sensors() -> Vec<S> {
    let mgr = |field: &str| format!("managers/1/identification${field}");
    let ups = |field: &str| format!("{PD}/identification${field}");

    vec![
        // Manager identification
        S::new(
            mgr("firmwareVersion"),
            "Manager Firmware Version",
            "mdi:information-outline",
        )
        .diagnostic(),
        S::new(
            mgr("physicalName"),
            "Manager Physical Name",
            "mdi:information-outline",
        )
        .diagnostic(),
        S::new(mgr("uuid"), "Manager UUID", "mdi:identifier").diagnostic(),
        S::new(mgr("vendor"), "Manager Vendor", "mdi:domain").diagnostic(),
        S::new(mgr("product"), "Manager Product", "mdi:package-variant").diagnostic(),
        S::new(mgr("serialNumber"), "Manager Serial Number", "mdi:barcode").diagnostic(),
        S::new(mgr("type"), "Manager Type", "mdi:card-text-outline").diagnostic(),
        S::new(mgr("partNumber"), "Manager Part Number", "mdi:numeric").diagnostic(),
        S::new(mgr("hwVersion"), "Manager Hardware Version", "mdi:chip").diagnostic(),
        S::new(mgr("name"), "Manager Name", "mdi:account-outline").diagnostic(),
        S::new(mgr("contact"), "Manager Contact", "mdi:account-outline").diagnostic(),
        S::new(mgr("location"), "Manager Location", "mdi:map-marker-outline").diagnostic(),
        S::new(
            mgr("firmwareInstallationDate"),
            "Manager Firmware Installation Date",
            "mdi:calendar-clock",
        )
        .device_class(Class::Timestamp)
        .diagnostic(),
        S::new(
            mgr("firmwareActivationDate"),
            "Manager Firmware Activation Date",
            "mdi:calendar-clock",
        )
        .device_class(Class::Timestamp)
        .diagnostic(),
        S::new(mgr("firmwareDate"), "Manager Firmware Date", "mdi:calendar-clock")
            .device_class(Class::Timestamp)
            .diagnostic(),
        S::new(
            mgr("firmwareSha"),
            "Manager Firmware SHA",
            "mdi:checkbox-marked-circle-outline",
        )
        .diagnostic(),
        S::new(
            mgr("bootloaderVersion"),
            "Manager Bootloader Version",
            "mdi:information-outline",
        )
        .diagnostic(),
        S::new(mgr("manufacturer"), "Manager Manufacturer", "mdi:factory").diagnostic(),
        S::new(mgr("macAddress"), "Manager MAC Address", "mdi:ethernet").diagnostic(),
        // UPS identification
        S::new(ups("uuid"), "UPS UUID", "mdi:identifier").diagnostic(),
        S::new(ups("physicalName"), "UPS Physical Name", "mdi:label-outline").diagnostic(),
        S::new(ups("friendlyName"), "UPS Friendly Name", "mdi:label-outline").diagnostic(),
        S::new(ups("partNumber"), "UPS Part Number", "mdi:numeric").diagnostic(),
        S::new(
            ups("referenceNumber"),
            "UPS Reference Number",
            "mdi:numeric-9-plus-box-outline",
        )
        .diagnostic(),
        S::new(ups("vendor"), "UPS Vendor", "mdi:domain").diagnostic(),
        S::new(ups("model"), "UPS Model", "mdi:information-outline").diagnostic(),
        S::new(ups("serialNumber"), "UPS Serial Number", "mdi:information-outline").diagnostic(),
        S::new(ups("type"), "UPS Type", "mdi:card-text-outline").diagnostic(),
        S::new(ups("productName"), "UPS Product Name", "mdi:package-variant").diagnostic(),
        S::new(
            ups("firmwareVersion"),
            "UPS Firmware Version",
            "mdi:information-outline",
        )
        .diagnostic(),
        S::new(ups("name"), "UPS Name", "mdi:label-outline").diagnostic(),
        // UPS status
        S::new(format!("{PD}/status$operating"), "UPS Operating Status", "mdi:power-settings"),
        S::new(format!("{PD}/status$health"), "UPS Health", "mdi:heart-pulse"),
        S::new(format!("{PD}/status$mode"), "UPS Mode", "mdi:power-settings"),
        // Power bank measures
        S::new(
            format!("{BANK}/measures$remainingTime"),
            "Backup Remaining Time",
            "mdi:timer-outline",
        )
        .unit(unit::SECONDS)
        .device_class(Class::Duration)
        .measurement(),
        S::new(format!("{BANK}/measures$stateOfCharge"), "Backup State of Charge", "mdi:battery")
            .unit(unit::PERCENTAGE)
            .device_class(Class::Battery)
            .measurement(),
        S::new(format!("{BANK}/measures$voltage"), "Backup Voltage", "mdi:flash")
            .unit(unit::VOLT)
            .precision(1)
            .device_class(Class::Voltage)
            .measurement(),
        // Power bank settings
        S::new(
            format!("{BANK}/settings$lowRuntimeThreshold"),
            "Backup Low Runtime Threshold",
            "mdi:timer-alert-outline",
        )
        .unit(unit::SECONDS)
        .device_class(Class::Duration),
        S::new(
            format!("{BANK}/settings$lowStateOfChargeThreshold"),
            "Backup Low Charge Threshold",
            "mdi:battery-alert",
        )
        .unit(unit::PERCENTAGE),
        // Power bank specifications
        S::new(
            format!("{BANK}/specifications$externalCount"),
            "Backup External Count",
            "mdi:battery-check",
        )
        .diagnostic(),
        S::new(
            format!("{BANK}/specifications$technology"),
            "Backup Technology",
            "mdi:battery-heart-variant",
        )
        .diagnostic(),
        S::new(
            format!("{BANK}/specifications$capacityAh/nominal"),
            "Backup Nominal Capacity",
            "mdi:battery-charging",
        )
        .unit(unit::AMPERE_HOUR)
        .diagnostic(),
        S::new(
            format!("{BANK}/specifications$voltage/nominal"),
            "Backup Nominal Voltage",
            "mdi:flash",
        )
        .unit(unit::VOLT)
        .device_class(Class::Voltage)
        .diagnostic(),
        // Power bank status
        S::new(
            format!("{BANK}/status$operating"),
            "Backup Operating Status",
            "mdi:battery-heart-outline",
        ),
        S::new(format!("{BANK}/status$health"), "Backup Health", "mdi:heart-pulse"),
        S::new(format!("{BANK}/status$lastTestResult"), "Backup Last Test Result", "mdi:test-tube"),
        S::new(
            format!("{BANK}/status$lastTestResultDate"),
            "Backup Last Test Date",
            "mdi:calendar-clock",
        )
        .device_class(Class::Timestamp),
        S::new(
            format!("{BANK}/status$lcmInstallationDate"),
            "Backup Installation Date",
            "mdi:calendar-plus",
        )
        .device_class(Class::Date),
        S::new(
            format!("{BANK}/status$lcmReplacementDate"),
            "Backup Replacement Date",
            "mdi:calendar-refresh",
        )
        .device_class(Class::Date),
        // Charger
        S::new(
            format!("{BANK}/chargers/1/status$operating"),
            "Charger Operating Status",
            "mdi:battery-charging",
        ),
        S::new(format!("{BANK}/chargers/1/status$health"), "Charger Health", "mdi:heart-pulse"),
        S::new(
            format!("{BANK}/chargers/1/status$chargerStatus"),
            "Charger Status",
            "mdi:battery-charging-outline",
        ),
        S::new(
            format!("{BANK}/chargers/1/status$mode"),
            "Charger Mode",
            "mdi:battery-charging-high",
        ),
        // UPS settings
        S::new(
            format!("{PD}/settings$audibleAlarm"),
            "Audible Alarm",
            "mdi:volume-high",
        )
        .diagnostic(),
        S::new(format!("{PD}/settings$nominalVoltage"), "Nominal Voltage", "mdi:flash-alert")
            .unit(unit::VOLT)
            .device_class(Class::Voltage)
            .diagnostic(),
        S::new(
            format!("{PD}/settings$sensitivityMode"),
            "Sensitivity Mode",
            "mdi:tune",
        )
        .diagnostic(),
        S::new(
            format!("{PD}/settings$voltageHighDetection"),
            "Voltage High Detection",
            "mdi:flash-alert",
        )
        .unit(unit::VOLT)
        .device_class(Class::Voltage)
        .diagnostic(),
        S::new(
            format!("{PD}/settings$voltageLowDetection"),
            "Voltage Low Detection",
            "mdi:flash-alert",
        )
        .unit(unit::VOLT)
        .device_class(Class::Voltage)
        .diagnostic(),
    ]
}

// ── Per-instance generators ──────────────────────────────────────────

pub fn input_sensors(n: u8) -> Vec<S> {
    let measures = |field: &str| format!("{PD}/inputs/{n}/measures${field}");
    vec![
        S::new(measures("voltage"), format!("Input {n} Voltage"), "mdi:flash")
            .unit(unit::VOLT)
            .precision(1)
            .device_class(Class::Voltage)
            .measurement(),
        S::new(measures("frequency"), format!("Input {n} Frequency"), "mdi:sine-wave")
            .unit(unit::HERTZ)
            .precision(1)
            .device_class(Class::Frequency)
            .measurement(),
        S::new(measures("current"), format!("Input {n} Current"), "mdi:current-ac")
            .unit(unit::AMPERE)
            .precision(1)
            .device_class(Class::Current)
            .measurement(),
    ]
}

pub fn output_sensors(n: u8) -> Vec<S> {
    let measures = |field: &str| format!("{PD}/outputs/{n}/measures${field}");
    vec![
        S::new(measures("voltage"), format!("Output {n} Voltage"), "mdi:flash")
            .unit(unit::VOLT)
            .precision(1)
            .device_class(Class::Voltage)
            .measurement(),
        S::new(measures("frequency"), format!("Output {n} Frequency"), "mdi:sine-wave")
            .unit(unit::HERTZ)
            .precision(1)
            .device_class(Class::Frequency)
            .measurement(),
        S::new(measures("current"), format!("Output {n} Current"), "mdi:current-ac")
            .unit(unit::AMPERE)
            .precision(1)
            .device_class(Class::Current)
            .measurement(),
        S::new(measures("activePower"), format!("Output {n} Active Power"), "mdi:power-plug")
            .unit(unit::WATT)
            .device_class(Class::Power)
            .measurement(),
        S::new(measures("apparentPower"), format!("Output {n} Apparent Power"), "mdi:power-plug")
            .unit(unit::VOLT_AMPERE)
            .measurement(),
        S::new(measures("percentLoad"), format!("Output {n} Load"), "mdi:gauge")
            .unit(unit::PERCENTAGE)
            .measurement(),
        S::new(measures("powerFactor"), format!("Output {n} Power Factor"), "mdi:sine-wave")
            .precision(2)
            .measurement(),
        S::new(
            measures("efficiency"),
            format!("Output {n} Efficiency"),
            "mdi:lightning-bolt-outline",
        )
        .unit(unit::PERCENTAGE)
        .measurement(),
        S::new(measures("cumulatedEnergy"), format!("Output {n} Energy"), "mdi:lightning-bolt")
            .unit(unit::WATT_HOUR)
            .precision(3)
            .suggested_unit(unit::KILO_WATT_HOUR)
            .device_class(Class::Energy)
            .total_increasing(),
        S::new(measures("averageEnergy"), format!("Output {n} Average Power"), "mdi:lightning-bolt")
            .unit(unit::WATT)
            .device_class(Class::Power)
            .measurement(),
    ]
}

pub fn outlet_sensors(n: u8) -> Vec<S> {
    let measures = |field: &str| format!("{PD}/outlets/{n}/measures${field}");
    let status = |field: &str| format!("{PD}/outlets/{n}/status${field}");
    vec![
        S::new(measures("cumulatedEnergy"), format!("Outlet {n} Energy"), "mdi:lightning-bolt")
            .unit(unit::WATT_HOUR)
            .precision(3)
            .suggested_unit(unit::KILO_WATT_HOUR)
            .device_class(Class::Energy)
            .total_increasing(),
        S::new(measures("averageEnergy"), format!("Outlet {n} Average Power"), "mdi:lightning-bolt")
            .unit(unit::WATT)
            .device_class(Class::Power)
            .measurement(),
        S::new(measures("activePower"), format!("Outlet {n} Active Power"), "mdi:power-plug")
            .unit(unit::WATT)
            .device_class(Class::Power)
            .measurement(),
        S::new(measures("apparentPower"), format!("Outlet {n} Apparent Power"), "mdi:power-plug")
            .unit(unit::VOLT_AMPERE)
            .measurement(),
        S::new(measures("current"), format!("Outlet {n} Current"), "mdi:current-ac")
            .unit(unit::AMPERE)
            .precision(1)
            .device_class(Class::Current)
            .measurement(),
        S::new(measures("frequency"), format!("Outlet {n} Frequency"), "mdi:sine-wave")
            .unit(unit::HERTZ)
            .precision(1)
            .device_class(Class::Frequency)
            .measurement(),
        S::new(measures("voltage"), format!("Outlet {n} Voltage"), "mdi:flash")
            .unit(unit::VOLT)
            .precision(1)
            .device_class(Class::Voltage)
            .measurement(),
        S::new(measures("powerFactor"), format!("Outlet {n} Power Factor"), "mdi:sine-wave")
            .precision(2)
            .measurement(),
        S::new(
            status("delayBeforeSwitchOff"),
            format!("Outlet {n} Delay Before Switch Off"),
            "mdi:timer-off-outline",
        )
        .unit(unit::SECONDS)
        .device_class(Class::Duration),
        S::new(
            status("delayBeforeSwitchOn"),
            format!("Outlet {n} Delay Before Switch On"),
            "mdi:timer-outline",
        )
        .unit(unit::SECONDS)
        .device_class(Class::Duration),
        S::new(status("operating"), format!("Outlet {n} Operating Status"), "mdi:power-settings"),
        S::new(status("health"), format!("Outlet {n} Health"), "mdi:heart-pulse"),
        S::new(
            status("supplierPowerQuality"),
            format!("Outlet {n} Power Quality"),
            "mdi:power-plug",
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn snapshot(keys: &[&str]) -> TopicSnapshot {
        keys.iter()
            .map(|k| ((*k).to_string(), Arc::new(json!({}))))
            .collect()
    }

    #[test]
    fn empty_snapshot_yields_base_table() {
        let descriptions = sensor_descriptions(&TopicSnapshot::default());
        assert_eq!(descriptions.len(), base_sensors().len());
    }

    #[test]
    fn discovered_instances_add_tables() {
        let snap = snapshot(&[
            "powerDistributions/1/inputs/1/measures",
            "powerDistributions/1/outputs/1/measures",
            "powerDistributions/1/outlets/1/status",
            "powerDistributions/1/outlets/3/measures",
        ]);
        let descriptions = sensor_descriptions(&snap);
        let expected = base_sensors().len()
            + input_sensors(1).len()
            + output_sensors(1).len()
            + 2 * outlet_sensors(1).len();
        assert_eq!(descriptions.len(), expected);
        assert!(descriptions.iter().any(|d| d.name == "Outlet 3 Energy"));
        assert!(!descriptions.iter().any(|d| d.name.starts_with("Outlet 2")));
    }

    #[test]
    fn instance_prefix_requires_trailing_slash() {
        let snap = snapshot(&["powerDistributions/1/outlets/10/status"]);
        assert_eq!(present_instances(&snap, "outlets").count(), 0);
    }

    #[test]
    fn keys_are_unique_with_every_instance() {
        let keys: Vec<String> = (1..=MAX_INSTANCES)
            .flat_map(|n| {
                ["inputs", "outputs", "outlets"]
                    .map(|g| format!("powerDistributions/1/{g}/{n}/x"))
            })
            .collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let descriptions = sensor_descriptions(&snapshot(&refs));

        let unique: HashSet<_> = descriptions.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(unique.len(), descriptions.len());
    }

    #[test]
    fn every_key_uses_topic_form() {
        for desc in sensor_descriptions(&TopicSnapshot::default()) {
            assert!(desc.key.contains('$'), "{} lacks a field path", desc.key);
        }
    }

    #[test]
    fn energy_sensors_suggest_kilowatt_hours() {
        let energy = outlet_sensors(2)
            .into_iter()
            .find(|d| d.key.ends_with("$cumulatedEnergy"))
            .unwrap();
        assert_eq!(energy.unit, Some("Wh"));
        assert_eq!(energy.suggested_unit, Some("kWh"));
        assert_eq!(energy.display_precision, Some(3));
    }
}
