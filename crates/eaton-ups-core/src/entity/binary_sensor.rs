// ── Binary sensor tables ──

use crate::store::TopicSnapshot;

use super::description::{BinarySensorDescription as B, BinarySensorDeviceClass as Class};
use super::sensor::present_instances;
use super::value::to_bool;

const PD: &str = "powerDistributions/1";
const BANK: &str = "powerDistributions/1/backupSystem/powerBank";

/// Binary sensors for one card. Only inputs and outlets carry
/// per-instance flags.
pub fn binary_sensor_descriptions(snapshot: &TopicSnapshot) -> Vec<B> {
    let mut descriptions = base_binary_sensors();
    for n in present_instances(snapshot, "inputs") {
        descriptions.extend(input_binary_sensors(n));
    }
    for n in present_instances(snapshot, "outlets") {
        descriptions.extend(outlet_binary_sensors(n));
    }
    descriptions
}

impl B {
    /// Current state. A missing path reads as off.
    pub fn is_on(&self, snapshot: &TopicSnapshot) -> bool {
        snapshot.lookup(&self.path()).is_some_and(to_bool)
    }
}

pub fn base_binary_sensors() -> Vec<B> {
    let ups = |field: &str| format!("{PD}/status${field}");
    let bank = |field: &str| format!("{BANK}/status${field}");
    let charger = |field: &str| format!("{BANK}/chargers/1/status${field}");
    let env = |field: &str| format!("{PD}/environment/status${field}");

    vec![
        // UPS status
        B::new(ups("bootloaderMode"), "Bootloader Mode", Some(Class::Problem)),
        B::new(ups("communicationFault"), "Communication Fault", Some(Class::Problem)),
        B::new(ups("configurationFault"), "Configuration Fault", Some(Class::Problem)),
        B::new(ups("emergencySwitchOff"), "Emergency Switch Off", Some(Class::Safety)),
        B::new(ups("fanFault"), "Fan Fault", Some(Class::Problem)),
        B::new(ups("internalFailure"), "Internal Failure", Some(Class::Problem)),
        B::new(ups("shutdownImminent"), "Shutdown Imminent", Some(Class::Problem)),
        B::new(ups("systemAlarm"), "System Alarm", Some(Class::Problem)),
        B::new(ups("temperatureOutOfRange"), "Temperature Out Of Range", Some(Class::Problem)),
        // Power bank status
        B::new(bank("criticalLowStateOfCharge"), "Critical Low Battery", Some(Class::Battery)),
        B::new(bank("internalFailure"), "Battery Internal Failure", Some(Class::Problem)),
        B::new(bank("lcmExpired"), "Battery Expired", Some(Class::Problem)),
        B::new(bank("lowStateOfCharge"), "Low Battery", Some(Class::Battery)),
        B::new(bank("supplied"), "Battery Supplied", None),
        B::new(bank("supply"), "Battery Supply", Some(Class::Power)),
        B::new(bank("testFailed"), "Battery Test Failed", Some(Class::Problem)),
        // Charger status
        B::new(charger("active"), "Charger Active", Some(Class::BatteryCharging)),
        B::new(charger("enabled"), "Charger Enabled", None),
        B::new(charger("installed"), "Charger Installed", None),
        B::new(charger("internalFailure"), "Charger Internal Failure", Some(Class::Problem)),
        B::new(charger("supply"), "Charger Supply", Some(Class::Power)),
        B::new(charger("voltageTooHigh"), "Charger Voltage Too High", Some(Class::Problem)),
        B::new(charger("voltageTooLow"), "Charger Voltage Too Low", Some(Class::Problem)),
        // Environment
        B::new(env("buildingAlarm1"), "Building Alarm", Some(Class::Safety)),
        B::new(env("temperatureTooHigh"), "Temperature Too High", Some(Class::Problem)),
    ]
}

pub fn input_binary_sensors(n: u8) -> Vec<B> {
    let status = |field: &str| format!("{PD}/inputs/{n}/status${field}");
    vec![
        B::new(
            status("frequencyOutOfRange"),
            format!("Input {n} Frequency Out Of Range"),
            Some(Class::Problem),
        ),
        B::new(status("inRange"), format!("Input {n} In Range"), Some(Class::Power)),
        B::new(
            status("internalFailure"),
            format!("Input {n} Internal Failure"),
            Some(Class::Problem),
        ),
        B::new(status("supplied"), format!("Input {n} Supplied"), None),
        B::new(status("supply"), format!("Input {n} Supply"), Some(Class::Power)),
        B::new(
            status("voltageOutOfRange"),
            format!("Input {n} Voltage Out Of Range"),
            Some(Class::Problem),
        ),
        B::new(
            status("voltageTooHigh"),
            format!("Input {n} Voltage Too High"),
            Some(Class::Problem),
        ),
        B::new(status("voltageTooLow"), format!("Input {n} Voltage Too Low"), Some(Class::Problem)),
        B::new(status("wiringFault"), format!("Input {n} Wiring Fault"), Some(Class::Problem)),
    ]
}

pub fn outlet_binary_sensors(n: u8) -> Vec<B> {
    let status = |field: &str| format!("{PD}/outlets/{n}/status${field}");
    vec![
        B::new(status("supply"), format!("Outlet {n} Supply"), Some(Class::Power)),
        B::new(status("switchedOn"), format!("Outlet {n} Switched On"), Some(Class::Power)),
    ]
}
