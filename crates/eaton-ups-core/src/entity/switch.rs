// ── Switches ──
//
// Outlet groups and the battery test. Turning a switch on or off publishes
// `<last key segment>_on` / `_off`; state is read from the matching
// `status/...` path.

use crate::store::TopicSnapshot;
use crate::topic::FieldPath;

use super::description::SwitchDescription;
use super::value::to_bool;

pub const SWITCHES: [SwitchDescription; 3] = [
    SwitchDescription {
        key: "control/outlet1",
        name: "Outlet 1",
        icon: "mdi:power-socket",
    },
    SwitchDescription {
        key: "control/outlet2",
        name: "Outlet 2",
        icon: "mdi:power-socket",
    },
    SwitchDescription {
        key: "control/test",
        name: "Battery Test",
        icon: "mdi:battery-check",
    },
];

impl SwitchDescription {
    /// Last key segment, e.g. `outlet1`.
    pub fn id(&self) -> &'static str {
        self.key.rsplit('/').next().unwrap_or(self.key)
    }

    pub fn turn_on_command(&self) -> String {
        format!("{}_on", self.id())
    }

    pub fn turn_off_command(&self) -> String {
        format!("{}_off", self.id())
    }

    pub fn command(&self, on: bool) -> String {
        if on {
            self.turn_on_command()
        } else {
            self.turn_off_command()
        }
    }

    /// `control/outlet1` reads its state from `status/outlet1`.
    pub fn state_path(&self) -> FieldPath {
        let mut segments = vec!["status".to_string()];
        segments.extend(self.key.split('/').skip(1).map(String::from));
        FieldPath::Nested(segments)
    }

    pub fn is_on(&self, snapshot: &TopicSnapshot) -> bool {
        snapshot.lookup(&self.state_path()).is_some_and(to_bool)
    }
}

/// Look up a switch by id (`outlet1`) or full key (`control/outlet1`).
pub fn find_switch(id: &str) -> Option<&'static SwitchDescription> {
    SWITCHES.iter().find(|s| s.id() == id || s.key == id)
}
