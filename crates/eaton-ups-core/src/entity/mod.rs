// ── Entity model ──
//
// Declarative sensor, binary-sensor and switch tables over the topic
// store, plus the conversions needed to render them.

pub mod binary_sensor;
pub mod description;
pub mod sensor;
pub mod state;
pub mod switch;
pub mod value;

pub use binary_sensor::binary_sensor_descriptions;
pub use description::{
    BinarySensorDescription, BinarySensorDeviceClass, EntityCategory, SensorDescription,
    SensorDeviceClass, StateClass, SwitchDescription,
};
pub use sensor::sensor_descriptions;
pub use state::{EntityState, binary_sensor_states, sensor_states, switch_states};
pub use switch::{SWITCHES, find_switch};
pub use value::{SensorValue, to_bool};
