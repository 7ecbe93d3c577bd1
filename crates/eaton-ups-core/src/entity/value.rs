// ── Value conversion ──
//
// Raw JSON scalars into typed sensor values. The card reports dates
// either as unix seconds or as `YYYY-MM-DDTHH:MM:SS.mmmZ` strings; any
// other shape is treated as "no value" rather than an error.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use super::description::SensorDeviceClass;

/// A sensor reading after device-class conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Json(Value),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl SensorValue {
    /// Convert a raw value according to `device_class`.
    pub fn convert(device_class: Option<SensorDeviceClass>, raw: &Value) -> Option<Self> {
        match device_class {
            Some(SensorDeviceClass::Date) => to_date(raw).map(Self::Date),
            Some(SensorDeviceClass::Timestamp) => to_timestamp(raw).map(Self::Timestamp),
            _ => Some(Self::Json(raw.clone())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Json(v) => v.clone(),
            Self::Date(d) => Value::String(d.to_string()),
            Self::Timestamp(t) => Value::String(t.to_rfc3339()),
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(Value::String(s)) => f.write_str(s),
            Self::Json(v) => write!(f, "{v}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S UTC")),
        }
    }
}

pub fn to_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        // Integers only: a float is not a unix timestamp here.
        Value::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0),
        Value::String(s) if looks_like_iso_millis(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    }
}

pub fn to_date(raw: &Value) -> Option<NaiveDate> {
    to_timestamp(raw).map(|t| t.date_naive())
}

/// Truthiness of a binary sensor or switch reading.
pub fn to_bool(raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.to_lowercase().as_str(), "true" | "yes" | "on" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f > 0.0),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Prefix check for `dddd-dd-ddTdd:dd:dd.dddZ`. The separator before the
/// milliseconds may be any character.
fn looks_like_iso_millis(s: &str) -> bool {
    const SHAPE: &[u8] = b"dddd-dd-ddTdd:dd:dd?dddZ";
    let bytes = s.as_bytes();
    bytes.len() >= SHAPE.len()
        && SHAPE.iter().zip(bytes).all(|(&want, &got)| match want {
            b'd' => got.is_ascii_digit(),
            b'?' => got != b'\n',
            other => got == other,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;

    #[test]
    fn unix_seconds_become_utc_timestamps() {
        let t = to_timestamp(&json!(1_738_146_293)).unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2025, 1, 29));
        assert_eq!(t.hour(), 10);
    }

    #[test]
    fn iso_strings_are_parsed() {
        let t = to_timestamp(&json!("2026-10-17T12:26:32.000Z")).unwrap();
        assert_eq!(t.to_rfc3339(), "2026-10-17T12:26:32+00:00");
        assert_eq!(
            to_date(&json!("2021-10-26T00:00:00.000Z")),
            NaiveDate::from_ymd_opt(2021, 10, 26)
        );
    }

    #[test]
    fn other_shapes_yield_nothing() {
        assert!(to_timestamp(&json!("2026-10-17")).is_none());
        assert!(to_timestamp(&json!("yesterday")).is_none());
        assert!(to_timestamp(&json!(1.5)).is_none());
        assert!(to_timestamp(&json!(null)).is_none());
        assert!(to_timestamp(&json!("2026-10-17T12:26:32.000Zjunk")).is_none());
    }

    #[test]
    fn convert_passes_plain_values_through() {
        let v = SensorValue::convert(Some(SensorDeviceClass::Voltage), &json!(52.2)).unwrap();
        assert_eq!(v, SensorValue::Json(json!(52.2)));
        assert_eq!(v.to_string(), "52.2");

        assert!(SensorValue::convert(Some(SensorDeviceClass::Date), &json!("soon")).is_none());
    }

    #[test]
    fn bool_conversion_rules() {
        assert!(to_bool(&json!(true)));
        assert!(to_bool(&json!("Yes")));
        assert!(to_bool(&json!("ON")));
        assert!(to_bool(&json!("1")));
        assert!(!to_bool(&json!("off")));
        assert!(to_bool(&json!(0.5)));
        assert!(!to_bool(&json!(0)));
        assert!(!to_bool(&json!(-3)));
        assert!(!to_bool(&json!({"a": 1})));
        assert!(!to_bool(&json!(null)));
    }

    #[test]
    fn json_form_of_dates() {
        let d = SensorValue::Date(NaiveDate::from_ymd_opt(2025, 10, 25).unwrap());
        assert_eq!(d.to_json(), json!("2025-10-25"));
    }
}
