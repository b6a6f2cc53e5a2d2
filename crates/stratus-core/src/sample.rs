//! Lenient decoding of remote payloads.
//!
//! The remote source is loosely typed: a sample value sometimes arrives
//! nested under a `{"val": ...}` wrapper, sometimes raw, and numerics are
//! often encoded as strings. All of that leniency is isolated here; the
//! rest of the engine only ever sees a typed [`SensorValue`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use stratus_types::{SensorKey, SensorValue};

/// One raw sample as delivered by the remote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    /// Undecoded payload value.
    pub value: Value,
}

impl RawSample {
    /// Create a sample from any JSON-representable value.
    pub fn new(timestamp: i64, value: impl Into<Value>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }

    /// Decode the payload into a typed value for the given sensor.
    ///
    /// Fallback rules, in order:
    /// - a `{"val": ...}` wrapper is unwrapped first
    /// - categorical sensors keep their text; a numeric payload is
    ///   stringified, anything else falls back to `"N"`
    /// - numeric sensors coerce strings via parse; parse failures and
    ///   non-numeric payloads fall back to `0.0`
    pub fn decode(&self, key: SensorKey) -> SensorValue {
        let inner = match &self.value {
            Value::Object(map) => map.get("val").unwrap_or(&self.value),
            other => other,
        };

        if key.is_categorical() {
            match inner {
                Value::String(s) => SensorValue::Text(s.clone()),
                Value::Number(n) => SensorValue::Text(n.to_string()),
                _ => SensorValue::Text("N".to_string()),
            }
        } else {
            match inner {
                Value::Number(n) => SensorValue::Number(n.as_f64().unwrap_or(0.0)),
                Value::String(s) => SensorValue::Number(s.trim().parse().unwrap_or(0.0)),
                _ => SensorValue::Number(0.0),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_plain_number() {
        let sample = RawSample::new(100, 31.5);
        assert_eq!(
            sample.decode(SensorKey::Temperature),
            SensorValue::Number(31.5)
        );
    }

    #[test]
    fn test_decode_string_number() {
        let sample = RawSample::new(100, "31.5");
        assert_eq!(
            sample.decode(SensorKey::Temperature),
            SensorValue::Number(31.5)
        );
    }

    #[test]
    fn test_decode_wrapped_value() {
        let sample = RawSample::new(100, json!({"val": "12.25"}));
        assert_eq!(
            sample.decode(SensorKey::Rainfall),
            SensorValue::Number(12.25)
        );
    }

    #[test]
    fn test_decode_wrapped_direction() {
        let sample = RawSample::new(100, json!({"val": "SW"}));
        assert_eq!(
            sample.decode(SensorKey::WindDirection),
            SensorValue::Text("SW".to_string())
        );
    }

    #[test]
    fn test_decode_garbage_numeric_falls_back_to_zero() {
        let sample = RawSample::new(100, "not a number");
        assert_eq!(
            sample.decode(SensorKey::WindSpeed),
            SensorValue::Number(0.0)
        );

        let sample = RawSample::new(100, json!(null));
        assert_eq!(sample.decode(SensorKey::WindSpeed), SensorValue::Number(0.0));

        let sample = RawSample::new(100, json!({"other": 1}));
        assert_eq!(sample.decode(SensorKey::WindSpeed), SensorValue::Number(0.0));
    }

    #[test]
    fn test_decode_garbage_direction_falls_back_to_north() {
        let sample = RawSample::new(100, json!(null));
        assert_eq!(
            sample.decode(SensorKey::WindDirection),
            SensorValue::Text("N".to_string())
        );
    }

    #[test]
    fn test_decode_numeric_direction_is_stringified() {
        let sample = RawSample::new(100, 270);
        assert_eq!(
            sample.decode(SensorKey::WindDirection),
            SensorValue::Text("270".to_string())
        );
    }
}
