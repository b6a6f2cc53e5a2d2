//! Core data types for station sensor data.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::error::ParseError;

/// A metric stream reported by a weather station.
///
/// Each key maps to the short wire code used by the remote data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKey {
    /// Air temperature in Celsius (`TEM`).
    Temperature,
    /// Relative humidity percentage (`HUM`).
    Humidity,
    /// Rainfall in millimeters (`RR`).
    Rainfall,
    /// Wind speed in m/s (`WSP`).
    WindSpeed,
    /// Cardinal wind direction, e.g. `"N"`, `"SW"` (`WD`).
    WindDirection,
    /// Barometric pressure in hPa (`ATM`).
    Pressure,
    /// Illumination in lux (`LUX`).
    Illumination,
    /// Total solar radiation in W/m2 (`TSR`).
    Solar,
    /// Soil moisture percentage (`SMD`).
    SoilMoisture,
    /// Soil temperature in Celsius (`STD`).
    SoilTemp,
    /// Wind angle in degrees (`WA`).
    WindAngle,
}

impl SensorKey {
    /// All tracked sensor keys, in snapshot order.
    pub const ALL: [SensorKey; 11] = [
        SensorKey::Temperature,
        SensorKey::Humidity,
        SensorKey::Rainfall,
        SensorKey::WindSpeed,
        SensorKey::WindDirection,
        SensorKey::Pressure,
        SensorKey::Illumination,
        SensorKey::Solar,
        SensorKey::SoilMoisture,
        SensorKey::SoilTemp,
        SensorKey::WindAngle,
    ];

    /// The subset of keys that feed daily summaries.
    pub const SUMMARY: [SensorKey; 5] = [
        SensorKey::Temperature,
        SensorKey::Humidity,
        SensorKey::Rainfall,
        SensorKey::WindSpeed,
        SensorKey::WindDirection,
    ];

    /// Short wire code used by the remote source and the database.
    pub fn code(&self) -> &'static str {
        match self {
            SensorKey::Temperature => "TEM",
            SensorKey::Humidity => "HUM",
            SensorKey::Rainfall => "RR",
            SensorKey::WindSpeed => "WSP",
            SensorKey::WindDirection => "WD",
            SensorKey::Pressure => "ATM",
            SensorKey::Illumination => "LUX",
            SensorKey::Solar => "TSR",
            SensorKey::SoilMoisture => "SMD",
            SensorKey::SoilTemp => "STD",
            SensorKey::WindAngle => "WA",
        }
    }

    /// Parse a wire code back into a sensor key.
    pub fn from_code(code: &str) -> Result<Self, ParseError> {
        match code {
            "TEM" => Ok(SensorKey::Temperature),
            "HUM" => Ok(SensorKey::Humidity),
            "RR" => Ok(SensorKey::Rainfall),
            "WSP" => Ok(SensorKey::WindSpeed),
            "WD" => Ok(SensorKey::WindDirection),
            "ATM" => Ok(SensorKey::Pressure),
            "LUX" => Ok(SensorKey::Illumination),
            "TSR" => Ok(SensorKey::Solar),
            "SMD" => Ok(SensorKey::SoilMoisture),
            "STD" => Ok(SensorKey::SoilTemp),
            "WA" => Ok(SensorKey::WindAngle),
            other => Err(ParseError::UnknownSensor(other.to_string())),
        }
    }

    /// Whether this key carries a categorical (textual) value.
    ///
    /// Only wind direction is categorical; everything else is numeric.
    pub fn is_categorical(&self) -> bool {
        matches!(self, SensorKey::WindDirection)
    }
}

/// A single sensor sample value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    /// Numeric measurement.
    Number(f64),
    /// Categorical measurement (wind direction).
    Text(String),
}

impl SensorValue {
    /// Coerce to a number.
    ///
    /// Textual values are parsed; anything unparsable falls back to `0.0`,
    /// matching the lenient ingestion policy for malformed remote data.
    pub fn as_number(&self) -> f64 {
        match self {
            SensorValue::Number(n) => *n,
            SensorValue::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    /// Borrow the textual value, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SensorValue::Text(s) => Some(s),
            SensorValue::Number(_) => None,
        }
    }
}

impl From<f64> for SensorValue {
    fn from(n: f64) -> Self {
        SensorValue::Number(n)
    }
}

impl From<&str> for SensorValue {
    fn from(s: &str) -> Self {
        SensorValue::Text(s.to_string())
    }
}

/// A raw time-series sample for one station and sensor.
///
/// Immutable once stored; the natural key is `(station_id, key, timestamp)`
/// and re-ingesting the same sample is an idempotent overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Station identifier.
    pub station_id: String,
    /// Metric stream this sample belongs to.
    pub key: SensorKey,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    /// Measured value.
    pub value: SensorValue,
}

/// Latest known value per metric for a station.
///
/// One row per station, replaced wholesale on every successful sync cycle.
/// Missing numeric metrics default to `0.0`, missing wind direction to `"N"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSnapshot {
    /// Station identifier.
    pub station_id: String,
    /// Air temperature in Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Rainfall in millimeters.
    pub rainfall: f64,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Cardinal wind direction.
    pub wind_direction: String,
    /// Barometric pressure in hPa.
    pub pressure: f64,
    /// Total solar radiation in W/m2.
    pub solar: f64,
    /// Illumination in lux.
    pub illumination: f64,
    /// Soil moisture percentage.
    pub soil_moisture: f64,
    /// Soil temperature in Celsius.
    pub soil_temp: f64,
    /// Wind angle in degrees.
    pub wind_angle: f64,
    /// Derived heat index in Celsius (0.0 when inputs are missing).
    pub heat_index: f64,
    /// Earliest timestamp among the contributing readings (unix seconds).
    pub timestamp: i64,
    /// When this snapshot was written (unix seconds). Always >= `timestamp`.
    pub synced_at: i64,
}

impl StationSnapshot {
    /// An empty snapshot with neutral defaults for every metric.
    pub fn empty(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            temperature: 0.0,
            humidity: 0.0,
            rainfall: 0.0,
            wind_speed: 0.0,
            wind_direction: "N".to_string(),
            pressure: 0.0,
            solar: 0.0,
            illumination: 0.0,
            soil_moisture: 0.0,
            soil_temp: 0.0,
            wind_angle: 0.0,
            heat_index: 0.0,
            timestamp: 0,
            synced_at: 0,
        }
    }
}

/// Per-day aggregate derived from raw readings.
///
/// Unique per `(station_id, date)`. Rainfall is summed; the other numeric
/// metrics are averaged over the samples available that day. Wind direction
/// takes the first sample of the day, a documented simplification that
/// downstream consumers rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Station identifier.
    pub station_id: String,
    /// Calendar day in station-local time.
    pub date: Date,
    /// Mean temperature in Celsius, rounded to 2 decimals.
    pub avg_temperature: f64,
    /// Mean relative humidity, rounded to 2 decimals.
    pub avg_humidity: f64,
    /// Total rainfall in millimeters, rounded to 2 decimals.
    pub total_rainfall: f64,
    /// Mean wind speed in m/s, rounded to 2 decimals.
    pub avg_wind_speed: f64,
    /// First wind direction sample of the day, `"N"` when none.
    pub wind_direction: String,
}

/// Sync lifecycle state for a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// No sync has run yet.
    Idle,
    /// A sync cycle is in flight.
    Syncing,
    /// The last sync cycle completed successfully.
    Synced,
    /// The last sync cycle failed.
    Error,
}

impl SyncStatus {
    /// Stable label used for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }

    /// Parse a persisted label.
    pub fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "idle" => Ok(SyncStatus::Idle),
            "syncing" => Ok(SyncStatus::Syncing),
            "synced" => Ok(SyncStatus::Synced),
            "error" => Ok(SyncStatus::Error),
            other => Err(ParseError::UnknownStatus(other.to_string())),
        }
    }
}

/// Transient per-station sync bookkeeping, held in memory by the sync
/// manager and reset on process restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// Current lifecycle state.
    pub status: SyncStatus,
    /// Error detail from the last failed cycle, if any.
    pub last_error: Option<String>,
    /// When the last successful sync completed.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_sync_time: Option<OffsetDateTime>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            status: SyncStatus::Idle,
            last_error: None,
            last_sync_time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_key_codes_roundtrip() {
        for key in SensorKey::ALL {
            assert_eq!(SensorKey::from_code(key.code()).unwrap(), key);
        }
    }

    #[test]
    fn test_sensor_key_unknown_code() {
        let err = SensorKey::from_code("XYZ").unwrap_err();
        assert!(err.to_string().contains("XYZ"));
    }

    #[test]
    fn test_only_wind_direction_is_categorical() {
        for key in SensorKey::ALL {
            assert_eq!(key.is_categorical(), key == SensorKey::WindDirection);
        }
    }

    #[test]
    fn test_summary_keys_are_subset_of_all() {
        for key in SensorKey::SUMMARY {
            assert!(SensorKey::ALL.contains(&key));
        }
    }

    #[test]
    fn test_sensor_value_coercion() {
        assert_eq!(SensorValue::Number(4.2).as_number(), 4.2);
        assert_eq!(SensorValue::from("3.5").as_number(), 3.5);
        assert_eq!(SensorValue::from(" 12 ").as_number(), 12.0);
        // Parse failure falls back to zero
        assert_eq!(SensorValue::from("N").as_number(), 0.0);
        assert_eq!(SensorValue::from("").as_number(), 0.0);
    }

    #[test]
    fn test_sensor_value_text() {
        assert_eq!(SensorValue::from("SW").as_text(), Some("SW"));
        assert_eq!(SensorValue::Number(1.0).as_text(), None);
    }

    #[test]
    fn test_empty_snapshot_defaults() {
        let snap = StationSnapshot::empty("S1");
        assert_eq!(snap.station_id, "S1");
        assert_eq!(snap.temperature, 0.0);
        assert_eq!(snap.wind_direction, "N");
        assert_eq!(snap.heat_index, 0.0);
    }

    #[test]
    fn test_sync_status_labels_roundtrip() {
        for status in [
            SyncStatus::Idle,
            SyncStatus::Syncing,
            SyncStatus::Synced,
            SyncStatus::Error,
        ] {
            assert_eq!(SyncStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(SyncStatus::from_str("bogus").is_err());
    }

    #[test]
    fn test_sync_state_default_is_idle() {
        let state = SyncState::default();
        assert_eq!(state.status, SyncStatus::Idle);
        assert!(state.last_error.is_none());
        assert!(state.last_sync_time.is_none());
    }

    #[test]
    fn test_reading_serialization() {
        let reading = SensorReading {
            station_id: "S1".to_string(),
            key: SensorKey::WindDirection,
            timestamp: 1_700_000_000,
            value: SensorValue::from("NE"),
        };

        let json = serde_json::to_string(&reading).unwrap();
        assert!(json.contains("\"NE\""));

        let back: SensorReading = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reading);
    }
}
