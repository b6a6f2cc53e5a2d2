//! Weather alert types.

use serde::{Deserialize, Serialize};

/// Category of weather alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Heat index alerts.
    Heat,
    /// Rainfall / flood alerts.
    Rain,
    /// Wind speed alerts.
    Wind,
    /// Air temperature alerts (high ladder plus a low-end cold advisory).
    Temperature,
}

impl AlertKind {
    /// Short code used in alert ids and dedup keys.
    pub fn code(&self) -> &'static str {
        match self {
            AlertKind::Heat => "heat",
            AlertKind::Rain => "rain",
            AlertKind::Wind => "wind",
            AlertKind::Temperature => "temp",
        }
    }
}

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Ordinal rank for comparisons: low < medium < high < critical.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// A threshold-crossing alert raised for one station and metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    /// Unique id, `<kind>-<station>-<millis>`.
    pub id: String,
    /// Alert category.
    pub kind: AlertKind,
    /// Severity at the time the alert was raised.
    pub severity: Severity,
    /// Short human-readable title.
    pub title: String,
    /// Full alert message.
    pub message: String,
    /// The breakpoint value that was crossed.
    pub threshold: f64,
    /// The measured value that triggered the alert.
    pub current_value: f64,
    /// Station identifier.
    pub station_id: String,
    /// Station display name.
    pub station_name: String,
    /// When the alert was raised (unix milliseconds).
    pub timestamp: i64,
}

impl WeatherAlert {
    /// Dedup key for the active-alert map: one slot per `(kind, station)`.
    pub fn dedup_key(&self) -> String {
        format!("{}-{}", self.kind.code(), self.station_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::Critical.rank(), 4);
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
        let back: Severity = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(back, Severity::Medium);
    }

    #[test]
    fn test_dedup_key() {
        let alert = WeatherAlert {
            id: "heat-S1-123".to_string(),
            kind: AlertKind::Heat,
            severity: Severity::Medium,
            title: "Heat Advisory".to_string(),
            message: "Hot".to_string(),
            threshold: 35.0,
            current_value: 36.0,
            station_id: "S1".to_string(),
            station_name: "Station One".to_string(),
            timestamp: 123,
        };
        assert_eq!(alert.dedup_key(), "heat-S1");
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(AlertKind::Temperature.code(), "temp");
        assert_eq!(AlertKind::Rain.code(), "rain");
    }
}
