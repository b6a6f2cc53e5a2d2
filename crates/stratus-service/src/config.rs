//! Daemon configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Daemon configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Remote settings.
    pub remote: RemoteConfig,
    /// Sync cadence and windows.
    pub sync: SyncSettings,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Alert threshold overrides.
    pub alerts: AlertSettings,
    /// Stations to track.
    #[serde(default)]
    pub stations: Vec<StationConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            sync: SyncSettings::default(),
            storage: StorageConfig::default(),
            alerts: AlertSettings::default(),
            stations: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the default path, falling back to defaults
    /// when no file exists.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }
}

/// Remote data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the station data API.
    pub base_url: String,
    /// URL probed to detect connectivity (HEAD request).
    pub probe_url: String,
    /// Seconds between reachability probes.
    pub probe_interval_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.stratus-weather.example/api".to_string(),
            probe_url: "https://data.stratus-weather.example/health".to_string(),
            probe_interval_secs: 5,
        }
    }
}

/// Sync cadence and aggregation windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Minutes between automatic station syncs.
    pub interval_minutes: u64,
    /// Days covered by the rolling summary window.
    pub summary_window_days: u32,
    /// Hours offset from UTC used for calendar-day bucketing.
    pub utc_offset_hours: i8,
    /// Days of raw readings and summaries to retain locally.
    pub retention_days: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
            summary_window_days: 7,
            utc_offset_hours: 8,
            retention_days: 30,
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database path.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: stratus_store::default_db_path(),
        }
    }
}

/// Alert threshold overrides. Fields mirror the engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub heat: [f64; 3],
    pub rainfall: [f64; 3],
    pub wind: [f64; 3],
    /// Low advisory, high warning, critical warning.
    pub temperature: [f64; 3],
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            heat: [35.0, 38.0, 42.0],
            rainfall: [50.0, 100.0, 200.0],
            wind: [10.0, 15.0, 20.0],
            temperature: [15.0, 40.0, 45.0],
        }
    }
}

/// One tracked station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    /// Station identifier used by the remote API.
    pub id: String,
    /// Display name used in alerts.
    #[serde(default)]
    pub name: Option<String>,
}

impl StationConfig {
    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Default configuration path: `<config_dir>/stratus/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stratus")
        .join("config.toml")
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.sync.interval_minutes, 30);
        assert_eq!(config.sync.utc_offset_hours, 8);
        assert_eq!(config.remote.probe_interval_secs, 5);
        assert!(config.stations.is_empty());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            [sync]
            interval_minutes = 10
            utc_offset_hours = 0

            [[stations]]
            id = "S1"
            name = "Campus Roof"

            [[stations]]
            id = "S2"
        "#;
        let config: ServiceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.sync.interval_minutes, 10);
        assert_eq!(config.sync.utc_offset_hours, 0);
        // Unspecified sections keep their defaults
        assert_eq!(config.sync.summary_window_days, 7);
        assert_eq!(config.alerts.heat, [35.0, 38.0, 42.0]);

        assert_eq!(config.stations.len(), 2);
        assert_eq!(config.stations[0].display_name(), "Campus Roof");
        assert_eq!(config.stations[1].display_name(), "S2");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = ServiceConfig::load("/nonexistent/config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync]\nretention_days = 14\n").unwrap();

        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.sync.retention_days, 14);
    }
}
