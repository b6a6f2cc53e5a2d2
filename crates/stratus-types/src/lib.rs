//! Shared data model for stratus weather station synchronization.
//!
//! This crate provides the types exchanged between the sync engine
//! (`stratus-core`), the local persistence layer (`stratus-store`), and the
//! service binary: sensor readings, station snapshots, daily summaries,
//! sync state, and weather alerts.
//!
//! # Example
//!
//! ```
//! use stratus_types::{SensorKey, SensorValue, SensorReading};
//!
//! let reading = SensorReading {
//!     station_id: "S1".to_string(),
//!     key: SensorKey::Temperature,
//!     timestamp: 1_700_000_000,
//!     value: SensorValue::Number(31.5),
//! };
//! assert_eq!(reading.key.code(), "TEM");
//! ```

pub mod alert;
pub mod error;
pub mod types;

pub use alert::{AlertKind, Severity, WeatherAlert};
pub use error::{ParseError, ParseResult};
pub use types::{
    DailySummary, SensorKey, SensorReading, SensorValue, StationSnapshot, SyncState, SyncStatus,
};
