//! Local data persistence for stratus station readings.
//!
//! This crate provides SQLite-based storage for raw sensor readings, station
//! snapshots, daily summaries, and durable sync status, enabling offline
//! access when the remote data source is unreachable.
//!
//! # Features
//!
//! - Idempotent upsert of raw readings on their natural key
//! - Wholesale replacement of per-station snapshots
//! - Daily summary upserts and date-range queries
//! - Durable sync status and a small key/value state table
//! - Retention cleanup and size diagnostics
//!
//! # Example
//!
//! ```no_run
//! use stratus_store::Store;
//!
//! let store = Store::open_default()?;
//! let snapshot = store.get_station_data("S1")?;
//! # Ok::<(), stratus_store::Error>(())
//! ```

mod error;
mod schema;
mod store;

pub use error::{Error, Result};
pub use store::{Store, StoreStats};

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/stratus/data.db`
/// - macOS: `~/Library/Application Support/stratus/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\stratus\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("stratus")
        .join("data.db")
}
