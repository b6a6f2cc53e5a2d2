//! Offline-first synchronization engine for stratus weather stations.
//!
//! This crate pulls time-series sensor readings from a remote data source,
//! keeps a durable local replica via [`stratus_store`], derives rolling
//! aggregates and heat index, and raises threshold-based alerts - all while
//! tolerating intermittent connectivity.
//!
//! The external world is reached only through trait seams:
//!
//! - [`RemoteSource`] - the remote time-series API
//! - [`ConnectivitySignal`] - the platform connectivity indicator
//! - [`NotificationSink`] - best-effort alert delivery
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use stratus_core::{SyncConfig, SyncManager};
//!
//! let store = stratus_store::Store::open_default()?;
//! let manager = SyncManager::new(store, remote, SyncConfig::default());
//! if manager.sync_all_station_data("S1").await {
//!     println!("synced");
//! }
//! ```

pub mod alerts;
pub mod cache;
pub mod error;
pub mod heat_index;
pub mod mock;
pub mod netmon;
pub mod sample;
pub mod sync;
pub mod traits;
mod util;

pub use alerts::{AlertEngine, AlertThresholds, TemperatureThresholds, ThresholdLadder};
pub use cache::{CacheEntry, ExpiringCache};
pub use error::{Error, Result};
pub use heat_index::heat_index;
pub use netmon::{ListenerHandle, MonitorConfig, NetworkMonitor, NetworkStatus};
pub use sample::RawSample;
pub use sync::{SyncConfig, SyncManager};
pub use traits::{ConnectivitySignal, Notification, NotificationSink, RemoteSource};
