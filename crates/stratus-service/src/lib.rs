//! Stratus daemon building blocks.
//!
//! The binary in `main.rs` wires [`stratus_core`] to the outside world:
//! TOML configuration, an HTTP remote source, an HTTP reachability signal,
//! and log-based alert delivery.

pub mod config;
pub mod connectivity;
pub mod remote;
pub mod sink;

pub use config::{ServiceConfig, StationConfig};
pub use connectivity::HttpConnectivity;
pub use remote::HttpRemoteSource;
pub use sink::LogNotificationSink;
