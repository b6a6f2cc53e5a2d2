//! Trait seams for the external collaborators of the sync engine.
//!
//! Everything the engine needs from the outside world - the remote
//! time-series source, the platform connectivity indicator, and the
//! notification transport - comes in through these traits, so tests run
//! against the mocks in [`crate::mock`] and the service binary plugs in
//! its HTTP-backed implementations.

use async_trait::async_trait;
use tokio::sync::watch;

use stratus_types::SensorKey;

use crate::error::Result;
use crate::sample::RawSample;

/// Remote time-series source for station sensor data.
///
/// Values may arrive as raw strings requiring numeric coercion; decoding
/// leniency is handled by [`RawSample::decode`], not by implementations.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the most recent sample for one station and sensor, if any.
    async fn fetch_latest(&self, station_id: &str, key: SensorKey) -> Result<Option<RawSample>>;

    /// Fetch all samples in the inclusive timestamp range, ordered by
    /// timestamp ascending.
    async fn fetch_range(
        &self,
        station_id: &str,
        key: SensorKey,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<RawSample>>;
}

/// A notification handed to the delivery transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Short title.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Optional icon hint.
    pub icon: Option<String>,
    /// Structured payload for downstream consumers.
    pub data: serde_json::Value,
}

/// Best-effort notification delivery. Failures are logged by callers and
/// never roll back alert state.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification.
    async fn show(&self, notification: &Notification) -> Result<()>;
}

/// Platform connectivity indicator: a boolean snapshot plus a
/// subscribe-to-change capability, with an optional active probe.
#[async_trait]
pub trait ConnectivitySignal: Send + Sync {
    /// Current "connected" snapshot.
    fn connected(&self) -> bool;

    /// Subscribe to connectivity change events.
    fn subscribe(&self) -> watch::Receiver<bool>;

    /// Perform a lightweight reachability probe.
    ///
    /// The default implementation just returns the snapshot; real
    /// implementations should issue a cheap no-op network request.
    async fn probe(&self) -> bool {
        self.connected()
    }
}
