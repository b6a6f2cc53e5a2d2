//! In-memory test doubles for the trait seams in [`crate::traits`].
//!
//! These live in the library (not behind `cfg(test)`) so downstream crates
//! and integration tests can script remote data, connectivity flips, and
//! notification capture without a network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use stratus_types::SensorKey;

use crate::error::{Error, Result};
use crate::sample::RawSample;
use crate::traits::{ConnectivitySignal, Notification, NotificationSink, RemoteSource};

/// Scripted remote source backed by an in-memory sample table.
///
/// Clones share state, so a test can keep a handle for injecting failures
/// while the engine owns another.
#[derive(Clone, Default)]
pub struct MockRemoteSource {
    inner: Arc<RemoteInner>,
}

#[derive(Default)]
struct RemoteInner {
    samples: Mutex<HashMap<(String, SensorKey), Vec<RawSample>>>,
    failing_keys: Mutex<HashSet<(String, SensorKey)>>,
    unreachable: AtomicBool,
    latency: Mutex<Option<Duration>>,
    latest_calls: AtomicU32,
    range_calls: AtomicU32,
}

impl MockRemoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample for one station and sensor.
    pub fn add_sample(
        &self,
        station_id: &str,
        key: SensorKey,
        timestamp: i64,
        value: impl Into<serde_json::Value>,
    ) {
        let mut samples = self.inner.samples.lock().unwrap();
        let series = samples
            .entry((station_id.to_string(), key))
            .or_default();
        series.push(RawSample::new(timestamp, value.into()));
        series.sort_by_key(|s| s.timestamp);
    }

    /// Make fetches for one station/sensor pair fail.
    pub fn fail_key(&self, station_id: &str, key: SensorKey) {
        self.inner
            .failing_keys
            .lock()
            .unwrap()
            .insert((station_id.to_string(), key));
    }

    /// Make every fetch fail, simulating a dead network.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Delay every fetch, for tests exercising in-flight overlap.
    pub fn set_latency(&self, latency: Duration) {
        *self.inner.latency.lock().unwrap() = Some(latency);
    }

    /// Number of `fetch_latest` calls observed.
    pub fn latest_calls(&self) -> u32 {
        self.inner.latest_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_range` calls observed.
    pub fn range_calls(&self) -> u32 {
        self.inner.range_calls.load(Ordering::SeqCst)
    }

    async fn gate(&self, station_id: &str, key: SensorKey) -> Result<()> {
        let latency = *self.inner.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.inner.unreachable.load(Ordering::SeqCst) {
            return Err(Error::remote("remote unreachable"));
        }
        if self
            .inner
            .failing_keys
            .lock()
            .unwrap()
            .contains(&(station_id.to_string(), key))
        {
            return Err(Error::remote(format!(
                "scripted failure for {}/{}",
                station_id,
                key.code()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSource for MockRemoteSource {
    async fn fetch_latest(&self, station_id: &str, key: SensorKey) -> Result<Option<RawSample>> {
        self.inner.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.gate(station_id, key).await?;

        let samples = self.inner.samples.lock().unwrap();
        Ok(samples
            .get(&(station_id.to_string(), key))
            .and_then(|series| series.last())
            .cloned())
    }

    async fn fetch_range(
        &self,
        station_id: &str,
        key: SensorKey,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<RawSample>> {
        self.inner.range_calls.fetch_add(1, Ordering::SeqCst);
        self.gate(station_id, key).await?;

        let samples = self.inner.samples.lock().unwrap();
        Ok(samples
            .get(&(station_id.to_string(), key))
            .map(|series| {
                series
                    .iter()
                    .filter(|s| s.timestamp >= from_ts && s.timestamp <= to_ts)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Connectivity signal driven by the test.
pub struct MockConnectivity {
    tx: watch::Sender<bool>,
    probe_override: Mutex<Option<bool>>,
}

impl MockConnectivity {
    pub fn new(initial: bool) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            probe_override: Mutex::new(None),
        }
    }

    /// Flip the connectivity snapshot and notify subscribers.
    pub fn set_connected(&self, connected: bool) {
        let _ = self.tx.send(connected);
    }

    /// Force the active probe to a fixed result, independent of the
    /// snapshot. Models a stale platform indicator.
    pub fn set_probe_result(&self, reachable: bool) {
        *self.probe_override.lock().unwrap() = Some(reachable);
    }
}

#[async_trait]
impl ConnectivitySignal for MockConnectivity {
    fn connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    async fn probe(&self) -> bool {
        self.probe_override
            .lock()
            .unwrap()
            .unwrap_or_else(|| self.connected())
    }
}

/// Notification sink that records everything it is shown.
#[derive(Default)]
pub struct RecordingSink {
    shown: Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Everything shown so far, oldest first.
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    /// Number of notifications shown.
    pub fn count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn show(&self, notification: &Notification) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Notification("scripted delivery failure".into()));
        }
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
