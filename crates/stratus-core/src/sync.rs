//! Sync orchestration between the remote source and the local store.
//!
//! One sync cycle per station pulls the most recent sample of every tracked
//! sensor, writes the raw readings into the store, derives a station
//! snapshot (including heat index), and records the outcome in both the
//! in-memory sync state and the durable sync status table. The engine
//! tolerates partial failure everywhere below its own boundary: a dead
//! sensor or a bad sample never aborts the rest of the cycle, and the
//! public entry points return `false` instead of propagating errors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use time::macros::time;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use stratus_store::{Store, StoreStats};
use stratus_types::{
    DailySummary, SensorKey, SensorReading, SensorValue, StationSnapshot, SyncState, SyncStatus,
};

use crate::error::{Error, Result};
use crate::heat_index::heat_index;
use crate::traits::RemoteSource;
use crate::util::round2;

/// Sync engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fixed offset of the deployment's local timezone. The remote source
    /// stores UTC timestamps but aggregation boundaries are local calendar
    /// days, so this must come from configuration, not a constant.
    pub utc_offset: UtcOffset,
    /// Size of the historical summary window in days.
    pub summary_window_days: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            // Default matches the original deployment timezone (UTC+8)
            utc_offset: UtcOffset::from_hms(8, 0, 0).unwrap_or(UtcOffset::UTC),
            summary_window_days: 7,
        }
    }
}

/// Orchestrates pulls from the remote source into the local store.
pub struct SyncManager {
    store: Arc<Mutex<Store>>,
    remote: Arc<dyn RemoteSource>,
    config: SyncConfig,
    /// At-most-one in-flight sync per process; checked-and-set atomically.
    busy: AtomicBool,
    states: StdMutex<HashMap<String, SyncState>>,
    timers: StdMutex<HashMap<String, JoinHandle<()>>>,
}

impl SyncManager {
    /// Create a sync manager over an opened store and a remote source.
    pub fn new(store: Store, remote: Arc<dyn RemoteSource>, config: SyncConfig) -> Arc<Self> {
        Arc::new(Self {
            store: Arc::new(Mutex::new(store)),
            remote,
            config,
            busy: AtomicBool::new(false),
            states: StdMutex::new(HashMap::new()),
            timers: StdMutex::new(HashMap::new()),
        })
    }

    /// Shared handle to the underlying store, for read-side consumers.
    pub fn store(&self) -> Arc<Mutex<Store>> {
        Arc::clone(&self.store)
    }

    /// In-memory sync state for a station (default [`SyncStatus::Idle`]).
    pub fn sync_state(&self, station_id: &str) -> SyncState {
        self.states
            .lock()
            .unwrap()
            .get(station_id)
            .cloned()
            .unwrap_or_default()
    }

    /// When the last successful sync for a station completed, if ever.
    pub fn get_last_sync_time(&self, station_id: &str) -> Option<OffsetDateTime> {
        self.sync_state(station_id).last_sync_time
    }

    fn set_state(&self, station_id: &str, status: SyncStatus, error: Option<String>) {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(station_id.to_string()).or_default();
        state.status = status;
        state.last_error = error;
        if status == SyncStatus::Synced {
            state.last_sync_time = Some(OffsetDateTime::now_utc());
        }
    }

    /// Pull the latest sample of every tracked sensor and rebuild the
    /// station's snapshot.
    ///
    /// Returns `false` when a sync is already in flight or the cycle
    /// failed; the error detail is preserved in [`Self::sync_state`].
    /// Never propagates an error past its own boundary.
    pub async fn sync_all_station_data(&self, station_id: &str) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Sync already in progress, skipping {}", station_id);
            return false;
        }

        info!("Starting sync for station {}", station_id);
        self.set_state(station_id, SyncStatus::Syncing, None);

        let result = self.run_station_sync(station_id).await;
        self.busy.store(false, Ordering::SeqCst);

        match result {
            Ok(()) => {
                self.set_state(station_id, SyncStatus::Synced, None);
                info!("Sync completed for station {}", station_id);
                true
            }
            Err(e) => {
                error!("Sync failed for station {}: {}", station_id, e);
                self.set_state(station_id, SyncStatus::Error, Some(e.to_string()));
                let store = self.store.lock().await;
                if let Err(se) =
                    store.update_sync_status(station_id, SyncStatus::Error, Some(&e.to_string()))
                {
                    warn!("Failed to persist error status for {}: {}", station_id, se);
                }
                false
            }
        }
    }

    async fn run_station_sync(&self, station_id: &str) -> Result<()> {
        let mut latest: HashMap<SensorKey, (SensorValue, i64)> = HashMap::new();
        let mut fetched_any = false;

        // Sequential per-sensor fetch; one dead sensor must not abort the rest
        for key in SensorKey::ALL {
            let sample = match self.remote.fetch_latest(station_id, key).await {
                Ok(Some(sample)) => sample,
                Ok(None) => {
                    debug!("No {} data for {}", key.code(), station_id);
                    continue;
                }
                Err(e) => {
                    warn!("Failed to fetch {} for {}: {}", key.code(), station_id, e);
                    continue;
                }
            };

            fetched_any = true;
            let value = sample.decode(key);
            let reading = SensorReading {
                station_id: station_id.to_string(),
                key,
                timestamp: sample.timestamp,
                value: value.clone(),
            };

            // Per-item persistence failures are logged, not fatal
            let store = self.store.lock().await;
            if let Err(e) = store.save_sensor_reading(&reading) {
                warn!("Failed to save {} reading for {}: {}", key.code(), station_id, e);
            }
            drop(store);

            latest.insert(key, (value, sample.timestamp));
        }

        if !fetched_any {
            return Err(Error::remote(format!(
                "no sensor data reachable for station {}",
                station_id
            )));
        }

        let snapshot = self.build_snapshot(station_id, &latest);

        let store = self.store.lock().await;
        store.save_station_data(&snapshot)?;
        store.update_sync_status(station_id, SyncStatus::Synced, None)?;

        Ok(())
    }

    fn build_snapshot(
        &self,
        station_id: &str,
        latest: &HashMap<SensorKey, (SensorValue, i64)>,
    ) -> StationSnapshot {
        let number = |key: SensorKey| -> f64 {
            latest.get(&key).map(|(v, _)| v.as_number()).unwrap_or(0.0)
        };

        let wind_direction = latest
            .get(&SensorKey::WindDirection)
            .and_then(|(v, _)| v.as_text().map(str::to_string))
            .unwrap_or_else(|| "N".to_string());

        let temperature = number(SensorKey::Temperature);
        let humidity = number(SensorKey::Humidity);

        let synced_at = OffsetDateTime::now_utc().unix_timestamp();
        // Earliest contributing reading; never later than the sync itself
        let timestamp = latest
            .values()
            .map(|(_, ts)| *ts)
            .min()
            .unwrap_or(synced_at)
            .min(synced_at);

        StationSnapshot {
            station_id: station_id.to_string(),
            temperature,
            humidity,
            rainfall: number(SensorKey::Rainfall),
            wind_speed: number(SensorKey::WindSpeed),
            wind_direction,
            pressure: number(SensorKey::Pressure),
            solar: number(SensorKey::Solar),
            illumination: number(SensorKey::Illumination),
            soil_moisture: number(SensorKey::SoilMoisture),
            soil_temp: number(SensorKey::SoilTemp),
            wind_angle: number(SensorKey::WindAngle),
            heat_index: heat_index(temperature, humidity),
            timestamp,
            synced_at,
        }
    }

    /// Pull a bounded historical window and upsert per-day summaries.
    ///
    /// The window covers `summary_window_days` local calendar days ending
    /// yesterday at 23:59:59 (local time per the configured offset).
    /// A sensor whose fetch fails degrades that metric to its neutral
    /// aggregate rather than aborting the whole window.
    pub async fn sync_7day_summary(&self, station_id: &str) -> bool {
        info!("Starting summary sync for station {}", station_id);

        let offset = self.config.utc_offset;
        let today = OffsetDateTime::now_utc().to_offset(offset).date();
        let Some(yesterday) = today.previous_day() else {
            error!("Cannot compute summary window before the epoch of time");
            return false;
        };
        let start_date = today - time::Duration::days(i64::from(self.config.summary_window_days));

        let from_ts = PrimitiveDateTime::new(start_date, time!(00:00:00))
            .assume_offset(offset)
            .unix_timestamp();
        let to_ts = PrimitiveDateTime::new(yesterday, time!(23:59:59))
            .assume_offset(offset)
            .unix_timestamp();

        let mut buckets: HashMap<Date, DayBucket> = HashMap::new();

        for key in SensorKey::SUMMARY {
            let samples = match self.remote.fetch_range(station_id, key, from_ts, to_ts).await {
                Ok(samples) => samples,
                Err(e) => {
                    warn!(
                        "Failed to fetch {} history for {}: {}",
                        key.code(),
                        station_id,
                        e
                    );
                    continue;
                }
            };

            let mut readings = Vec::with_capacity(samples.len());
            for sample in &samples {
                let value = sample.decode(key);
                readings.push(SensorReading {
                    station_id: station_id.to_string(),
                    key,
                    timestamp: sample.timestamp,
                    value: value.clone(),
                });

                let Ok(moment) = OffsetDateTime::from_unix_timestamp(sample.timestamp) else {
                    warn!("Skipping sample with invalid timestamp {}", sample.timestamp);
                    continue;
                };
                let date = moment.to_offset(offset).date();
                buckets.entry(date).or_default().push(key, &value);
            }

            let store = self.store.lock().await;
            if let Err(e) = store.save_sensor_readings(&readings) {
                warn!(
                    "Failed to save {} history batch for {}: {}",
                    key.code(),
                    station_id,
                    e
                );
            }
        }

        if buckets.is_empty() {
            warn!("No historical data for station {} in window", station_id);
            return false;
        }

        let store = self.store.lock().await;
        for (date, bucket) in buckets {
            let summary = bucket.into_summary(station_id, date);
            if let Err(e) = store.save_daily_summary(&summary) {
                warn!("Failed to save summary {}/{}: {}", station_id, date, e);
            }
        }

        info!("Summary sync completed for station {}", station_id);
        true
    }
}

// Read-side passthroughs: stale-but-available data beats no data, so these
// log failures and return empty results instead of erroring.
impl SyncManager {
    /// Last-known snapshot from the local store.
    pub async fn get_local_station_data(&self, station_id: &str) -> Option<StationSnapshot> {
        match self.store.lock().await.get_station_data(station_id) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Error reading local station data: {}", e);
                None
            }
        }
    }

    /// All locally known snapshots.
    pub async fn get_all_local_station_data(&self) -> Vec<StationSnapshot> {
        match self.store.lock().await.get_all_station_data() {
            Ok(snapshots) => snapshots,
            Err(e) => {
                error!("Error reading local station data: {}", e);
                Vec::new()
            }
        }
    }

    /// Locally stored daily summaries for the configured window up to today.
    pub async fn get_local_7day_summary(&self, station_id: &str) -> Vec<DailySummary> {
        let today = OffsetDateTime::now_utc()
            .to_offset(self.config.utc_offset)
            .date();
        let from = today - time::Duration::days(i64::from(self.config.summary_window_days));

        match self.store.lock().await.get_daily_summaries(station_id, from, today) {
            Ok(summaries) => summaries,
            Err(e) => {
                error!("Error reading local summaries: {}", e);
                Vec::new()
            }
        }
    }

    /// Delete data older than the retention window.
    pub async fn clear_old_data(&self, days_to_keep: u32) {
        if let Err(e) = self.store.lock().await.clear_old_data(days_to_keep) {
            error!("Error clearing old data: {}", e);
        }
    }

    /// Store row counts and size, for diagnostics.
    pub async fn stats(&self) -> Option<StoreStats> {
        match self.store.lock().await.stats() {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!("Error reading store stats: {}", e);
                None
            }
        }
    }
}

// Auto-sync scheduling
impl SyncManager {
    /// Schedule a periodic sync for a station.
    ///
    /// Re-calling for the same station replaces the previous schedule; no
    /// duplicate timers are ever left running.
    pub fn setup_auto_sync(self: &Arc<Self>, station_id: &str, interval_minutes: u64) {
        // A zero period would panic the interval timer
        let minutes = interval_minutes.max(1);
        if minutes != interval_minutes {
            warn!("Auto-sync interval of 0 clamped to 1 minute for {}", station_id);
        }

        let station = station_id.to_string();
        let weak = Arc::downgrade(self);
        let period = Duration::from_secs(minutes * 60);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; consume it so the first
            // scheduled sync happens one full interval from now
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = weak.upgrade() else {
                    break;
                };
                manager.sync_all_station_data(&station).await;
            }
        });

        let mut timers = self.timers.lock().unwrap();
        if let Some(previous) = timers.insert(station_id.to_string(), task) {
            previous.abort();
        }
        info!(
            "Auto-sync scheduled for station {} every {} minutes",
            station_id, minutes
        );
    }

    /// Cancel the periodic sync for one station, if scheduled.
    pub fn stop_auto_sync(&self, station_id: &str) {
        if let Some(task) = self.timers.lock().unwrap().remove(station_id) {
            task.abort();
            info!("Auto-sync stopped for station {}", station_id);
        }
    }

    /// Cancel every scheduled station.
    pub fn stop_all(&self) {
        let mut timers = self.timers.lock().unwrap();
        for (station_id, task) in timers.drain() {
            task.abort();
            debug!("Auto-sync stopped for station {}", station_id);
        }
        info!("All auto-sync schedules stopped");
    }
}

impl Drop for SyncManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Per-day accumulator for summary aggregation.
#[derive(Debug, Default)]
struct DayBucket {
    temperature: Vec<f64>,
    humidity: Vec<f64>,
    rainfall: Vec<f64>,
    wind_speed: Vec<f64>,
    wind_direction: Vec<String>,
}

impl DayBucket {
    fn push(&mut self, key: SensorKey, value: &SensorValue) {
        match key {
            SensorKey::Temperature => self.temperature.push(value.as_number()),
            SensorKey::Humidity => self.humidity.push(value.as_number()),
            SensorKey::Rainfall => self.rainfall.push(value.as_number()),
            SensorKey::WindSpeed => self.wind_speed.push(value.as_number()),
            SensorKey::WindDirection => {
                if let Some(text) = value.as_text() {
                    self.wind_direction.push(text.to_string());
                }
            }
            _ => {}
        }
    }

    fn into_summary(self, station_id: &str, date: Date) -> DailySummary {
        // First sample of the day, a deliberate simplification kept for
        // downstream compatibility (no circular mean)
        let wind_direction = self
            .wind_direction
            .into_iter()
            .next()
            .unwrap_or_else(|| "N".to_string());

        DailySummary {
            station_id: station_id.to_string(),
            date,
            avg_temperature: round2(mean(&self.temperature)),
            avg_humidity: round2(mean(&self.humidity)),
            total_rainfall: round2(self.rainfall.iter().sum()),
            avg_wind_speed: round2(mean(&self.wind_speed)),
            wind_direction,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
