//! Threshold-based weather alerting.
//!
//! Each snapshot check walks four metric ladders (heat index, rainfall,
//! wind speed, air temperature) from the most severe breakpoint down. One
//! active alert slot exists per `(kind, station)`; a notification goes out
//! only when a slot fills for the first time or its severity increases, so
//! a station sitting above a threshold for hours produces exactly one
//! notification, not one per sync.
//!
//! Active alerts and a short history tail survive restarts through the
//! store's `app_state` table.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};

use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use stratus_store::Store;
use stratus_types::{AlertKind, Severity, StationSnapshot, WeatherAlert};

use crate::traits::{Notification, NotificationSink};

const HISTORY_LIMIT: usize = 50;
const PERSISTED_HISTORY: usize = 10;
const ACTIVE_STATE_KEY: &str = "weather_alerts_active";
const HISTORY_STATE_KEY: &str = "weather_alerts_history";

/// Three ascending breakpoints mapping a metric to a severity.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdLadder {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl ThresholdLadder {
    /// Severity and the breakpoint crossed, highest first; `None` below
    /// the ladder.
    fn classify(&self, value: f64) -> Option<(Severity, f64)> {
        if value >= self.critical {
            Some((Severity::Critical, self.critical))
        } else if value >= self.high {
            Some((Severity::High, self.high))
        } else if value >= self.medium {
            Some((Severity::Medium, self.medium))
        } else {
            None
        }
    }
}

/// Air temperature ladder: a high-end pair plus a low-end cold advisory.
#[derive(Debug, Clone, Copy)]
pub struct TemperatureThresholds {
    pub low: f64,
    pub high: f64,
    pub critical: f64,
}

impl TemperatureThresholds {
    fn classify(&self, value: f64) -> Option<(Severity, f64)> {
        if value >= self.critical {
            Some((Severity::Critical, self.critical))
        } else if value >= self.high {
            Some((Severity::High, self.high))
        } else if value <= self.low {
            Some((Severity::Low, self.low))
        } else {
            None
        }
    }
}

/// Full threshold configuration, one ladder per alert kind.
#[derive(Debug, Clone, Copy)]
pub struct AlertThresholds {
    /// Heat index, degrees Celsius.
    pub heat: ThresholdLadder,
    /// Rainfall, millimeters.
    pub rainfall: ThresholdLadder,
    /// Wind speed, meters per second.
    pub wind: ThresholdLadder,
    /// Air temperature, degrees Celsius.
    pub temperature: TemperatureThresholds,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            heat: ThresholdLadder {
                medium: 35.0,
                high: 38.0,
                critical: 42.0,
            },
            rainfall: ThresholdLadder {
                medium: 50.0,
                high: 100.0,
                critical: 200.0,
            },
            wind: ThresholdLadder {
                medium: 10.0,
                high: 15.0,
                critical: 20.0,
            },
            temperature: TemperatureThresholds {
                low: 15.0,
                high: 40.0,
                critical: 45.0,
            },
        }
    }
}

/// Evaluates snapshots against thresholds and manages alert lifecycle.
pub struct AlertEngine {
    store: Arc<Mutex<Store>>,
    sink: Arc<dyn NotificationSink>,
    thresholds: AlertThresholds,
    /// One slot per dedup key (`<kind>-<station>`).
    active: StdMutex<HashMap<String, WeatherAlert>>,
    /// Newest first, capped at [`HISTORY_LIMIT`].
    history: StdMutex<VecDeque<WeatherAlert>>,
}

impl AlertEngine {
    pub fn new(
        store: Arc<Mutex<Store>>,
        sink: Arc<dyn NotificationSink>,
        thresholds: AlertThresholds,
    ) -> Self {
        Self {
            store,
            sink,
            thresholds,
            active: StdMutex::new(HashMap::new()),
            history: StdMutex::new(VecDeque::new()),
        }
    }

    /// Reload persisted alert state from the store.
    ///
    /// Missing or corrupt state starts the engine empty; corruption is the
    /// store's problem to evict, not ours to crash on.
    pub async fn initialize(&self) {
        let store = self.store.lock().await;

        match store.get_app_state::<Vec<(String, WeatherAlert)>>(ACTIVE_STATE_KEY) {
            Ok(Some(entries)) => {
                let mut active = self.active.lock().unwrap();
                *active = entries.into_iter().collect();
                info!("Restored {} active alerts", active.len());
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to restore active alerts: {}", e),
        }

        match store.get_app_state::<Vec<WeatherAlert>>(HISTORY_STATE_KEY) {
            Ok(Some(entries)) => {
                *self.history.lock().unwrap() = entries.into();
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to restore alert history: {}", e),
        }
    }

    /// Evaluate one station snapshot against every ladder.
    ///
    /// Returns the alerts raised or escalated by this check. Metrics equal
    /// to zero are treated as "not reported" and skipped.
    pub async fn check_weather_conditions(
        &self,
        snapshot: &StationSnapshot,
        station_name: &str,
    ) -> Vec<WeatherAlert> {
        let mut candidates = Vec::new();

        if snapshot.heat_index != 0.0 {
            if let Some((severity, threshold)) = self.thresholds.heat.classify(snapshot.heat_index)
            {
                candidates.push((AlertKind::Heat, severity, threshold, snapshot.heat_index));
            }
        }
        if snapshot.rainfall != 0.0 {
            if let Some((severity, threshold)) = self.thresholds.rainfall.classify(snapshot.rainfall)
            {
                candidates.push((AlertKind::Rain, severity, threshold, snapshot.rainfall));
            }
        }
        if snapshot.wind_speed != 0.0 {
            if let Some((severity, threshold)) = self.thresholds.wind.classify(snapshot.wind_speed)
            {
                candidates.push((AlertKind::Wind, severity, threshold, snapshot.wind_speed));
            }
        }
        if snapshot.temperature != 0.0 {
            if let Some((severity, threshold)) =
                self.thresholds.temperature.classify(snapshot.temperature)
            {
                candidates.push((
                    AlertKind::Temperature,
                    severity,
                    threshold,
                    snapshot.temperature,
                ));
            }
        }

        let mut raised = Vec::new();
        for (kind, severity, threshold, value) in candidates {
            let alert = build_alert(
                kind,
                severity,
                threshold,
                value,
                &snapshot.station_id,
                station_name,
            );

            let should_notify = {
                let mut active = self.active.lock().unwrap();
                let key = alert.dedup_key();
                match active.get(&key) {
                    Some(existing) if existing.severity.rank() >= severity.rank() => {
                        debug!("Alert {} already active at >= severity, skipping", key);
                        false
                    }
                    _ => {
                        active.insert(key, alert.clone());
                        true
                    }
                }
            };

            if !should_notify {
                continue;
            }

            info!(
                "Raising {} alert ({:?}) for station {}: {} >= {}",
                alert.kind.code(),
                alert.severity,
                alert.station_id,
                alert.current_value,
                alert.threshold
            );

            {
                let mut history = self.history.lock().unwrap();
                history.push_front(alert.clone());
                history.truncate(HISTORY_LIMIT);
            }

            self.persist().await;
            self.notify(&alert).await;
            raised.push(alert);
        }

        raised
    }

    /// Currently active alerts, in no particular order.
    pub fn get_active_alerts(&self) -> Vec<WeatherAlert> {
        self.active.lock().unwrap().values().cloned().collect()
    }

    /// Alert history, newest first.
    pub fn get_alert_history(&self) -> Vec<WeatherAlert> {
        self.history.lock().unwrap().iter().cloned().collect()
    }

    /// Clear one active alert slot, re-arming its notifications.
    pub async fn clear_alert(&self, kind: AlertKind, station_id: &str) {
        let key = format!("{}-{}", kind.code(), station_id);
        let removed = self.active.lock().unwrap().remove(&key).is_some();
        if removed {
            debug!("Cleared alert {}", key);
            self.persist().await;
        }
    }

    /// Clear every active alert slot.
    pub async fn clear_all_alerts(&self) {
        self.active.lock().unwrap().clear();
        self.persist().await;
    }

    async fn persist(&self) {
        let active: Vec<(String, WeatherAlert)> = {
            let map = self.active.lock().unwrap();
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        let history: Vec<WeatherAlert> = {
            let history = self.history.lock().unwrap();
            history.iter().take(PERSISTED_HISTORY).cloned().collect()
        };

        let store = self.store.lock().await;
        if let Err(e) = store.set_app_state(ACTIVE_STATE_KEY, &active) {
            warn!("Failed to persist active alerts: {}", e);
        }
        if let Err(e) = store.set_app_state(HISTORY_STATE_KEY, &history) {
            warn!("Failed to persist alert history: {}", e);
        }
    }

    async fn notify(&self, alert: &WeatherAlert) {
        let notification = Notification {
            title: alert.title.clone(),
            body: alert.message.clone(),
            icon: Some(alert.kind.code().to_string()),
            data: serde_json::to_value(alert).unwrap_or(serde_json::Value::Null),
        };
        // Delivery is best-effort; the alert stays active either way
        if let Err(e) = self.sink.show(&notification).await {
            warn!("Failed to deliver alert notification {}: {}", alert.id, e);
        }
    }
}

fn build_alert(
    kind: AlertKind,
    severity: Severity,
    threshold: f64,
    value: f64,
    station_id: &str,
    station_name: &str,
) -> WeatherAlert {
    let timestamp = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
    let (title, message) = alert_text(kind, severity, value, station_name);

    WeatherAlert {
        id: format!("{}-{}-{}", kind.code(), station_id, timestamp),
        kind,
        severity,
        title,
        message,
        threshold,
        current_value: value,
        station_id: station_id.to_string(),
        station_name: station_name.to_string(),
        timestamp,
    }
}

fn alert_text(
    kind: AlertKind,
    severity: Severity,
    value: f64,
    station_name: &str,
) -> (String, String) {
    match kind {
        AlertKind::Heat => {
            let title = match severity {
                Severity::Critical => "Extreme Heat Danger",
                Severity::High => "Excessive Heat Warning",
                _ => "Heat Advisory",
            };
            (
                title.to_string(),
                format!("Heat index at {} has reached {:.1}°C", station_name, value),
            )
        }
        AlertKind::Rain => {
            let title = match severity {
                Severity::Critical => "Flood Warning",
                Severity::High => "Heavy Rainfall Warning",
                _ => "Rainfall Advisory",
            };
            (
                title.to_string(),
                format!("Rainfall at {} has reached {:.1} mm", station_name, value),
            )
        }
        AlertKind::Wind => {
            let title = match severity {
                Severity::Critical => "Dangerous Wind Warning",
                Severity::High => "Strong Wind Warning",
                _ => "Wind Advisory",
            };
            (
                title.to_string(),
                format!("Wind speed at {} has reached {:.1} m/s", station_name, value),
            )
        }
        AlertKind::Temperature => {
            let title = match severity {
                Severity::Critical => "Extreme Temperature Warning",
                Severity::High => "High Temperature Warning",
                _ => "Cold Weather Advisory",
            };
            (
                title.to_string(),
                format!("Temperature at {} is {:.1}°C", station_name, value),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingSink;

    fn engine() -> (AlertEngine, Arc<RecordingSink>, Arc<Mutex<Store>>) {
        let store = Arc::new(Mutex::new(Store::open_in_memory().unwrap()));
        let sink = Arc::new(RecordingSink::new());
        let engine = AlertEngine::new(
            Arc::clone(&store),
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
            AlertThresholds::default(),
        );
        (engine, sink, store)
    }

    fn snapshot_with_heat(station_id: &str, heat_index: f64) -> StationSnapshot {
        let mut snap = StationSnapshot::empty(station_id);
        snap.heat_index = heat_index;
        snap
    }

    #[tokio::test]
    async fn test_ladder_classification() {
        let ladder = AlertThresholds::default().heat;
        assert_eq!(ladder.classify(34.9), None);
        assert_eq!(ladder.classify(35.0), Some((Severity::Medium, 35.0)));
        assert_eq!(ladder.classify(38.0), Some((Severity::High, 38.0)));
        assert_eq!(ladder.classify(42.0), Some((Severity::Critical, 42.0)));
    }

    #[tokio::test]
    async fn test_severity_escalation_notifies_exactly_twice() {
        let (engine, sink, _store) = engine();

        // medium, then high, then back to medium
        for heat in [36.0, 39.0, 36.0] {
            engine
                .check_weather_conditions(&snapshot_with_heat("S1", heat), "Station One")
                .await;
        }

        assert_eq!(sink.count(), 2);
        let shown = sink.shown();
        assert_eq!(shown[0].title, "Heat Advisory");
        assert_eq!(shown[1].title, "Excessive Heat Warning");

        // The slot keeps the highest severity seen
        let active = engine.get_active_alerts();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_repeated_same_severity_notifies_once() {
        let (engine, sink, _store) = engine();
        for _ in 0..5 {
            engine
                .check_weather_conditions(&snapshot_with_heat("S1", 36.0), "Station One")
                .await;
        }
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn test_zero_metrics_are_skipped() {
        let (engine, sink, _store) = engine();
        // All metrics zero; the temperature low ladder (<= 15) must not
        // fire for an unreported value
        let snap = StationSnapshot::empty("S1");
        let raised = engine.check_weather_conditions(&snap, "Station One").await;
        assert!(raised.is_empty());
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_cold_advisory_fires_low() {
        let (engine, sink, _store) = engine();
        let mut snap = StationSnapshot::empty("S1");
        snap.temperature = 12.0;

        let raised = engine.check_weather_conditions(&snap, "Station One").await;
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].kind, AlertKind::Temperature);
        assert_eq!(raised[0].severity, Severity::Low);
        assert_eq!(sink.shown()[0].title, "Cold Weather Advisory");
    }

    #[tokio::test]
    async fn test_stations_have_independent_slots() {
        let (engine, sink, _store) = engine();
        engine
            .check_weather_conditions(&snapshot_with_heat("S1", 36.0), "One")
            .await;
        engine
            .check_weather_conditions(&snapshot_with_heat("S2", 36.0), "Two")
            .await;
        assert_eq!(sink.count(), 2);
        assert_eq!(engine.get_active_alerts().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_alert_rearms_notifications() {
        let (engine, sink, _store) = engine();
        engine
            .check_weather_conditions(&snapshot_with_heat("S1", 36.0), "One")
            .await;
        engine.clear_alert(AlertKind::Heat, "S1").await;
        assert!(engine.get_active_alerts().is_empty());

        engine
            .check_weather_conditions(&snapshot_with_heat("S1", 36.0), "One")
            .await;
        assert_eq!(sink.count(), 2);
    }

    #[tokio::test]
    async fn test_multiple_kinds_from_one_snapshot() {
        let (engine, _sink, _store) = engine();
        let mut snap = StationSnapshot::empty("S1");
        snap.heat_index = 43.0;
        snap.rainfall = 120.0;
        snap.wind_speed = 11.0;

        let raised = engine.check_weather_conditions(&snap, "One").await;
        assert_eq!(raised.len(), 3);
        let mut kinds: Vec<&str> = raised.iter().map(|a| a.kind.code()).collect();
        kinds.sort();
        assert_eq!(kinds, vec!["heat", "rain", "wind"]);
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let (engine, _sink, _store) = engine();
        for i in 0..60 {
            let station = format!("S{}", i);
            engine
                .check_weather_conditions(&snapshot_with_heat(&station, 36.0), "X")
                .await;
        }
        assert_eq!(engine.get_alert_history().len(), HISTORY_LIMIT);
        // Newest first
        assert_eq!(engine.get_alert_history()[0].station_id, "S59");
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let (engine, _sink, store) = engine();
        engine
            .check_weather_conditions(&snapshot_with_heat("S1", 39.0), "One")
            .await;

        let restarted = AlertEngine::new(
            store,
            Arc::new(RecordingSink::new()) as Arc<dyn NotificationSink>,
            AlertThresholds::default(),
        );
        restarted.initialize().await;

        let active = restarted.get_active_alerts();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, Severity::High);
        assert_eq!(restarted.get_alert_history().len(), 1);
    }

    #[tokio::test]
    async fn test_persisted_history_is_truncated() {
        let (engine, _sink, store) = engine();
        for i in 0..20 {
            let station = format!("S{}", i);
            engine
                .check_weather_conditions(&snapshot_with_heat(&station, 36.0), "X")
                .await;
        }

        let restarted = AlertEngine::new(
            store,
            Arc::new(RecordingSink::new()) as Arc<dyn NotificationSink>,
            AlertThresholds::default(),
        );
        restarted.initialize().await;
        assert_eq!(restarted.get_alert_history().len(), PERSISTED_HISTORY);
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_alert_active() {
        let (engine, sink, _store) = engine();
        sink.set_failing(true);

        let raised = engine
            .check_weather_conditions(&snapshot_with_heat("S1", 36.0), "One")
            .await;
        assert_eq!(raised.len(), 1);
        assert_eq!(engine.get_active_alerts().len(), 1);
        assert_eq!(sink.count(), 0);
    }
}
