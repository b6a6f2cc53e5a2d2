//! Main store implementation.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use stratus_types::{
    DailySummary, SensorKey, SensorReading, SensorValue, StationSnapshot, SyncStatus,
};

use crate::error::{Error, Result};
use crate::schema;

const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// SQLite-based store for station sensor data.
///
/// Opening the store is the only fatal persistence operation; per-row write
/// failures during bulk ingestion are isolated and logged by the caller-facing
/// batch methods.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }
}

// Reading operations
impl Store {
    /// Upsert a single raw reading on its natural key.
    pub fn save_sensor_reading(&self, reading: &SensorReading) -> Result<()> {
        let (value_num, value_text) = split_value(&reading.value);

        self.conn.execute(
            "INSERT INTO readings (station_id, sensor, timestamp, value_num, value_text)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(station_id, sensor, timestamp) DO UPDATE SET
                value_num = ?4,
                value_text = ?5",
            rusqlite::params![
                reading.station_id,
                reading.key.code(),
                reading.timestamp,
                value_num,
                value_text,
            ],
        )?;

        Ok(())
    }

    /// Upsert a batch of readings inside one transaction.
    ///
    /// A row that fails to write is logged and skipped so one bad sample does
    /// not abort the rest of the sync cycle. Returns the number of rows
    /// written.
    pub fn save_sensor_readings(&self, readings: &[SensorReading]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut saved = 0;

        for reading in readings {
            let (value_num, value_text) = split_value(&reading.value);
            let result = tx.execute(
                "INSERT INTO readings (station_id, sensor, timestamp, value_num, value_text)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(station_id, sensor, timestamp) DO UPDATE SET
                    value_num = ?4,
                    value_text = ?5",
                rusqlite::params![
                    reading.station_id,
                    reading.key.code(),
                    reading.timestamp,
                    value_num,
                    value_text,
                ],
            );
            match result {
                Ok(_) => saved += 1,
                Err(e) => warn!(
                    "Failed to save {} reading for {}: {}",
                    reading.key.code(),
                    reading.station_id,
                    e
                ),
            }
        }

        tx.commit()?;
        debug!("Saved {} of {} readings", saved, readings.len());
        Ok(saved)
    }

    /// Query readings for one station and sensor over a timestamp range,
    /// ordered ascending by timestamp.
    pub fn get_readings(
        &self,
        station_id: &str,
        key: SensorKey,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<SensorReading>> {
        let mut stmt = self.conn.prepare(
            "SELECT station_id, sensor, timestamp, value_num, value_text
             FROM readings
             WHERE station_id = ?1 AND sensor = ?2 AND timestamp >= ?3 AND timestamp <= ?4
             ORDER BY timestamp ASC",
        )?;

        let rows = stmt
            .query_map(
                rusqlite::params![station_id, key.code(), from_ts, to_ts],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut readings = Vec::with_capacity(rows.len());
        for (station_id, sensor, timestamp, value_num, value_text) in rows {
            readings.push(SensorReading {
                station_id,
                key: SensorKey::from_code(&sensor)?,
                timestamp,
                value: join_value(value_num, value_text),
            });
        }

        Ok(readings)
    }
}

// Snapshot operations
impl Store {
    /// Replace the station's snapshot row wholesale.
    pub fn save_station_data(&self, snapshot: &StationSnapshot) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO station_snapshot
             (station_id, temperature, humidity, rainfall, wind_speed, wind_direction,
              pressure, solar, illumination, soil_moisture, soil_temp, wind_angle,
              heat_index, timestamp, synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
                snapshot.station_id,
                snapshot.temperature,
                snapshot.humidity,
                snapshot.rainfall,
                snapshot.wind_speed,
                snapshot.wind_direction,
                snapshot.pressure,
                snapshot.solar,
                snapshot.illumination,
                snapshot.soil_moisture,
                snapshot.soil_temp,
                snapshot.wind_angle,
                snapshot.heat_index,
                snapshot.timestamp,
                snapshot.synced_at,
            ],
        )?;

        Ok(())
    }

    /// Get the latest snapshot for a station.
    pub fn get_station_data(&self, station_id: &str) -> Result<Option<StationSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT station_id, temperature, humidity, rainfall, wind_speed, wind_direction,
                    pressure, solar, illumination, soil_moisture, soil_temp, wind_angle,
                    heat_index, timestamp, synced_at
             FROM station_snapshot WHERE station_id = ?",
        )?;

        let snapshot = stmt
            .query_row([station_id], snapshot_from_row)
            .optional()?;

        Ok(snapshot)
    }

    /// List snapshots for all known stations.
    pub fn get_all_station_data(&self) -> Result<Vec<StationSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT station_id, temperature, humidity, rainfall, wind_speed, wind_direction,
                    pressure, solar, illumination, soil_moisture, soil_temp, wind_angle,
                    heat_index, timestamp, synced_at
             FROM station_snapshot ORDER BY station_id",
        )?;

        let snapshots = stmt
            .query_map([], snapshot_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(snapshots)
    }
}

// Daily summary operations
impl Store {
    /// Upsert a daily summary keyed by `(station_id, date)`.
    pub fn save_daily_summary(&self, summary: &DailySummary) -> Result<()> {
        let date = summary
            .date
            .format(DATE_FORMAT)
            .map_err(|e| stratus_types::ParseError::InvalidDate(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO daily_summary
             (station_id, date, avg_temperature, avg_humidity, total_rainfall,
              avg_wind_speed, wind_direction)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(station_id, date) DO UPDATE SET
                avg_temperature = ?3,
                avg_humidity = ?4,
                total_rainfall = ?5,
                avg_wind_speed = ?6,
                wind_direction = ?7",
            rusqlite::params![
                summary.station_id,
                date,
                summary.avg_temperature,
                summary.avg_humidity,
                summary.total_rainfall,
                summary.avg_wind_speed,
                summary.wind_direction,
            ],
        )?;

        Ok(())
    }

    /// Query daily summaries over an inclusive date range, ascending by date.
    pub fn get_daily_summaries(
        &self,
        station_id: &str,
        from: Date,
        to: Date,
    ) -> Result<Vec<DailySummary>> {
        let from = from
            .format(DATE_FORMAT)
            .map_err(|e| stratus_types::ParseError::InvalidDate(e.to_string()))?;
        let to = to
            .format(DATE_FORMAT)
            .map_err(|e| stratus_types::ParseError::InvalidDate(e.to_string()))?;

        let mut stmt = self.conn.prepare(
            "SELECT station_id, date, avg_temperature, avg_humidity, total_rainfall,
                    avg_wind_speed, wind_direction
             FROM daily_summary
             WHERE station_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;

        let rows = stmt
            .query_map(rusqlite::params![station_id, from, to], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut summaries = Vec::with_capacity(rows.len());
        for (station_id, date, avg_temperature, avg_humidity, total_rainfall, avg_wind_speed, wind_direction) in
            rows
        {
            let date = Date::parse(&date, DATE_FORMAT)
                .map_err(|e| stratus_types::ParseError::InvalidDate(e.to_string()))?;
            summaries.push(DailySummary {
                station_id,
                date,
                avg_temperature,
                avg_humidity,
                total_rainfall,
                avg_wind_speed,
                wind_direction,
            });
        }

        Ok(summaries)
    }
}

// Sync status operations
impl Store {
    /// Record the durable sync status for a station.
    pub fn update_sync_status(
        &self,
        station_id: &str,
        status: SyncStatus,
        last_error: Option<&str>,
    ) -> Result<()> {
        let now = OffsetDateTime::now_utc().unix_timestamp();

        self.conn.execute(
            "INSERT INTO sync_status (station_id, status, last_error, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(station_id) DO UPDATE SET
                status = ?2,
                last_error = ?3,
                updated_at = ?4",
            rusqlite::params![station_id, status.as_str(), last_error, now],
        )?;

        debug!("Sync status for {}: {}", station_id, status.as_str());
        Ok(())
    }

    /// Get the durable sync status for a station.
    pub fn get_sync_status(&self, station_id: &str) -> Result<Option<(SyncStatus, Option<String>)>> {
        let row = self
            .conn
            .query_row(
                "SELECT status, last_error FROM sync_status WHERE station_id = ?",
                [station_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;

        match row {
            Some((status, last_error)) => Ok(Some((SyncStatus::from_str(&status)?, last_error))),
            None => Ok(None),
        }
    }
}

// App state (key/value) operations
impl Store {
    /// Persist a serializable value under a key.
    pub fn set_app_state<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, json],
        )?;
        Ok(())
    }

    /// Load a persisted value.
    ///
    /// An unparsable stored entry is treated as absent and evicted rather
    /// than surfaced as an error.
    pub fn get_app_state<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        let Some(json) = json else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Evicting corrupt app_state entry {}: {}", key, e);
                self.conn
                    .execute("DELETE FROM app_state WHERE key = ?", [key])?;
                Ok(None)
            }
        }
    }
}

// Maintenance operations
impl Store {
    /// Delete readings and summaries older than the retention window.
    ///
    /// Station snapshots are never touched; the last-known snapshot must
    /// survive any cleanup so offline reads keep working.
    pub fn clear_old_data(&self, days_to_keep: u32) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        let cutoff = now - Duration::days(i64::from(days_to_keep));

        let readings = self.conn.execute(
            "DELETE FROM readings WHERE timestamp < ?",
            [cutoff.unix_timestamp()],
        )?;

        let cutoff_date = cutoff
            .date()
            .format(DATE_FORMAT)
            .map_err(|e| stratus_types::ParseError::InvalidDate(e.to_string()))?;
        let summaries = self.conn.execute(
            "DELETE FROM daily_summary WHERE date < ?",
            [cutoff_date],
        )?;

        info!(
            "Cleared {} readings and {} summaries older than {} days",
            readings, summaries, days_to_keep
        );
        Ok(())
    }

    /// Row counts and database size, for diagnostics.
    pub fn stats(&self) -> Result<StoreStats> {
        let readings: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;
        let snapshots: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM station_snapshot", [], |row| row.get(0))?;
        let summaries: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM daily_summary", [], |row| row.get(0))?;
        let db_size_bytes: i64 = self.conn.query_row(
            "SELECT (SELECT * FROM pragma_page_count()) * (SELECT * FROM pragma_page_size())",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            readings: readings as u64,
            snapshots: snapshots as u64,
            summaries: summaries as u64,
            db_size_bytes: db_size_bytes as u64,
        })
    }
}

/// Row counts and on-disk size.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    /// Raw reading rows.
    pub readings: u64,
    /// Station snapshot rows.
    pub snapshots: u64,
    /// Daily summary rows.
    pub summaries: u64,
    /// Database size in bytes.
    pub db_size_bytes: u64,
}

fn split_value(value: &SensorValue) -> (Option<f64>, Option<String>) {
    match value {
        SensorValue::Number(n) => (Some(*n), None),
        SensorValue::Text(s) => (None, Some(s.clone())),
    }
}

fn join_value(value_num: Option<f64>, value_text: Option<String>) -> SensorValue {
    match value_text {
        Some(text) => SensorValue::Text(text),
        None => SensorValue::Number(value_num.unwrap_or(0.0)),
    }
}

fn snapshot_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StationSnapshot> {
    Ok(StationSnapshot {
        station_id: row.get(0)?,
        temperature: row.get(1)?,
        humidity: row.get(2)?,
        rainfall: row.get(3)?,
        wind_speed: row.get(4)?,
        wind_direction: row.get(5)?,
        pressure: row.get(6)?,
        solar: row.get(7)?,
        illumination: row.get(8)?,
        soil_moisture: row.get(9)?,
        soil_temp: row.get(10)?,
        wind_angle: row.get(11)?,
        heat_index: row.get(12)?,
        timestamp: row.get(13)?,
        synced_at: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn reading(station: &str, key: SensorKey, ts: i64, value: f64) -> SensorReading {
        SensorReading {
            station_id: station.to_string(),
            key,
            timestamp: ts,
            value: SensorValue::Number(value),
        }
    }

    #[test]
    fn test_open_in_memory() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_all_station_data().unwrap().is_empty());
    }

    #[test]
    fn test_open_on_disk_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.db");
        let store = Store::open(&path).unwrap();
        store
            .save_sensor_reading(&reading("S1", SensorKey::Temperature, 100, 30.0))
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_reading_upsert_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let r = reading("S1", SensorKey::Temperature, 1_700_000_000, 30.5);

        store.save_sensor_reading(&r).unwrap();
        store.save_sensor_reading(&r).unwrap();

        let rows = store
            .get_readings("S1", SensorKey::Temperature, 0, i64::MAX)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], r);
    }

    #[test]
    fn test_reading_conflict_overwrites_value() {
        let store = Store::open_in_memory().unwrap();
        store
            .save_sensor_reading(&reading("S1", SensorKey::Temperature, 100, 30.0))
            .unwrap();
        store
            .save_sensor_reading(&reading("S1", SensorKey::Temperature, 100, 31.0))
            .unwrap();

        let rows = store
            .get_readings("S1", SensorKey::Temperature, 0, i64::MAX)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value.as_number(), 31.0);
    }

    #[test]
    fn test_categorical_reading_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let r = SensorReading {
            station_id: "S1".to_string(),
            key: SensorKey::WindDirection,
            timestamp: 100,
            value: SensorValue::from("SW"),
        };
        store.save_sensor_reading(&r).unwrap();

        let rows = store
            .get_readings("S1", SensorKey::WindDirection, 0, i64::MAX)
            .unwrap();
        assert_eq!(rows[0].value.as_text(), Some("SW"));
    }

    #[test]
    fn test_batch_save_counts_rows() {
        let store = Store::open_in_memory().unwrap();
        let batch = vec![
            reading("S1", SensorKey::Temperature, 100, 30.0),
            reading("S1", SensorKey::Temperature, 200, 31.0),
            reading("S1", SensorKey::Humidity, 100, 60.0),
        ];
        assert_eq!(store.save_sensor_readings(&batch).unwrap(), 3);

        let rows = store
            .get_readings("S1", SensorKey::Temperature, 0, i64::MAX)
            .unwrap();
        assert_eq!(rows.len(), 2);
        // Ascending order
        assert!(rows[0].timestamp < rows[1].timestamp);
    }

    #[test]
    fn test_snapshot_full_replace() {
        let store = Store::open_in_memory().unwrap();

        let mut snap = StationSnapshot::empty("S1");
        snap.temperature = 30.0;
        snap.timestamp = 100;
        snap.synced_at = 200;
        store.save_station_data(&snap).unwrap();

        snap.temperature = 32.0;
        snap.wind_direction = "SW".to_string();
        store.save_station_data(&snap).unwrap();

        let loaded = store.get_station_data("S1").unwrap().unwrap();
        assert_eq!(loaded.temperature, 32.0);
        assert_eq!(loaded.wind_direction, "SW");
        assert_eq!(store.get_all_station_data().unwrap().len(), 1);
    }

    #[test]
    fn test_get_station_data_missing() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_station_data("nope").unwrap().is_none());
    }

    #[test]
    fn test_daily_summary_upsert_and_range() {
        let store = Store::open_in_memory().unwrap();

        for (day, temp) in [(date!(2026 - 08 - 10), 30.0), (date!(2026 - 08 - 11), 32.0)] {
            store
                .save_daily_summary(&DailySummary {
                    station_id: "S1".to_string(),
                    date: day,
                    avg_temperature: temp,
                    avg_humidity: 60.0,
                    total_rainfall: 5.0,
                    avg_wind_speed: 3.0,
                    wind_direction: "N".to_string(),
                })
                .unwrap();
        }

        // Upsert replaces the existing row for the same day
        store
            .save_daily_summary(&DailySummary {
                station_id: "S1".to_string(),
                date: date!(2026 - 08 - 11),
                avg_temperature: 33.0,
                avg_humidity: 61.0,
                total_rainfall: 6.0,
                avg_wind_speed: 3.5,
                wind_direction: "SW".to_string(),
            })
            .unwrap();

        let summaries = store
            .get_daily_summaries("S1", date!(2026 - 08 - 01), date!(2026 - 08 - 31))
            .unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].date, date!(2026 - 08 - 10));
        assert_eq!(summaries[1].avg_temperature, 33.0);
        assert_eq!(summaries[1].wind_direction, "SW");

        // Out-of-range query returns nothing
        let none = store
            .get_daily_summaries("S1", date!(2026 - 09 - 01), date!(2026 - 09 - 30))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_sync_status_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_sync_status("S1").unwrap().is_none());

        store
            .update_sync_status("S1", SyncStatus::Error, Some("timeout"))
            .unwrap();
        let (status, err) = store.get_sync_status("S1").unwrap().unwrap();
        assert_eq!(status, SyncStatus::Error);
        assert_eq!(err.as_deref(), Some("timeout"));

        store
            .update_sync_status("S1", SyncStatus::Synced, None)
            .unwrap();
        let (status, err) = store.get_sync_status("S1").unwrap().unwrap();
        assert_eq!(status, SyncStatus::Synced);
        assert!(err.is_none());
    }

    #[test]
    fn test_app_state_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        store.set_app_state("numbers", &vec![1, 2, 3]).unwrap();
        let loaded: Option<Vec<i32>> = store.get_app_state("numbers").unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_corrupt_app_state_is_a_miss() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO app_state (key, value) VALUES ('bad', 'not json {')",
                [],
            )
            .unwrap();

        let loaded: Option<Vec<i32>> = store.get_app_state("bad").unwrap();
        assert!(loaded.is_none());

        // Corrupt entry was evicted
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM app_state WHERE key='bad'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_clear_old_data_preserves_snapshot() {
        let store = Store::open_in_memory().unwrap();
        let now = OffsetDateTime::now_utc().unix_timestamp();

        // One fresh and one ancient reading
        store
            .save_sensor_reading(&reading("S1", SensorKey::Temperature, now, 30.0))
            .unwrap();
        store
            .save_sensor_reading(&reading("S1", SensorKey::Temperature, now - 90 * 86_400, 25.0))
            .unwrap();

        let mut snap = StationSnapshot::empty("S1");
        snap.timestamp = now - 90 * 86_400;
        snap.synced_at = now;
        store.save_station_data(&snap).unwrap();

        store.clear_old_data(30).unwrap();

        let rows = store
            .get_readings("S1", SensorKey::Temperature, 0, i64::MAX)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp, now);

        // Snapshot survives even though it predates the cutoff
        assert!(store.get_station_data("S1").unwrap().is_some());
    }

    #[test]
    fn test_stats_counts() {
        let store = Store::open_in_memory().unwrap();
        store
            .save_sensor_reading(&reading("S1", SensorKey::Temperature, 100, 30.0))
            .unwrap();
        store
            .save_station_data(&StationSnapshot::empty("S1"))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.readings, 1);
        assert_eq!(stats.snapshots, 1);
        assert_eq!(stats.summaries, 0);
        assert!(stats.db_size_bytes > 0);
    }
}
