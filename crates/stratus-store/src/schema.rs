//! Database schema and migrations.

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        // Fresh database - create all tables
        create_schema_v1(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if version < SCHEMA_VERSION {
        // Run migrations
        migrate(conn, version)?;
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        -- Raw sensor readings, one row per (station, sensor, timestamp)
        CREATE TABLE IF NOT EXISTS readings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            station_id TEXT NOT NULL,
            sensor TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            value_num REAL,
            value_text TEXT,
            UNIQUE(station_id, sensor, timestamp)
        );
        CREATE INDEX IF NOT EXISTS idx_readings_station_sensor_time
            ON readings(station_id, sensor, timestamp);

        -- Latest aggregated snapshot, one row per station
        CREATE TABLE IF NOT EXISTS station_snapshot (
            station_id TEXT PRIMARY KEY,
            temperature REAL NOT NULL,
            humidity REAL NOT NULL,
            rainfall REAL NOT NULL,
            wind_speed REAL NOT NULL,
            wind_direction TEXT NOT NULL,
            pressure REAL NOT NULL,
            solar REAL NOT NULL,
            illumination REAL NOT NULL,
            soil_moisture REAL NOT NULL,
            soil_temp REAL NOT NULL,
            wind_angle REAL NOT NULL,
            heat_index REAL NOT NULL,
            timestamp INTEGER NOT NULL,
            synced_at INTEGER NOT NULL
        );

        -- Per-day aggregates derived from readings
        CREATE TABLE IF NOT EXISTS daily_summary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            station_id TEXT NOT NULL,
            date TEXT NOT NULL,
            avg_temperature REAL NOT NULL,
            avg_humidity REAL NOT NULL,
            total_rainfall REAL NOT NULL,
            avg_wind_speed REAL NOT NULL,
            wind_direction TEXT NOT NULL,
            UNIQUE(station_id, date)
        );
        CREATE INDEX IF NOT EXISTS idx_summary_station_date
            ON daily_summary(station_id, date);

        -- Durable sync status, one row per station
        CREATE TABLE IF NOT EXISTS sync_status (
            station_id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            last_error TEXT,
            updated_at INTEGER NOT NULL
        );

        -- Small key/value table for persisted application state
        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )?;

    Ok(())
}

/// Run migrations from old_version to current.
fn migrate(conn: &Connection, old_version: i32) -> Result<()> {
    // Add future migrations here
    // if old_version < 2 { migrate_to_v2(conn)?; }

    let _ = old_version;
    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"readings".to_string()));
        assert!(tables.contains(&"station_snapshot".to_string()));
        assert!(tables.contains(&"daily_summary".to_string()));
        assert!(tables.contains(&"sync_status".to_string()));
        assert!(tables.contains(&"app_state".to_string()));
        assert!(tables.contains(&"schema_version".to_string()));
    }

    #[test]
    fn test_schema_version_tracking() {
        let conn = Connection::open_in_memory().unwrap();

        // Fresh database should have version 0
        assert_eq!(get_schema_version(&conn).unwrap(), 0);

        // After initialization, should have current version
        initialize(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }
}
