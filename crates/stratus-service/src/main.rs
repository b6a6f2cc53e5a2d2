//! Stratus Service - offline-first weather station sync daemon.
//!
//! Run with: `cargo run -p stratus-service`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use time::UtcOffset;
use tracing::{error, info, warn};

use stratus_core::{
    AlertEngine, AlertThresholds, ConnectivitySignal, ExpiringCache, MonitorConfig,
    NetworkMonitor, NotificationSink, SyncConfig, SyncManager, TemperatureThresholds,
    ThresholdLadder,
};
use stratus_service::config::AlertSettings;
use stratus_service::{
    HttpConnectivity, HttpRemoteSource, LogNotificationSink, ServiceConfig, StationConfig,
};
use stratus_store::Store;

/// Stratus Service - background weather station sync and alerting.
#[derive(Parser, Debug)]
#[command(name = "stratus-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database path (overrides config).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Station id to track (repeatable, overrides config).
    #[arg(short, long)]
    station: Vec<String>,

    /// Run one sync cycle for every station, then exit.
    #[arg(long)]
    once: bool,

    /// Increase log verbosity.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("stratus_service={}", default_level).parse()?)
                .add_directive(format!("stratus_core={}", default_level).parse()?)
                .add_directive(format!("stratus_store={}", default_level).parse()?),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::load_default()?,
    };
    if let Some(db) = args.db {
        config.storage.path = db;
    }
    if !args.station.is_empty() {
        config.stations = args
            .station
            .iter()
            .map(|id| StationConfig {
                id: id.clone(),
                name: None,
            })
            .collect();
    }
    if config.stations.is_empty() {
        anyhow::bail!("no stations configured; pass --station or add [[stations]] to the config");
    }

    info!("Opening database at {:?}", config.storage.path);
    let store = Store::open(&config.storage.path)?;

    let offset = UtcOffset::from_hms(config.sync.utc_offset_hours, 0, 0)?;
    let manager = SyncManager::new(
        store,
        Arc::new(HttpRemoteSource::new(&config.remote.base_url)),
        SyncConfig {
            utc_offset: offset,
            summary_window_days: config.sync.summary_window_days,
        },
    );

    let alerts = Arc::new(AlertEngine::new(
        manager.store(),
        Arc::new(LogNotificationSink) as Arc<dyn NotificationSink>,
        thresholds_from(&config.alerts),
    ));
    alerts.initialize().await;

    if args.once {
        run_once(&manager, &alerts, &config).await;
        return Ok(());
    }

    run_daemon(manager, alerts, config, offset).await
}

/// Single foreground cycle: sync, summarize, evaluate, prune, exit.
async fn run_once(manager: &Arc<SyncManager>, alerts: &Arc<AlertEngine>, config: &ServiceConfig) {
    for station in &config.stations {
        if manager.sync_all_station_data(&station.id).await {
            evaluate_station(manager, alerts, station).await;
        } else {
            error!("Sync failed for station {}", station.id);
        }
        if !manager.sync_7day_summary(&station.id).await {
            warn!("Summary sync failed for station {}", station.id);
        }
    }
    manager.clear_old_data(config.sync.retention_days).await;

    if let Some(stats) = manager.stats().await {
        info!(
            "Store now holds {} readings, {} snapshots, {} summaries ({} bytes)",
            stats.readings, stats.snapshots, stats.summaries, stats.db_size_bytes
        );
    }
}

async fn run_daemon(
    manager: Arc<SyncManager>,
    alerts: Arc<AlertEngine>,
    config: ServiceConfig,
    offset: UtcOffset,
) -> anyhow::Result<()> {
    // Assume offline until the first probe; regaining connectivity
    // triggers an immediate sync of every station
    let signal = Arc::new(HttpConnectivity::new(&config.remote.probe_url, false));
    let monitor = {
        let manager = Arc::clone(&manager);
        let alerts = Arc::clone(&alerts);
        let stations = config.stations.clone();
        let handle = tokio::runtime::Handle::current();
        NetworkMonitor::new(
            Arc::clone(&signal) as Arc<dyn ConnectivitySignal>,
            MonitorConfig {
                probe_interval: Duration::from_secs(config.remote.probe_interval_secs),
            },
            Box::new(move |status| {
                if !status.is_online() {
                    warn!("Connectivity lost; serving local data only");
                    return;
                }
                info!("Connectivity regained; syncing all stations");
                for station in &stations {
                    let manager = Arc::clone(&manager);
                    let alerts = Arc::clone(&alerts);
                    let station = station.clone();
                    handle.spawn(async move {
                        if manager.sync_all_station_data(&station.id).await {
                            evaluate_station(&manager, &alerts, &station).await;
                        }
                    });
                }
            }),
        )
    };

    for station in &config.stations {
        manager.setup_auto_sync(&station.id, config.sync.interval_minutes);
    }

    // Housekeeping loop: alert evaluation off the latest local snapshot,
    // summary refresh at most every 4 hours, retention pruning once per
    // calendar day
    let housekeeping = {
        let manager = Arc::clone(&manager);
        let alerts = Arc::clone(&alerts);
        let stations = config.stations.clone();
        let retention_days = config.sync.retention_days;
        // Guard against a zero period, which would panic the timer
        let interval = Duration::from_secs(config.sync.interval_minutes.max(1) * 60);
        tokio::spawn(async move {
            let cache: ExpiringCache<()> = ExpiringCache::with_offset(offset);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                for station in &stations {
                    evaluate_station(&manager, &alerts, station).await;

                    let summary_key = format!("summary:{}", station.id);
                    if cache.should_refresh(&summary_key, 4.0)
                        && manager.sync_7day_summary(&station.id).await
                    {
                        cache.put(&summary_key, (), Duration::from_secs(24 * 3600));
                    }
                }

                if !cache.is_fresh_today("retention") {
                    manager.clear_old_data(retention_days).await;
                    cache.put("retention", (), Duration::from_secs(24 * 3600));
                }
            }
        })
    };

    info!(
        "Daemon running with {} stations, syncing every {} minutes",
        config.stations.len(),
        config.sync.interval_minutes
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    housekeeping.abort();
    manager.stop_all();
    monitor.destroy();
    Ok(())
}

/// Re-evaluate alert ladders against a station's latest local snapshot.
async fn evaluate_station(
    manager: &Arc<SyncManager>,
    alerts: &Arc<AlertEngine>,
    station: &StationConfig,
) {
    if let Some(snapshot) = manager.get_local_station_data(&station.id).await {
        let raised = alerts
            .check_weather_conditions(&snapshot, station.display_name())
            .await;
        if !raised.is_empty() {
            info!("{} alert(s) raised for {}", raised.len(), station.id);
        }
    }
}

fn thresholds_from(settings: &AlertSettings) -> AlertThresholds {
    let ladder = |values: [f64; 3]| ThresholdLadder {
        medium: values[0],
        high: values[1],
        critical: values[2],
    };
    AlertThresholds {
        heat: ladder(settings.heat),
        rainfall: ladder(settings.rainfall),
        wind: ladder(settings.wind),
        temperature: TemperatureThresholds {
            low: settings.temperature[0],
            high: settings.temperature[1],
            critical: settings.temperature[2],
        },
    }
}
