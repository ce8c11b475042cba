//! typhoon-monitor CLI

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use typhoon_monitor::monitor::taipei_now;
use typhoon_monitor::{
    CwaClient, MonitorConfig, MonitorReport, Snapshot, SnapshotCache, TyphoonMonitor, logging,
};

#[derive(Parser)]
#[command(name = "typhoon-monitor")]
#[command(about = "Typhoon track and weather advisory monitor for scheduled trips")]
#[command(version)]
struct Cli {
    /// Path to config file (default: user config dir, then ./config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Evaluate a saved JSON snapshot instead of calling the CWA API
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn print_report(report: &MonitorReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(text) => println!("{text}"),
            Err(e) => warn!(error = %e, "failed to serialize report"),
        }
    } else {
        println!("{report}");
    }
}

fn open_cache(config: &MonitorConfig) -> Option<SnapshotCache> {
    if !config.cache.enabled {
        return None;
    }
    let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
    match SnapshotCache::open(config.cache_dir(), ttl) {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!(error = %e, "{}", e.user_message());
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = MonitorConfig::load_from_path(cli.config)
        .with_context(|| "Failed to load configuration")?;
    logging::init(&config.logging);

    info!(version = typhoon_monitor::VERSION, "typhoon-monitor starting");

    let client = CwaClient::new(&config.cwa)?;
    let monitor = TyphoonMonitor::new(&config, Box::new(client), open_cache(&config))
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if let Some(path) = cli.snapshot {
        let snapshot = Snapshot::from_file(&path)
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
        print_report(&monitor.evaluate(&snapshot, taipei_now()), cli.json);
        return Ok(());
    }

    if config.cwa.api_key.is_none() {
        warn!("no CWA API key configured; every fetch will fall back to cached data");
    }

    if cli.once {
        print_report(&monitor.check_all_conditions().await, cli.json);
        return Ok(());
    }

    monitor.run(None, |report| print_report(report, cli.json)).await;
    Ok(())
}
