//! # Energy Node
//!
//! Runs a single energy-metering node: telemetry generation, holding-register
//! refresh and the OTA firmware store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use energy_node::api::{Body, NodeApi};
use energy_node::config::Config;
use energy_node::logging;
use energy_node::ota;
use energy_node::registers::map::REG_VOLTAGE;
use energy_node::registers::sink::HoldingRegisters;
use energy_node::runtime::NodeRuntime;
use energy_node::telemetry::{store, unix_now, TelemetrySnapshot};

/// Seconds between telemetry status log lines
const STATUS_LOG_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Parser)]
#[command(version, about = "Industrial energy-metering node")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    config: PathBuf,
}

/// Main entry point
///
/// # Control Flow
///
/// 1. Load and validate configuration, install logging
/// 2. Open the OTA store; a bad key aborts startup here
/// 3. Start the generation and register-refresh tasks
/// 4. Log telemetry periodically until Ctrl+C, then stop both tasks
///
/// # Examples
///
/// ```bash
/// cargo run --release -- --config config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    let _log_guard = logging::init(&config.logging);
    info!("Energy node v{} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Configuration: {:?}", config);

    let ota = Arc::new(ota::open(&config.ota).context("failed to initialise OTA store")?);
    info!(
        "OTA store at {} ({:?})",
        config.ota.storage_dir.display(),
        ota.state()
    );

    let (publisher, reader) = store::channel(TelemetrySnapshot::initial(
        config.signal.nominal_frequency,
        unix_now(),
    ));
    let registers = Arc::new(HoldingRegisters::new());
    let api = NodeApi::new(reader.clone(), Arc::clone(&ota));

    let runtime = NodeRuntime::start(&config, publisher, reader, Arc::clone(&registers))
        .context("failed to start node runtime")?;

    let mut status_interval = interval(Duration::from_secs(STATUS_LOG_INTERVAL_SECS));
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = status_interval.tick() => {
                if let Body::Json(telemetry) = api.telemetry().body {
                    info!("Telemetry: {}", telemetry);
                }
                debug!(
                    "Holding registers 40001-40011: {:?}",
                    registers.read(REG_VOLTAGE, 11).unwrap_or_default()
                );
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    runtime.shutdown().await;
    Ok(())
}
