//! # Node Runtime
//!
//! The two background tasks that run for the life of the node:
//!
//! 1. **Generation**: every `window_seconds × 0.9`, synthesize a window at
//!    the last published frequency and publish the resulting snapshot
//! 2. **Register refresh**: every `refresh_interval_ms`, encode whatever
//!    snapshot is current and hand the bank to the register sink
//!
//! The tasks share nothing but the telemetry store. Refresh always re-encodes
//! the latest snapshot; no history is kept.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::registers::encoder::encode;
use crate::registers::sink::RegisterSink;
use crate::telemetry::generator::SignalGenerator;
use crate::telemetry::store::{TelemetryPublisher, TelemetryStore};

/// Fraction of the window length between generation cycles
const GENERATION_CADENCE_FACTOR: f64 = 0.9;

/// Handles to the running background tasks
#[derive(Debug)]
pub struct NodeRuntime {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeRuntime {
    /// Spawn both tasks on the current tokio runtime
    ///
    /// The publisher moves into the generation task, making it the only writer.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `config` fails validation; nothing is spawned then.
    pub fn start<K>(
        config: &Config,
        publisher: TelemetryPublisher,
        store: TelemetryStore,
        sink: Arc<K>,
    ) -> Result<Self>
    where
        K: RegisterSink + ?Sized + 'static,
    {
        config.validate()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let generation_period = Duration::from_secs_f64(
            config.signal.window_seconds * GENERATION_CADENCE_FACTOR,
        );
        let refresh_period = Duration::from_millis(config.registers.refresh_interval_ms);

        let generator = SignalGenerator::new(config.signal.clone());
        let tasks = vec![
            tokio::spawn(run_generation(generator, publisher, generation_period, shutdown_rx.clone())),
            tokio::spawn(run_register_refresh(store, sink, refresh_period, shutdown_rx)),
        ];

        info!(
            "Node runtime started (generation every {:?}, register refresh every {:?})",
            generation_period, refresh_period
        );

        Ok(Self { shutdown_tx, tasks })
    }

    /// Stop both tasks and wait for them to finish
    pub async fn shutdown(self) {
        self.shutdown_tx.send_replace(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("Background task ended abnormally: {}", e);
            }
        }
        info!("Node runtime stopped");
    }
}

async fn run_generation(
    generator: SignalGenerator,
    publisher: TelemetryPublisher,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let previous_frequency = publisher.current().frequency;
                let snapshot = generator.generate(previous_frequency);
                publisher.publish(snapshot);
                cycles += 1;

                debug!(
                    "Cycle {}: {:.3} V, {:.4} A, {:.3} W, pf {:.3}",
                    cycles, snapshot.voltage, snapshot.current, snapshot.active_power, snapshot.power_factor
                );
            }

            _ = shutdown.changed() => {
                debug!("Generation task stopping after {} cycles", cycles);
                break;
            }
        }
    }
}

async fn run_register_refresh<K>(
    store: TelemetryStore,
    sink: Arc<K>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    K: RegisterSink + ?Sized,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let map = encode(&store.read());
                if let Err(e) = sink.publish(&map) {
                    warn!("Failed to publish holding registers: {}", e);
                }
            }

            _ = shutdown.changed() => {
                debug!("Register refresh task stopping");
                break;
            }
        }
    }
}
