//! Demo host for the Drillwatch controller.
//!
//! Builds a small simulated mining site, places its devices with preset
//! settings, and runs the host tick loop: extraction, then the controller.
//! Every reconciliation pass logs what each emitter is publishing.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `drillwatch-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the demo site and register its devices
//! 4. Run `engine.max_ticks` ticks at `engine.tick_interval_ms`
//! 5. Save controller state and log the result

mod error;
mod extraction;
mod site;

use std::path::Path;
use std::time::Duration;

use drillwatch_core::config::LoggingConfig;
use drillwatch_core::{Controller, ControllerConfig, ControllerEvent, EventOutcome, ReconcileSummary};
use drillwatch_world::SimWorld;
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::extraction::Extractor;

/// Configuration file read from the working directory.
const CONFIG_PATH: &str = "drillwatch-config.yaml";

/// Application entry point for the demo engine.
///
/// # Errors
///
/// Returns an error if configuration, site construction, or the controller
/// fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        reconcile_interval_ticks = config.controller.reconcile_interval_ticks,
        tick_interval_ms = config.engine.tick_interval_ms,
        max_ticks = config.engine.max_ticks,
        seed = config.engine.seed,
        "drillwatch-engine starting"
    );

    // 3. Build the site and register devices.
    let mut site = site::build()?;
    let mut controller = Controller::new(&config);
    site::place_devices(&mut controller, &mut site)?;

    // 4. Run the tick loop.
    let mut extractor = Extractor::new(config.engine.seed);
    let mut ticker = tokio::time::interval(Duration::from_millis(config.engine.tick_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for tick in 1..=config.engine.max_ticks {
        ticker.tick().await;
        extractor.step(&mut site.world, &site.devices)?;
        let outcome = controller
            .dispatch(&mut site.world, ControllerEvent::Tick { tick })
            .map_err(EngineError::from)?;
        if let EventOutcome::Reconciled(summary) = outcome {
            report(&controller, &site.world, &summary);
        }
    }

    // 5. Save and log.
    let blob = controller.save().map_err(EngineError::from)?;
    info!(
        ticks = config.engine.max_ticks,
        units_mined = extractor.mined(),
        devices = controller.registry().len(),
        save_bytes = blob.len(),
        "drillwatch-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration, falling back to defaults when the file is absent.
fn load_config() -> Result<ControllerConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(ControllerConfig::from_file(config_path)?)
    } else {
        Ok(ControllerConfig::default())
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Log the pass summary and every emitter's current output.
fn report(controller: &Controller, world: &SimWorld, summary: &ReconcileSummary) {
    info!(
        tick = summary.tick,
        refreshed = summary.refreshed,
        synced_edges = summary.synced_edges,
        removed = summary.removed,
        failed = summary.failed,
        "Reconcile pass"
    );
    for record in controller.registry().iter() {
        let signals = record
            .emitter
            .and_then(|emitter| world.output_signals(emitter))
            .unwrap_or_default();
        let rendered: Vec<String> = signals
            .iter()
            .map(|s| format!("{}={}", s.signal.name, s.quantity))
            .collect();
        info!(
            tick = summary.tick,
            device = %record.device_id,
            signals = %rendered.join(" "),
            "Emitter output"
        );
    }
}
