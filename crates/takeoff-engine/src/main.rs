//! Engine binary for the Takeoff simulation.
//!
//! Wires configuration, logging, the initial world, and the phase
//! pipeline together, runs until a confident terminal outcome or the
//! tick limit, and prints a JSON summary to stdout.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `takeoff-config.yaml` (or `TAKEOFF_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Seed the random stream from `world.seed`
//! 4. Create the initial world and the phase pipeline
//! 5. Run the simulation loop
//! 6. Log the result and print the summary

mod error;
mod log_callback;
mod summary;

use std::path::PathBuf;

use takeoff_agents::SimRng;
use takeoff_core::config::LoggingConfig;
use takeoff_core::{SimulationConfig, build_pipeline, initial_world, runner};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_callback::LoggingCallback;
use crate::summary::RunSummary;

/// Environment variable overriding the config file path.
const CONFIG_ENV: &str = "TAKEOFF_CONFIG";

/// Config file used when `TAKEOFF_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "takeoff-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, pipeline assembly, the run, or the
/// summary fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so note the source after.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(source = %config_source, "takeoff-engine starting");
    info!(
        world_name = %config.world.name,
        seed = config.world.seed,
        max_ticks = config.simulation.max_ticks,
        max_population = config.population.max_population,
        "Configuration loaded"
    );

    // 3. Seed the random stream.
    let mut rng = SimRng::new(config.world.seed);

    // 4. Initial world and pipeline.
    let (mut world, initial_events) = initial_world(&config, &mut rng);
    let orchestrator = build_pipeline(&config).map_err(EngineError::from)?;
    info!(
        phases = orchestrator.len(),
        initial_events = initial_events.len(),
        "Pipeline assembled, entering tick loop"
    );

    // 5. Run.
    let mut callback = LoggingCallback::default();
    let result = runner::run_simulation(
        &mut world,
        &orchestrator,
        &mut rng,
        &config.simulation,
        &mut callback,
    )
    .map_err(EngineError::from)?;

    // 6. Report.
    runner::log_simulation_end(&result);
    let summary = RunSummary::new(
        &config.world.name,
        config.world.seed,
        &result,
        &world,
        callback.events_logged(),
    );
    println!("{}", summary.to_json().map_err(EngineError::from)?);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "takeoff-engine shutdown complete"
    );
    Ok(())
}

/// Load the simulation configuration.
///
/// Reads the path in `TAKEOFF_CONFIG` if set, otherwise
/// `takeoff-config.yaml` relative to the working directory. A missing
/// default file falls back to built-in defaults; a missing explicit file
/// is an error.
fn load_config() -> Result<(SimulationConfig, String), EngineError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) {
        let config = SimulationConfig::from_file(&path)?;
        return Ok((config, path.display().to_string()));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        Ok((SimulationConfig::default(), String::from("defaults")))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
