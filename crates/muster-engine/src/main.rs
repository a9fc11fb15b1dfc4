//! Engine host for the Muster membership engine.
//!
//! Seeds a world from configuration and keeps it tidy by sweeping idle
//! parties on a fixed interval.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `muster-config.yaml` (or `MUSTER_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Seed actors and parties from the roster
//! 4. Run the sweep loop until `max_sweeps` or Ctrl-C
//! 5. Log the surviving parties

mod config;
mod error;
mod seed;
mod sweeper;

use std::path::PathBuf;

use muster_groups::{EngineDeps, World};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, LogFormat, LoggingConfig, MusterConfig,
};
use crate::error::EngineError;

/// Application entry point for the engine host.
///
/// # Errors
///
/// Returns an error if configuration or seeding fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember where it
    //    came from and report it after step 2.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("muster-engine starting");
    info!(
        source = %source,
        max_party_size = config.party.max_size,
        invitation_timeout_ms = config.party.invitation_timeout_ms,
        sweep_interval_ms = config.sweep.interval_ms,
        max_sweeps = config.sweep.max_sweeps,
        "Configuration loaded"
    );

    // 3. Seed the world.
    let mut world = World::new();
    let mut deps = EngineDeps::system();
    let founded = seed::seed_world(&config.roster, &mut world, &mut deps, config.party)?;
    info!(
        actors = world.actors.len(),
        parties = founded.len(),
        "World seeded"
    );

    // 4. Sweep until bounded or interrupted.
    let shutdown = sweeper::until_signal(tokio::signal::ctrl_c());
    let report = sweeper::run_sweeps(&mut world, &mut deps, config.party, config.sweep, shutdown).await;

    // 5. Report what is left.
    sweeper::log_sweep_end(&report, &world);
    match serde_json::to_string(&sweeper::party_summaries(&world)) {
        Ok(json) => info!(parties = %json, "Final party roster"),
        Err(e) => warn!(error = %e, "Failed to serialize final party roster"),
    }

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Load configuration from `MUSTER_CONFIG`, falling back to
/// `muster-config.yaml`. A missing file means defaults.
fn load_config() -> Result<(MusterConfig, String), EngineError> {
    let path = std::env::var(CONFIG_PATH_ENV)
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = MusterConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = MusterConfig::default();
        config.logging.apply_env_overrides();
        Ok((config, String::from("defaults")))
    }
}
