//! # Ironvale
//!
//! Runs the demo scenario headless: NPCs live out their needs, the
//! autopilot walks the road, and encounters move everyone between the
//! overworld and the arena.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use ironvale_engine::autosave::SnapshotAutosave;
use ironvale_engine::config::{IronvaleConfig, CONFIG_FILE};
use ironvale_engine::demo::Demo;
use ironvale_engine::timing::FixedStep;
use ironvale_gameplay::{DialogueService, WeaponCatalog};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let mut config = IronvaleConfig::load_from(&config_path);

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.simulation.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("Ironvale starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    config.validate();
    config.check().context("invalid configuration")?;

    run(&config)?;

    info!("Ironvale shutdown complete");
    Ok(())
}

fn run(config: &IronvaleConfig) -> Result<()> {
    let mut catalog = WeaponCatalog::builtin();
    if let Some(path) = &config.simulation.weapon_catalog {
        let added = catalog
            .load_file(path)
            .with_context(|| format!("loading weapons from {}", path.display()))?;
        info!(added, "Weapon catalog extended");
    }

    let dialogue =
        DialogueService::from_config(config.dialogue.clone()).context("starting dialogue service")?;
    if !dialogue.is_enabled() {
        info!("Dialogue service disabled, NPCs use canned replies");
    }

    let mut demo = Demo::new(config, &catalog, dialogue);
    let mut autosave = SnapshotAutosave::new(
        config.simulation.autosave_interval,
        &config.simulation.autosave_path,
    );
    let mut timing = FixedStep::new(config.simulation.fixed_dt);
    let dt = timing.fixed_dt();

    while demo.world().sim_time() < config.simulation.duration_secs {
        let steps = if config.simulation.realtime {
            let frame = timing.frame_delta();
            timing.accumulate(frame)
        } else {
            1
        };

        for _ in 0..steps {
            demo.step(dt);
            if let Err(e) = autosave.maybe_save(demo.world()) {
                warn!("Autosave failed: {e}");
            }
        }

        if config.simulation.realtime {
            timing.sleep_remainder();
        }
    }

    if autosave.is_enabled() {
        autosave.save_now(demo.world())?;
    }

    let stats = demo.stats();
    let world = demo.world();
    info!(
        sim_time = world.sim_time(),
        ticks = world.tick_count(),
        npcs = world.npcs().len(),
        encounters = stats.encounters,
        fights = stats.fights,
        victories = stats.victories,
        defeats = stats.defeats,
        hits = stats.hits,
        replies = stats.replies,
        "Run finished"
    );
    for line in demo.transcript().lock().lines() {
        info!("{}: {}", line.speaker, line.text);
    }
    Ok(())
}
