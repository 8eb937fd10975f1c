//! Runner configuration.
//!
//! Aggregates the gameplay configs with the simulation loop settings.
//! Configuration can be loaded from and saved to a TOML file.

use ironvale_common::ConfigError;
use ironvale_gameplay::{AiConfig, CombatConfig, DialogueConfig, EncounterConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "ironvale.toml";

/// Outer loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === Timing ===
    /// Fixed simulation step in seconds
    pub fixed_dt: f32,
    /// Simulated seconds to run before exiting
    pub duration_secs: f64,
    /// Pace the loop against the wall clock
    pub realtime: bool,

    // === Randomness ===
    /// Seed for combat rolls and the demo layout (None = random)
    pub seed: Option<u64>,

    // === Persistence ===
    /// Snapshot interval in simulated seconds (0 = disabled)
    pub autosave_interval: f64,
    /// Where snapshots are written
    pub autosave_path: PathBuf,
    /// Extra weapon definitions merged over the built-in catalog
    pub weapon_catalog: Option<PathBuf>,

    // === Diagnostics ===
    /// Tracing filter directive
    pub log_filter: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            duration_secs: 120.0,
            realtime: false,
            seed: None,
            autosave_interval: 0.0,
            autosave_path: PathBuf::from("ironvale-snapshot.json"),
            weapon_catalog: None,
            log_filter: "ironvale=info".to_string(),
        }
    }
}

/// Everything the runner reads from `ironvale.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IronvaleConfig {
    /// Loop settings
    pub simulation: SimulationConfig,
    /// Combat tuning
    pub combat: CombatConfig,
    /// NPC behavior tuning
    pub ai: AiConfig,
    /// Encounter tuning
    pub encounter: EncounterConfig,
    /// Dialogue service
    pub dialogue: DialogueConfig,
}

impl IronvaleConfig {
    /// Load configuration from the working directory.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns the default config if the file is missing or invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::read(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("{e}, using defaults");
                Self::default()
            },
        }
    }

    /// Read and parse a config file, surfacing failures.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read(e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
            }
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Write(e.to_string()))?;
        fs::write(path, contents).map_err(|e| ConfigError::Write(e.to_string()))?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp values to sensible ranges.
    pub fn validate(&mut self) {
        let sim = &mut self.simulation;
        sim.fixed_dt = sim.fixed_dt.clamp(0.001, 0.25);
        sim.duration_secs = sim.duration_secs.max(0.0);
        sim.autosave_interval = sim.autosave_interval.max(0.0);

        let combat = &mut self.combat;
        combat.max_chance = combat.max_chance.clamp(0.0, 1.0);
        combat.critical_multiplier = combat.critical_multiplier.max(1.0);
        combat.unarmed_range = combat.unarmed_range.max(0.0);

        self.ai.decision_interval = self.ai.decision_interval.max(0.0);
        self.ai.wander_chance = self.ai.wander_chance.clamp(0.0, 1.0);
        self.ai.wander_radius = self.ai.wander_radius.max(0.0);

        self.encounter.trigger_radius = self.encounter.trigger_radius.max(0.0);
        self.encounter.cooldown = self.encounter.cooldown.max(0.0);

        self.dialogue.temperature = self.dialogue.temperature.clamp(0.0, 2.0);
        self.dialogue.timeout_secs = self.dialogue.timeout_secs.clamp(0.1, 120.0);
    }

    /// Rejects values that cannot be clamped into meaning.
    pub fn check(&self) -> Result<(), ConfigError> {
        if !self.simulation.fixed_dt.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "simulation.fixed_dt".to_string(),
                reason: "must be a finite number of seconds".to_string(),
            });
        }
        if self.encounter.arena_margin * 2.0 > self.encounter.arena_width.min(self.encounter.arena_height) {
            return Err(ConfigError::InvalidValue {
                key: "encounter.arena_margin".to_string(),
                reason: "arena too small for its margin".to_string(),
            });
        }
        Ok(())
    }
}
