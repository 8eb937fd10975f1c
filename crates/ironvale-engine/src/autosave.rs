//! Periodic JSON snapshots of the running world.

use std::fs;
use std::path::{Path, PathBuf};

use ironvale_common::IronvaleResult;
use ironvale_gameplay::{World, WorldSnapshot};
use tracing::{debug, info};

/// Writes a snapshot every `interval` simulated seconds.
#[derive(Debug, Clone)]
pub struct SnapshotAutosave {
    interval: f64,
    path: PathBuf,
    last_saved: f64,
    saves: u32,
}

impl SnapshotAutosave {
    /// Creates an autosaver. An interval of zero disables it.
    #[must_use]
    pub fn new(interval: f64, path: impl Into<PathBuf>) -> Self {
        Self {
            interval: interval.max(0.0),
            path: path.into(),
            last_saved: 0.0,
            saves: 0,
        }
    }

    /// True if snapshots are written at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.interval > 0.0
    }

    /// Destination file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshots written so far.
    #[must_use]
    pub fn saves(&self) -> u32 {
        self.saves
    }

    /// Saves if the interval has elapsed. Returns whether a file was written.
    pub fn maybe_save(&mut self, world: &World) -> IronvaleResult<bool> {
        if !self.is_enabled() || world.sim_time() - self.last_saved < self.interval {
            return Ok(false);
        }
        self.save_now(world)?;
        Ok(true)
    }

    /// Saves unconditionally.
    pub fn save_now(&mut self, world: &World) -> IronvaleResult<()> {
        write_snapshot(&world.snapshot(), &self.path)?;
        self.last_saved = world.sim_time();
        self.saves += 1;
        debug!(path = %self.path.display(), t = world.sim_time(), "Snapshot written");
        Ok(())
    }
}

/// Writes a snapshot through a temporary file so readers never see a
/// partial document.
pub fn write_snapshot(snapshot: &WorldSnapshot, path: &Path) -> IronvaleResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = snapshot.to_json()?;
    let temp = path.with_extension("json.tmp");
    fs::write(&temp, json)?;
    fs::rename(&temp, path)?;
    info!(path = %path.display(), npcs = snapshot.npcs.len(), "Saved snapshot");
    Ok(())
}

/// Reads a snapshot written by [`write_snapshot`].
pub fn read_snapshot(path: &Path) -> IronvaleResult<WorldSnapshot> {
    let json = fs::read_to_string(path)?;
    WorldSnapshot::from_json(&json)
}
