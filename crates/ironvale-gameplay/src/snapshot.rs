//! Plain-data export of the world for saving and inspection.

use ironvale_common::{EntityId, IronvaleError, IronvaleResult, SchemaVersion, Vec2};
use serde::{Deserialize, Serialize};

use crate::ai::AiState;
use crate::faction::Faction;
use crate::needs::Mood;
use crate::world::MapKind;

/// Player portion of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Entity id
    pub id: EntityId,
    /// Name
    pub name: String,
    /// Position on the active map
    pub position: Vec2,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Coins held
    pub money: u64,
    /// Character level
    pub level: u32,
}

/// One NPC in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSnapshot {
    /// Entity id
    pub id: EntityId,
    /// Name
    pub name: String,
    /// Position on the active map
    pub position: Vec2,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Alive flag
    pub alive: bool,
    /// Behavior state
    pub state: AiState,
    /// Mirrored status string
    pub status: String,
    /// Allegiance
    pub faction: Faction,
    /// Mood
    pub mood: Mood,
}

/// Everything worth saving about a moment of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Schema version of this layout
    pub version: SchemaVersion,
    /// Simulation time in seconds
    pub sim_time: f64,
    /// Active map name
    pub map: String,
    /// Active map kind
    pub map_kind: MapKind,
    /// The player
    pub player: PlayerSnapshot,
    /// All NPCs
    pub npcs: Vec<NpcSnapshot>,
}

impl WorldSnapshot {
    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> IronvaleResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| IronvaleError::Serialization(e.to_string()))
    }

    /// Parses JSON, rejecting snapshots from an incompatible schema.
    pub fn from_json(json: &str) -> IronvaleResult<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| IronvaleError::Serialization(e.to_string()))?;
        SchemaVersion::WORLD_SNAPSHOT.ensure_can_read(snapshot.version)?;
        Ok(snapshot)
    }

    /// Number of NPCs still alive.
    #[must_use]
    pub fn living_npcs(&self) -> usize {
        self.npcs.iter().filter(|npc| npc.alive).count()
    }
}
