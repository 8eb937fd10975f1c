//! # Ironvale Gameplay
//!
//! Gameplay systems for Ironvale.
//!
//! This crate provides the simulation layer:
//! - Character stats, weapons and skills
//! - Combat resolution (cooldowns, miss/block/critical rolls, durability)
//! - NPCs with needs, moods, personalities and relationships
//! - The NPC decision state machine
//! - Overworld encounters and the arena transition
//! - Dialogue through an optional text-completion service
//! - The world container and plain-data snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ai;
pub mod combat;
pub mod combatant;
pub mod dialogue;
pub mod encounter;
pub mod faction;
pub mod needs;
pub mod npc;
pub mod player;
pub mod skills;
pub mod snapshot;
pub mod stats;
pub mod weapon;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ai::*;
    pub use crate::combat::*;
    pub use crate::combatant::*;
    pub use crate::dialogue::*;
    pub use crate::encounter::*;
    pub use crate::faction::*;
    pub use crate::needs::*;
    pub use crate::npc::*;
    pub use crate::player::*;
    pub use crate::skills::*;
    pub use crate::snapshot::*;
    pub use crate::stats::*;
    pub use crate::weapon::*;
    pub use crate::world::*;
}

pub use prelude::*;
