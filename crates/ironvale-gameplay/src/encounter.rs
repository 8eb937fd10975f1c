//! Overworld encounters and the transition into and out of arena combat.
//!
//! On the overworld, walking into a roaming NPC triggers an encounter.
//! Hostile factions drop straight into an arena fight; everyone else offers
//! the player a choice. Combat ends when either side falls (after a short
//! delay) or when the player disengages, and the overworld is restored.

use ironvale_common::{direction_between, EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::NpcController;
use crate::faction::{Faction, RELATIONSHIP_MIN};
use crate::player::Player;
use crate::world::{GameMap, MapKind};

/// Encounter tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Contact distance on the overworld
    pub trigger_radius: f32,
    /// How far the player bounces back on contact
    pub push_distance: f32,
    /// How far the player steps away after talking or trading
    pub choice_push_distance: f32,
    /// Seconds before another contact can trigger
    pub cooldown: f64,
    /// Arena width
    pub arena_width: f32,
    /// Arena height
    pub arena_height: f32,
    /// Distance of the starting spots from the arena edges
    pub arena_margin: f32,
    /// Seconds between a combatant falling and the return to the overworld
    pub end_delay: f64,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            trigger_radius: 20.0,
            push_distance: 30.0,
            choice_push_distance: 40.0,
            cooldown: 3.0,
            arena_width: 1500.0,
            arena_height: 1500.0,
            arena_margin: 100.0,
            end_delay: 2.0,
        }
    }
}

/// What the player can do when meeting a non-hostile NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterChoice {
    /// Chat
    Talk,
    /// Trade (bookkeeping happens elsewhere)
    Trade,
    /// Start a fight
    Attack,
}

impl EncounterChoice {
    /// Every choice, in menu order.
    pub const ALL: [Self; 3] = [Self::Talk, Self::Trade, Self::Attack];
}

/// How an arena fight ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    /// The NPC fell
    NpcDefeated,
    /// The player fell
    PlayerDefeated,
    /// The player left before anyone fell
    Disengaged,
}

/// Something the outer loop should react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterEvent {
    /// An arena fight began
    CombatStarted {
        /// Opponent
        npc: EntityId,
    },
    /// A non-hostile NPC is waiting for the player's choice
    ChoiceOffered {
        /// NPC met
        npc: EntityId,
        /// Available choices
        options: Vec<EncounterChoice>,
    },
    /// The arena fight is over and the overworld is back
    CombatEnded {
        /// Opponent
        npc: EntityId,
        /// Result
        outcome: CombatOutcome,
    },
}

/// The parts of the world an encounter reads and rewrites.
#[derive(Debug)]
pub struct Scene<'a> {
    /// Active map; swapped for the arena during combat
    pub map: &'a mut GameMap,
    /// The player
    pub player: &'a mut Player,
    /// All NPC controllers
    pub npcs: &'a mut Vec<NpcController>,
    /// Current simulation time
    pub sim_time: f64,
}

impl Scene<'_> {
    fn npc_index(&self, id: EntityId) -> Option<usize> {
        self.npcs.iter().position(|c| c.id() == id)
    }

    fn push_player_from(&mut self, from: Vec2, distance: f32) {
        let position = self.player.position();
        let direction = direction_between(from, position).unwrap_or(Vec2::X);
        let pushed = self.map.bounds.clamp(position + direction * distance);
        debug!(from = ?position, to = ?pushed, "Player pushed back");
        self.player.set_position(pushed);
    }
}

#[derive(Debug, Clone)]
struct ActiveCombat {
    npc: EntityId,
    previous_map: GameMap,
    player_return: Vec2,
    npc_return: Vec2,
    ended: Option<(f64, CombatOutcome)>,
}

/// Detects contacts and moves the player between overworld and arena.
#[derive(Debug, Clone, Default)]
pub struct EncounterSystem {
    config: EncounterConfig,
    last_trigger: Option<f64>,
    pending_choice: Option<EntityId>,
    active: Option<ActiveCombat>,
}

impl EncounterSystem {
    /// Creates an idle encounter system.
    #[must_use]
    pub fn new(config: EncounterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    /// True while an arena fight is running.
    #[must_use]
    pub fn in_combat(&self) -> bool {
        self.active.is_some()
    }

    /// Opponent in the current fight.
    #[must_use]
    pub fn combat_npc(&self) -> Option<EntityId> {
        self.active.as_ref().map(|a| a.npc)
    }

    /// Overworld position the player returns to after the fight.
    #[must_use]
    pub fn return_position(&self) -> Option<Vec2> {
        self.active.as_ref().map(|a| a.player_return)
    }

    /// NPC whose choice menu is open.
    #[must_use]
    pub const fn pending_choice(&self) -> Option<EntityId> {
        self.pending_choice
    }

    /// Seconds until contacts are detected again.
    #[must_use]
    pub fn cooldown_remaining(&self, sim_time: f64) -> f64 {
        self.last_trigger
            .map_or(0.0, |last| (self.config.cooldown - (sim_time - last)).max(0.0))
    }

    /// Runs one tick: contact detection on the overworld, end-of-combat
    /// handling in the arena.
    pub fn tick(&mut self, scene: &mut Scene<'_>) -> Vec<EncounterEvent> {
        if self.active.is_some() {
            self.check_combat_end(scene).into_iter().collect()
        } else {
            self.check_contacts(scene)
        }
    }

    /// Looks for the first living overworld NPC within reach of a living
    /// player.
    pub fn check_contacts(&mut self, scene: &mut Scene<'_>) -> Vec<EncounterEvent> {
        if scene.map.kind != MapKind::Overworld
            || !scene.player.combatant.is_alive()
            || self.active.is_some()
            || self.pending_choice.is_some()
            || self.cooldown_remaining(scene.sim_time) > 0.0
        {
            return Vec::new();
        }

        let player_position = scene.player.position();
        let radius_sq = self.config.trigger_radius * self.config.trigger_radius;
        let Some(index) = scene.npcs.iter().position(|c| {
            let npc = c.npc();
            npc.is_alive()
                && npc.is_world_entity
                && npc.combatant.position.distance_squared(player_position) <= radius_sq
        }) else {
            return Vec::new();
        };

        self.last_trigger = Some(scene.sim_time);
        let (npc_id, npc_position, faction) = {
            let npc = scene.npcs[index].npc();
            (npc.id(), npc.combatant.position, npc.faction)
        };
        scene.push_player_from(npc_position, self.config.push_distance);

        if faction.is_hostile() {
            info!(npc = %npc_id, faction = faction.as_str(), "Hostile contact");
            self.enter_combat(scene, npc_id).into_iter().collect()
        } else {
            info!(npc = %npc_id, faction = faction.as_str(), "Encounter, awaiting choice");
            self.pending_choice = Some(npc_id);
            vec![EncounterEvent::ChoiceOffered {
                npc: npc_id,
                options: EncounterChoice::ALL.to_vec(),
            }]
        }
    }

    /// Applies the player's answer to a pending encounter.
    pub fn resolve_choice(
        &mut self,
        scene: &mut Scene<'_>,
        choice: EncounterChoice,
    ) -> Vec<EncounterEvent> {
        let Some(npc_id) = self.pending_choice.take() else {
            warn!(?choice, "No encounter awaiting a choice");
            return Vec::new();
        };
        let Some(index) = scene.npc_index(npc_id) else {
            debug!(npc = %npc_id, "Encounter NPC vanished before the choice");
            return Vec::new();
        };

        match choice {
            EncounterChoice::Talk | EncounterChoice::Trade => {
                let npc_position = scene.npcs[index].npc().combatant.position;
                scene.push_player_from(npc_position, self.config.choice_push_distance);
                info!(npc = %npc_id, ?choice, "Encounter closed");
                Vec::new()
            },
            EncounterChoice::Attack => {
                let npc = scene.npcs[index].npc_mut();
                npc.faction = Faction::Enemy;
                npc.set_relationship_value(RELATIONSHIP_MIN);
                info!(npc = %npc_id, "Player attacks");
                self.enter_combat(scene, npc_id).into_iter().collect()
            },
        }
    }

    /// Moves the player and the NPC into a fresh arena and starts the fight.
    pub fn enter_combat(&mut self, scene: &mut Scene<'_>, npc_id: EntityId) -> Option<EncounterEvent> {
        if self.active.is_some() {
            warn!(npc = %npc_id, "Already in combat");
            return None;
        }
        let index = scene.npc_index(npc_id)?;

        let arena = GameMap::arena(self.config.arena_width, self.config.arena_height);
        let margin = self.config.arena_margin;
        let player_start = arena.bounds.clamp(Vec2::new(margin, arena.bounds.height - margin));
        let npc_start = arena.bounds.clamp(Vec2::new(arena.bounds.width - margin, margin));
        let previous_map = std::mem::replace(scene.map, arena);

        let player_id = scene.player.id();
        let player_return = scene.player.position();
        scene.player.set_position(player_start);

        let controller = &mut scene.npcs[index];
        let npc_return = controller.npc().combatant.position;
        controller.npc_mut().combatant.position = npc_start;
        controller.start_combat(player_id);

        self.pending_choice = None;
        self.active = Some(ActiveCombat {
            npc: npc_id,
            previous_map,
            player_return,
            npc_return,
            ended: None,
        });
        info!(npc = %npc_id, "Entered arena");
        Some(EncounterEvent::CombatStarted { npc: npc_id })
    }

    fn check_combat_end(&mut self, scene: &mut Scene<'_>) -> Option<EncounterEvent> {
        let active = self.active.as_mut()?;

        if active.ended.is_none() {
            let npc_alive = scene
                .npcs
                .iter()
                .find(|c| c.id() == active.npc)
                .is_some_and(|c| c.npc().is_alive());
            let outcome = if !npc_alive {
                Some(CombatOutcome::NpcDefeated)
            } else if !scene.player.combatant.is_alive() {
                Some(CombatOutcome::PlayerDefeated)
            } else {
                None
            };
            if let Some(outcome) = outcome {
                info!(npc = %active.npc, ?outcome, "Combat decided");
                active.ended = Some((scene.sim_time, outcome));
            }
        }

        let ended = active.ended;
        match ended {
            Some((at, outcome)) if scene.sim_time - at >= self.config.end_delay => {
                self.exit_combat(scene, outcome)
            },
            _ => None,
        }
    }

    /// Leaves the arena at once, whatever the state of the fight.
    pub fn disengage(&mut self, scene: &mut Scene<'_>) -> Option<EncounterEvent> {
        self.exit_combat(scene, CombatOutcome::Disengaged)
    }

    /// Restores the overworld and settles the opponent.
    fn exit_combat(&mut self, scene: &mut Scene<'_>, outcome: CombatOutcome) -> Option<EncounterEvent> {
        let active = self.active.take()?;
        *scene.map = active.previous_map;
        scene.player.set_position(active.player_return);
        self.last_trigger = Some(scene.sim_time);

        if let Some(index) = scene.npc_index(active.npc) {
            if scene.npcs[index].npc().is_alive() {
                let controller = &mut scene.npcs[index];
                controller.npc_mut().combatant.position = active.npc_return;
                controller.clear_combat_target();
                controller.move_to(active.npc_return);
            } else {
                let fallen = scene.npcs.remove(index);
                debug!(npc = %fallen.id(), name = fallen.npc().name(), "Removed fallen NPC");
            }
        }

        info!(npc = %active.npc, ?outcome, "Returned to the overworld");
        Some(EncounterEvent::CombatEnded {
            npc: active.npc,
            outcome,
        })
    }
}
