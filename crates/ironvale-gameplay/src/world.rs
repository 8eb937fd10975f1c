//! The simulated world: active map, player, NPC roster and clock.
//!
//! [`World::tick`] is the single entry point for advancing the simulation.
//! Each NPC controller sees the player and every other NPC through a
//! registry view built for its update, so controllers never alias each
//! other.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use ironvale_common::{EntityId, MapBounds, SchemaVersion, Vec2};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn};

use crate::ai::{AiConfig, AiState, NpcController};
use crate::combat::{Armament, CombatEngine, CombatResult, CombatSkills};
use crate::combatant::{Combatant, CombatantRegistry};
use crate::dialogue::{ConversationContext, DialogueReply, DialogueService, Transcript};
use crate::encounter::{
    EncounterChoice, EncounterConfig, EncounterEvent, EncounterSystem, Scene,
};
use crate::npc::Npc;
use crate::player::Player;
use crate::snapshot::{NpcSnapshot, PlayerSnapshot, WorldSnapshot};

/// Replies buffered between dialogue completions and the next drain.
pub const DIALOGUE_INBOX_CAPACITY: usize = 256;

// ============================================================================
// Maps
// ============================================================================

/// Kind of map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    /// The open world, where encounters happen
    Overworld,
    /// A bounded fighting ground
    Arena,
}

/// A rectangular map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    /// Display name
    pub name: String,
    /// Extent
    pub bounds: MapBounds,
    /// Overworld or arena
    pub kind: MapKind,
}

impl GameMap {
    /// An overworld map.
    #[must_use]
    pub fn overworld(width: f32, height: f32) -> Self {
        Self {
            name: "overworld".to_string(),
            bounds: MapBounds::new(width, height),
            kind: MapKind::Overworld,
        }
    }

    /// An arena map.
    #[must_use]
    pub fn arena(width: f32, height: f32) -> Self {
        Self {
            name: "arena".to_string(),
            bounds: MapBounds::new(width, height),
            kind: MapKind::Arena,
        }
    }
}

impl Default for GameMap {
    fn default() -> Self {
        Self::overworld(4000.0, 3000.0)
    }
}

// ============================================================================
// Registry view
// ============================================================================

struct TickRegistry<'a> {
    player: &'a mut Combatant,
    before: &'a mut [NpcController],
    after: &'a mut [NpcController],
}

impl CombatantRegistry for TickRegistry<'_> {
    fn combatant(&self, id: EntityId) -> Option<&Combatant> {
        if self.player.id == id {
            return Some(&*self.player);
        }
        self.before
            .iter()
            .chain(self.after.iter())
            .map(|c| &c.npc().combatant)
            .find(|c| c.id == id)
    }

    fn combatant_mut(&mut self, id: EntityId) -> Option<&mut Combatant> {
        if self.player.id == id {
            return Some(&mut *self.player);
        }
        self.before
            .iter_mut()
            .chain(self.after.iter_mut())
            .map(|c| &mut c.npc_mut().combatant)
            .find(|c| c.id == id)
    }
}

// ============================================================================
// World
// ============================================================================

/// Owns everything the simulation advances.
#[derive(Debug)]
pub struct World {
    map: GameMap,
    player: Player,
    npcs: Vec<NpcController>,
    combat: CombatEngine,
    encounter: EncounterSystem,
    ai_config: AiConfig,
    sim_time: f64,
    tick_count: u64,
    dialogue_tx: Sender<DialogueReply>,
    dialogue_rx: Receiver<DialogueReply>,
}

impl World {
    /// Creates a world with default combat, AI and encounter settings.
    #[must_use]
    pub fn new(map: GameMap, player: Player) -> Self {
        let (dialogue_tx, dialogue_rx) = bounded(DIALOGUE_INBOX_CAPACITY);
        Self {
            map,
            player,
            npcs: Vec::new(),
            combat: CombatEngine::default(),
            encounter: EncounterSystem::default(),
            ai_config: AiConfig::default(),
            sim_time: 0.0,
            tick_count: 0,
            dialogue_tx,
            dialogue_rx,
        }
    }

    /// Uses the given combat engine.
    #[must_use]
    pub fn with_combat_engine(mut self, engine: CombatEngine) -> Self {
        self.combat = engine;
        self
    }

    /// Uses the given encounter settings.
    #[must_use]
    pub fn with_encounter_config(mut self, config: EncounterConfig) -> Self {
        self.encounter = EncounterSystem::new(config);
        self
    }

    /// AI settings for NPCs spawned from now on.
    #[must_use]
    pub fn with_ai_config(mut self, config: AiConfig) -> Self {
        self.ai_config = config;
        self
    }

    /// Active map.
    #[must_use]
    pub fn map(&self) -> &GameMap {
        &self.map
    }

    /// The player.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// The player, mutably.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// All NPC controllers.
    #[must_use]
    pub fn npcs(&self) -> &[NpcController] {
        &self.npcs
    }

    /// One NPC controller.
    #[must_use]
    pub fn npc(&self, id: EntityId) -> Option<&NpcController> {
        self.npcs.iter().find(|c| c.id() == id)
    }

    /// One NPC controller, mutably.
    pub fn npc_mut(&mut self, id: EntityId) -> Option<&mut NpcController> {
        self.npcs.iter_mut().find(|c| c.id() == id)
    }

    /// Adds an NPC under a new controller and returns its id.
    pub fn spawn_npc(&mut self, npc: Npc) -> EntityId {
        let id = npc.id();
        debug!(npc = %id, name = npc.name(), "Spawned NPC");
        self.npcs.push(NpcController::new(npc, self.ai_config.clone()));
        id
    }

    /// Removes an NPC.
    pub fn remove_npc(&mut self, id: EntityId) -> Option<Npc> {
        let index = self.npcs.iter().position(|c| c.id() == id)?;
        Some(self.npcs.remove(index).into_npc())
    }

    /// The combat engine.
    pub fn combat_engine_mut(&mut self) -> &mut CombatEngine {
        &mut self.combat
    }

    /// Encounter state.
    #[must_use]
    pub fn encounter(&self) -> &EncounterSystem {
        &self.encounter
    }

    /// Simulation time in seconds.
    #[must_use]
    pub const fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    fn scene(&mut self) -> (&mut EncounterSystem, Scene<'_>) {
        (
            &mut self.encounter,
            Scene {
                map: &mut self.map,
                player: &mut self.player,
                npcs: &mut self.npcs,
                sim_time: self.sim_time,
            },
        )
    }

    /// Advances the simulation by `delta_time` seconds: every NPC, then
    /// encounters.
    pub fn tick(&mut self, delta_time: f32) -> Vec<EncounterEvent> {
        let delta_time = delta_time.max(0.0);
        self.sim_time += f64::from(delta_time);
        self.tick_count += 1;

        let span = info_span!("tick", n = self.tick_count, t = self.sim_time);
        let _entered = span.enter();

        for index in 0..self.npcs.len() {
            let (before, rest) = self.npcs.split_at_mut(index);
            let Some((current, after)) = rest.split_first_mut() else {
                continue;
            };
            let mut registry = TickRegistry {
                player: &mut self.player.combatant,
                before,
                after,
            };
            current.update(delta_time, self.sim_time, &mut registry, Some(&mut self.combat));
        }

        let (encounter, mut scene) = self.scene();
        encounter.tick(&mut scene)
    }

    /// Answers a pending encounter choice.
    pub fn resolve_choice(&mut self, choice: EncounterChoice) -> Vec<EncounterEvent> {
        let (encounter, mut scene) = self.scene();
        encounter.resolve_choice(&mut scene, choice)
    }

    /// Leaves the arena immediately.
    pub fn disengage(&mut self) -> Option<EncounterEvent> {
        let (encounter, mut scene) = self.scene();
        encounter.disengage(&mut scene)
    }

    /// Moves the player by `delta`, clamped to the active map. Returns the
    /// new position.
    pub fn move_player(&mut self, delta: Vec2) -> Vec2 {
        let target = self.map.bounds.clamp(self.player.position() + delta);
        self.player.set_position(target);
        target
    }

    /// The player attacks an NPC with their equipped weapon (bare hands if
    /// it is missing or broken).
    ///
    /// Returns `None` when the player is dead, or the NPC is unknown,
    /// already dead or out of reach. An NPC that survives the attempt
    /// fights back.
    pub fn player_attack(&mut self, npc_id: EntityId) -> Option<CombatResult> {
        if !self.player.combatant.is_alive() {
            return None;
        }
        let controller = self.npcs.iter_mut().find(|c| c.id() == npc_id)?;
        if !controller.npc().is_alive() {
            return None;
        }

        let attacker = &mut self.player.combatant;
        let armed = attacker.has_usable_weapon();
        let weapon = if armed {
            attacker.equipped_weapon.as_ref()
        } else {
            None
        };
        if !self
            .combat
            .can_attack(attacker, &controller.npc().combatant, weapon)
        {
            debug!(npc = %npc_id, "Target out of reach");
            return None;
        }

        let armament = if armed {
            Armament::Equipped
        } else {
            Armament::Unarmed
        };
        let attacker_skills = attacker.skills.clone();
        let defender_skills = controller.npc().combatant.skills.clone();
        let result = self.combat.process_combat_round(
            attacker,
            &mut controller.npc_mut().combatant,
            self.sim_time,
            armament,
            CombatSkills::new(attacker_skills.as_ref(), defender_skills.as_ref()),
        );

        if result.attack_succeeded
            && controller.npc().is_alive()
            && controller.state() != AiState::Combat
        {
            controller.start_combat(self.player.id());
        }
        Some(result)
    }

    /// Starts a conversation line with an NPC. The reply lands in the
    /// transcript when ready and in the NPC's memory on the next
    /// [`World::drain_dialogue`]. Returns false if the NPC is unknown.
    pub fn talk_to(
        &self,
        npc_id: EntityId,
        message: &str,
        service: &DialogueService,
        transcript: Arc<Mutex<Transcript>>,
    ) -> bool {
        let Some(controller) = self.npc(npc_id) else {
            return false;
        };
        let context =
            ConversationContext::from_npc(controller.npc(), service.config().history_window)
                .with_game_context("map", self.map.name.as_str())
                .with_game_context("npc_state", controller.state().as_str());
        let inbox = self.dialogue_tx.clone();
        service.request_reply(context, message, transcript, move |reply| {
            if inbox.try_send(reply).is_err() {
                warn!("Dialogue inbox full, reply dropped");
            }
        });
        true
    }

    /// Writes finished conversations into NPC memory. Returns how many
    /// replies were applied.
    pub fn drain_dialogue(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(reply) = self.dialogue_rx.try_recv() {
            let Some(controller) = self.npcs.iter_mut().find(|c| c.id() == reply.npc) else {
                continue;
            };
            let npc = controller.npc_mut();
            npc.add_conversation("player", reply.player_message);
            let name = npc.name().to_string();
            npc.add_conversation(name, reply.reply);
            applied += 1;
        }
        applied
    }

    /// Plain-data copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        let player = &self.player.combatant;
        WorldSnapshot {
            version: SchemaVersion::WORLD_SNAPSHOT,
            sim_time: self.sim_time,
            map: self.map.name.clone(),
            map_kind: self.map.kind,
            player: PlayerSnapshot {
                id: player.id,
                name: player.name.clone(),
                position: player.position,
                health: player.current_health(),
                max_health: player.max_health(),
                money: self.player.money(),
                level: player.level,
            },
            npcs: self
                .npcs
                .iter()
                .map(|c| {
                    let npc = c.npc();
                    NpcSnapshot {
                        id: npc.id(),
                        name: npc.name().to_string(),
                        position: npc.combatant.position,
                        health: npc.combatant.current_health(),
                        max_health: npc.combatant.max_health(),
                        alive: npc.is_alive(),
                        state: c.state(),
                        status: npc.status.clone(),
                        faction: npc.faction,
                        mood: npc.mood(),
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{CombatConfig, ScriptedRolls};
    use crate::faction::Faction;

    fn world_at(player: Vec2) -> World {
        World::new(GameMap::default(), Player::new("Hero", player)).with_combat_engine(
            CombatEngine::new(CombatConfig::default(), ScriptedRolls::always_hit()),
        )
    }

    #[test]
    fn test_move_player_clamps() {
        let mut world = world_at(Vec2::new(10.0, 10.0));
        assert_eq!(world.move_player(Vec2::new(-50.0, 5.0)), Vec2::new(0.0, 15.0));
        assert_eq!(
            world.move_player(Vec2::new(10_000.0, 10_000.0)),
            Vec2::new(4000.0, 3000.0)
        );
    }

    #[test]
    fn test_npcs_fight_each_other_through_registry() {
        let mut world = world_at(Vec2::new(3000.0, 2000.0));
        let a = world.spawn_npc(Npc::new("A", Vec2::new(100.0, 100.0)).local());
        let b = world.spawn_npc(Npc::new("B", Vec2::new(120.0, 100.0)).local());
        world.npc_mut(a).expect("a").start_combat(b);

        world.tick(0.1);
        let b_health = world.npc(b).map(|c| c.npc().combatant.current_health());
        assert_eq!(b_health, Some(85));
    }

    #[test]
    fn test_player_attack_provokes() {
        let mut world = world_at(Vec2::new(100.0, 100.0));
        let npc = world.spawn_npc(Npc::new("Farmer", Vec2::new(130.0, 100.0)).local());

        let result = world.player_attack(npc).expect("in reach");
        assert_eq!(result.damage_dealt, 15);
        let ctl = world.npc(npc).expect("npc");
        assert_eq!(ctl.state(), AiState::Combat);
        assert_eq!(ctl.target_entity(), Some(world.player().id()));

        // Second swing inside the cooldown is rejected.
        let again = world.player_attack(npc).expect("in reach");
        assert!(!again.attack_succeeded);
    }

    #[test]
    fn test_dead_player_cannot_attack() {
        let mut world = world_at(Vec2::new(100.0, 100.0));
        let npc = world.spawn_npc(Npc::new("Farmer", Vec2::new(130.0, 100.0)).local());
        world.player_mut().combatant.take_damage(100_000);

        assert!(world.player_attack(npc).is_none());
        assert_eq!(world.player().combatant.last_attack_time(), None);
        let ctl = world.npc(npc).expect("npc");
        assert_eq!(ctl.npc().combatant.current_health(), 100);
        assert_eq!(ctl.state(), AiState::Idle);
    }

    #[test]
    fn test_player_attack_out_of_reach() {
        let mut world = world_at(Vec2::new(100.0, 100.0));
        let npc = world.spawn_npc(Npc::new("Farmer", Vec2::new(900.0, 100.0)).local());
        assert!(world.player_attack(npc).is_none());
    }

    #[test]
    fn test_snapshot_lists_roster() {
        let mut world = world_at(Vec2::new(100.0, 100.0));
        world.spawn_npc(Npc::new("Bandit", Vec2::new(2000.0, 2000.0)).with_faction(Faction::Bandit));
        world.tick(0.5);

        let snapshot = world.snapshot();
        assert_eq!(snapshot.map_kind, MapKind::Overworld);
        assert_eq!(snapshot.npcs.len(), 1);
        assert_eq!(snapshot.npcs[0].faction, Faction::Bandit);
        assert!((snapshot.sim_time - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_drain_dialogue_records_history() {
        let mut world = world_at(Vec2::new(100.0, 100.0));
        let npc = world.spawn_npc(Npc::new("Mira", Vec2::new(500.0, 500.0)));
        let service =
            DialogueService::from_config(crate::dialogue::DialogueConfig::default()).expect("service");

        let transcript = Arc::new(Mutex::new(Transcript::new()));
        assert!(world.talk_to(npc, "hello", &service, Arc::clone(&transcript)));
        assert_eq!(world.drain_dialogue(), 1);

        let history: Vec<_> = world
            .npc(npc)
            .expect("npc")
            .npc()
            .conversation()
            .map(|e| e.speaker.clone())
            .collect();
        assert_eq!(history, vec!["player".to_string(), "Mira".to_string()]);
        assert_eq!(transcript.lock().len(), 2);
    }
}
