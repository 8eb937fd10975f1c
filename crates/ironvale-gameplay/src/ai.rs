//! NPC decision state machine.
//!
//! Each [`NpcController`] owns one [`Npc`] and drives it through a small set
//! of behavior states:
//! - Periodic decisions driven by needs, mood and personality
//! - Straight-line movement with snapping onto the target
//! - Resting to recover
//! - Cooldown-gated combat against a target resolved through a
//!   [`CombatantRegistry`], with pursuit when the target is out of reach

use std::f32::consts::TAU;

use ironvale_common::{direction_between, EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Span};

use crate::combat::{Armament, AttackOutcome, CombatEngine, CombatSkills};
use crate::combatant::CombatantRegistry;
use crate::dialogue::basic_response;
use crate::faction::Relationship;
use crate::needs::{Mood, NeedKind, NEED_MAX};
use crate::npc::Npc;

// ============================================================================
// States and configuration
// ============================================================================

/// Behavior state of an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiState {
    /// Doing nothing in particular
    #[default]
    Idle,
    /// Walking toward `target_position`
    Moving,
    /// Holding state for work routines
    Working,
    /// Hungry; looking for something to eat
    SeekingFood,
    /// Recovering rest
    Resting,
    /// Fighting `target_entity`
    Combat,
    /// Holding state while in conversation
    Talking,
    /// Holding state while escorting someone
    Following,
}

impl AiState {
    /// Stable lowercase name, mirrored into [`Npc::status`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving => "moving",
            Self::Working => "working",
            Self::SeekingFood => "seeking_food",
            Self::Resting => "resting",
            Self::Combat => "combat",
            Self::Talking => "talking",
            Self::Following => "following",
        }
    }
}

/// Tunables for NPC decisions and movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Seconds of simulation time between decisions
    pub decision_interval: f64,
    /// Movement finishes within this distance of the target
    pub arrival_snap_radius: f32,
    /// Rest recovered per second while resting
    pub rest_recovery_rate: f32,
    /// Seek food below this food level
    pub hunger_threshold: f32,
    /// Start resting below this rest level
    pub fatigue_threshold: f32,
    /// Stop resting at or above this rest level
    pub rested_threshold: f32,
    /// Stressed NPCs above this aggression sour on the player
    pub stressed_aggression_threshold: u8,
    /// Relationship lost per souring decision
    pub relationship_penalty: i32,
    /// Chance per idle decision to wander
    pub wander_chance: f32,
    /// Wander radius around home; zero disables wandering
    pub wander_radius: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            decision_interval: 2.0,
            arrival_snap_radius: 5.0,
            rest_recovery_rate: 20.0,
            hunger_threshold: 30.0,
            fatigue_threshold: 20.0,
            rested_threshold: 80.0,
            stressed_aggression_threshold: 70,
            relationship_penalty: 10,
            wander_chance: 0.3,
            wander_radius: 0.0,
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Drives one NPC through its behavior states.
#[derive(Debug)]
pub struct NpcController {
    npc: Npc,
    config: AiConfig,
    state: AiState,
    target_position: Option<Vec2>,
    target_entity: Option<EntityId>,
    pursuing: bool,
    decision_interval: f64,
    last_decision_time: f64,
    game_time: f64,
    span: Span,
    rng: fastrand::Rng,
}

impl NpcController {
    /// Creates a controller with a random source seeded from the NPC id.
    #[must_use]
    pub fn new(npc: Npc, config: AiConfig) -> Self {
        let seed = npc.id().raw();
        Self::with_seed(npc, config, seed)
    }

    /// Creates a controller with an explicit wander seed.
    #[must_use]
    pub fn with_seed(mut npc: Npc, config: AiConfig, seed: u64) -> Self {
        let span = info_span!("npc", name = %npc.name(), id = %npc.id());
        npc.status = AiState::Idle.as_str().to_string();
        Self {
            decision_interval: config.decision_interval,
            npc,
            config,
            state: AiState::Idle,
            target_position: None,
            target_entity: None,
            pursuing: false,
            last_decision_time: 0.0,
            game_time: 0.0,
            span,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// The controlled NPC.
    #[must_use]
    pub fn npc(&self) -> &Npc {
        &self.npc
    }

    /// The controlled NPC, mutably.
    pub fn npc_mut(&mut self) -> &mut Npc {
        &mut self.npc
    }

    /// Consumes the controller and returns the NPC.
    #[must_use]
    pub fn into_npc(self) -> Npc {
        self.npc
    }

    /// Id of the controlled NPC.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.npc.id()
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AiState {
        self.state
    }

    /// Where the NPC is walking, if anywhere.
    #[must_use]
    pub const fn target_position(&self) -> Option<Vec2> {
        self.target_position
    }

    /// Who the NPC is fighting, if anyone.
    #[must_use]
    pub const fn target_entity(&self) -> Option<EntityId> {
        self.target_entity
    }

    /// True while chasing a combat target that moved out of reach.
    #[must_use]
    pub const fn is_pursuing(&self) -> bool {
        self.pursuing
    }

    /// Simulation time seen on the last update.
    #[must_use]
    pub const fn game_time(&self) -> f64 {
        self.game_time
    }

    /// Simulation time of the last decision.
    #[must_use]
    pub const fn last_decision_time(&self) -> f64 {
        self.last_decision_time
    }

    /// Advances the NPC by one tick.
    ///
    /// Does nothing once the NPC is dead. `combat` may be absent; an NPC in
    /// combat without an engine falls back to idle.
    pub fn update(
        &mut self,
        delta_time: f32,
        sim_time: f64,
        registry: &mut dyn CombatantRegistry,
        combat: Option<&mut CombatEngine>,
    ) {
        if !self.npc.is_alive() {
            return;
        }
        let span = self.span.clone();
        let _entered = span.enter();

        self.game_time = sim_time;
        self.npc.update_needs(delta_time);

        if sim_time - self.last_decision_time >= self.decision_interval {
            self.make_decision();
            self.last_decision_time = sim_time;
        }

        self.execute_state(delta_time, registry, combat);
    }

    /// Picks a new state from needs, mood and personality.
    pub fn make_decision(&mut self) {
        let needs = self.npc.needs;
        if needs.food < self.config.hunger_threshold {
            self.abandon_fight();
            self.set_state(AiState::SeekingFood);
        } else if needs.rest < self.config.fatigue_threshold {
            self.abandon_fight();
            self.set_state(AiState::Resting);
        } else if self.state == AiState::Idle {
            self.maybe_wander();
        } else if self.npc.mood() == Mood::Stressed
            && self.npc.personality.aggression > self.config.stressed_aggression_threshold
            && self.npc.relationship() == Relationship::Neutral
        {
            self.npc.modify_relationship(-self.config.relationship_penalty);
            debug!(
                relationship = self.npc.relationship_value(),
                "Stress soured attitude toward the player"
            );
        }
    }

    fn abandon_fight(&mut self) {
        if self.state == AiState::Combat || self.pursuing {
            debug!(opponent = ?self.target_entity, "Needs pulled the NPC out of combat");
            self.clear_combat_target();
        }
    }

    fn maybe_wander(&mut self) {
        let radius = self.config.wander_radius;
        if radius <= 0.0 || self.rng.f32() >= self.config.wander_chance {
            return;
        }
        let offset = Vec2::from_angle(self.rng.f32() * TAU) * (self.rng.f32() * radius);
        let destination = self.npc.home + offset;
        self.move_to(destination);
    }

    /// Runs the behavior of the current state for one tick.
    pub fn execute_state(
        &mut self,
        delta_time: f32,
        registry: &mut dyn CombatantRegistry,
        combat: Option<&mut CombatEngine>,
    ) {
        match self.state {
            AiState::Moving => self.step_movement(delta_time, &*registry),
            AiState::SeekingFood => {
                if self.target_position.is_none() {
                    self.set_state(AiState::Idle);
                }
            },
            AiState::Resting => {
                let rest = (self.npc.needs.rest + self.config.rest_recovery_rate * delta_time)
                    .min(NEED_MAX);
                self.npc.needs.set(NeedKind::Rest, rest);
                if rest >= self.config.rested_threshold {
                    self.set_state(AiState::Idle);
                }
            },
            AiState::Combat => self.fight(registry, combat),
            AiState::Idle | AiState::Working | AiState::Talking | AiState::Following => {},
        }
    }

    fn step_movement(&mut self, delta_time: f32, registry: &dyn CombatantRegistry) {
        let Some(target) = self.target_position else {
            self.pursuing = false;
            self.set_state(AiState::Idle);
            return;
        };

        let position = self.npc.combatant.position;
        let distance = position.distance(target);
        let step = self.npc.combatant.current_speed * delta_time.max(0.0);

        match direction_between(position, target) {
            Some(direction) if distance > self.config.arrival_snap_radius && step < distance => {
                self.npc.combatant.position = position + direction * step;
            },
            _ => {
                self.npc.combatant.position = target;
                self.finish_movement(registry);
            },
        }
    }

    fn finish_movement(&mut self, registry: &dyn CombatantRegistry) {
        self.target_position = None;
        if !std::mem::take(&mut self.pursuing) {
            self.set_state(AiState::Idle);
            return;
        }

        let target_alive = self
            .target_entity
            .and_then(|id| registry.combatant(id))
            .is_some_and(|target| target.is_alive());
        if target_alive {
            self.set_state(AiState::Combat);
        } else {
            self.target_entity = None;
            self.set_state(AiState::Idle);
        }
    }

    fn fight(&mut self, registry: &mut dyn CombatantRegistry, combat: Option<&mut CombatEngine>) {
        let Some(engine) = combat else {
            warn!("In combat without a combat engine, going idle");
            self.set_state(AiState::Idle);
            return;
        };

        let Some(target_id) = self.target_entity else {
            debug!("Combat target lost");
            self.set_state(AiState::Idle);
            return;
        };

        let Some(target) = registry
            .combatant_mut(target_id)
            .filter(|target| target.is_alive())
        else {
            debug!(target = %target_id, "Combat target gone or dead");
            self.target_entity = None;
            self.set_state(AiState::Idle);
            return;
        };

        // Broken weapons are put away in favour of bare hands.
        let armed = self.npc.combatant.has_usable_weapon();
        let weapon = if armed {
            self.npc.combatant.equipped_weapon.as_ref()
        } else {
            None
        };
        if !engine.can_attack(&self.npc.combatant, target, weapon) {
            debug!(target = %target.name, "Target out of reach, pursuing");
            self.target_position = Some(target.position);
            self.pursuing = true;
            self.set_state(AiState::Moving);
            return;
        }

        let armament = if armed {
            Armament::Equipped
        } else {
            Armament::Unarmed
        };
        let attacker_skills = self.npc.combatant.skills.clone();
        let defender_skills = target.skills.clone();
        let result = engine.process_combat_round(
            &mut self.npc.combatant,
            target,
            self.game_time,
            armament,
            CombatSkills::new(attacker_skills.as_ref(), defender_skills.as_ref()),
        );

        match result.outcome() {
            AttackOutcome::OnCooldown => {},
            AttackOutcome::Missed | AttackOutcome::Blocked => debug!(%result, "Attack failed"),
            AttackOutcome::Hit | AttackOutcome::CriticalHit => {
                info!(%result, critical = result.is_critical, "Attack landed");
            },
        }

        if !target.is_alive() {
            info!(target = %target.name, "Defeated target");
            self.target_entity = None;
            self.set_state(AiState::Idle);
        }
    }

    /// Switches state, mirroring the name into the NPC's status. Also the
    /// way into the holding states (working, talking, following).
    pub fn set_state(&mut self, state: AiState) {
        if self.state != state {
            debug!(from = self.state.as_str(), to = state.as_str(), "State change");
            self.state = state;
            self.npc.status = state.as_str().to_string();
        }
    }

    /// Walks to a position, abandoning any pursuit.
    pub fn move_to(&mut self, target: Vec2) {
        self.target_position = Some(target);
        self.pursuing = false;
        self.set_state(AiState::Moving);
    }

    /// Starts fighting a combatant.
    pub fn start_combat(&mut self, target: EntityId) {
        self.target_entity = Some(target);
        self.pursuing = false;
        self.set_state(AiState::Combat);
    }

    /// Forgets the combat target and any pursuit.
    pub fn clear_combat_target(&mut self) {
        self.target_entity = None;
        self.pursuing = false;
    }

    /// Canned reply to something the player said, without any external
    /// text service.
    #[must_use]
    pub fn basic_reply(&self, message: &str) -> String {
        basic_response(&self.npc, message)
    }
}
