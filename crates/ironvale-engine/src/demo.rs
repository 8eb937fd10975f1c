//! Headless demo scenario.
//!
//! A small village on the overworld, a bandit on the road east, and a
//! player autopilot that walks the road, talks to whoever it meets and
//! fights whatever attacks it.

use std::sync::Arc;

use ironvale_common::{EntityId, Vec2};
use ironvale_gameplay::{
    CharacterStats, CombatEngine, CombatOutcome, DialogueService, EncounterChoice,
    EncounterEvent, Faction, GameMap, Npc, Personality, Player, Transcript, WeaponCatalog, World,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::IronvaleConfig;

/// Overworld size used by the demo.
pub const DEMO_MAP_SIZE: (f32, f32) = (4000.0, 3000.0);

/// Lane change after a conversation, so the autopilot walks around the NPC.
const LANE_SHIFT: f32 = 60.0;

/// Fraction of weapon reach the autopilot closes to before swinging.
const REACH_FACTOR: f32 = 0.8;

/// What happened during the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoStats {
    /// Choice menus opened
    pub encounters: u32,
    /// Arena fights started
    pub fights: u32,
    /// Fights the player won
    pub victories: u32,
    /// Fights the player lost
    pub defeats: u32,
    /// Player swings that landed
    pub hits: u32,
    /// Replies written into NPC memory
    pub replies: u32,
}

/// The demo world plus its autopilot.
#[derive(Debug)]
pub struct Demo {
    world: World,
    dialogue: DialogueService,
    transcript: Arc<Mutex<Transcript>>,
    heading: Vec2,
    unarmed_reach: f32,
    stats: DemoStats,
}

impl Demo {
    /// Builds the scenario.
    #[must_use]
    pub fn new(config: &IronvaleConfig, catalog: &WeaponCatalog, dialogue: DialogueService) -> Self {
        let engine = match config.simulation.seed {
            Some(seed) => CombatEngine::seeded(config.combat.clone(), seed),
            None => CombatEngine::seeded(config.combat.clone(), fastrand::u64(..)),
        };

        let stats = CharacterStats::new().with_strength(14).with_constitution(16);
        let mut player = Player::with_stats("Wanderer", Vec2::new(500.0, 560.0), stats);
        match catalog.get("iron_sword") {
            Some(sword) => player.combatant.equipped_weapon = Some(sword),
            None => warn!("No iron_sword in the catalog, the player fights unarmed"),
        }

        let (width, height) = DEMO_MAP_SIZE;
        let mut world = World::new(GameMap::overworld(width, height), player)
            .with_combat_engine(engine)
            .with_ai_config(config.ai.clone())
            .with_encounter_config(config.encounter.clone());

        for npc in village() {
            world.spawn_npc(npc);
        }

        Self {
            world,
            dialogue,
            transcript: Arc::new(Mutex::new(Transcript::new())),
            heading: Vec2::X,
            unarmed_reach: config.combat.unarmed_range,
            stats: DemoStats::default(),
        }
    }

    /// The simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> DemoStats {
        self.stats
    }

    /// Shared conversation log.
    #[must_use]
    pub fn transcript(&self) -> Arc<Mutex<Transcript>> {
        Arc::clone(&self.transcript)
    }

    /// Runs the autopilot and one simulation tick.
    pub fn step(&mut self, dt: f32) -> Vec<EncounterEvent> {
        if self.world.player().combatant.is_alive() {
            match self.world.encounter().combat_npc() {
                Some(opponent) => self.fight(opponent, dt),
                None => self.walk(dt),
            }
        }

        let events = self.world.tick(dt);
        for event in &events {
            self.handle(event);
        }
        self.stats.replies += self.world.drain_dialogue() as u32;
        events
    }

    fn walk(&mut self, dt: f32) {
        let speed = self.world.player().combatant.current_speed;
        let wanted = self.world.player().position() + self.heading * speed * dt;
        let reached = self.world.move_player(self.heading * speed * dt);
        if reached != wanted {
            self.heading = -self.heading;
            debug!(heading = ?self.heading, "Autopilot turned around");
        }
    }

    fn fight(&mut self, opponent: EntityId, dt: f32) {
        let Some(target) = self.world.npc(opponent).map(|c| c.npc().combatant.position) else {
            return;
        };
        let player = &self.world.player().combatant;
        let reach = player
            .equipped_weapon
            .as_ref()
            .filter(|_| player.has_usable_weapon())
            .map_or(self.unarmed_reach, |w| w.range);

        let offset = target - player.position;
        if offset.length() > reach * REACH_FACTOR {
            let step = offset.normalize_or_zero() * player.current_speed * dt;
            self.world.move_player(step);
        } else if let Some(result) = self.world.player_attack(opponent) {
            if result.landed() {
                self.stats.hits += 1;
            }
        }
    }

    fn handle(&mut self, event: &EncounterEvent) {
        match event {
            EncounterEvent::CombatStarted { npc } => {
                self.stats.fights += 1;
                info!(npc = %npc, "Autopilot fights");
            },
            EncounterEvent::ChoiceOffered { npc, .. } => {
                self.stats.encounters += 1;
                self.world.talk_to(*npc, "Hello there!", &self.dialogue, self.transcript());
                self.world.resolve_choice(EncounterChoice::Talk);
                self.world.move_player(Vec2::new(0.0, LANE_SHIFT));
            },
            EncounterEvent::CombatEnded { outcome, .. } => match outcome {
                CombatOutcome::NpcDefeated => self.stats.victories += 1,
                CombatOutcome::PlayerDefeated => {
                    self.stats.defeats += 1;
                    warn!("The wanderer has fallen");
                },
                CombatOutcome::Disengaged => {},
            },
        }
    }
}

fn village() -> Vec<Npc> {
    let mut guard_personality = Personality::default()
        .with_traits(["brave", "loyal"])
        .with_aggression(60)
        .with_profession("guard");
    guard_personality.loyalty = 90;

    vec![
        Npc::new("Farmer Tam", Vec2::new(600.0, 500.0)).with_personality(
            Personality::default()
                .with_traits(["kind", "helpful"])
                .with_kindness(80)
                .with_profession("farmer"),
        ),
        Npc::new("Guard Orla", Vec2::new(700.0, 500.0)).with_personality(guard_personality),
        Npc::new("Merchant Vey", Vec2::new(400.0, 500.0)).with_personality(
            Personality::default()
                .with_traits(["greedy", "clever"])
                .with_kindness(40)
                .with_profession("merchant"),
        ),
        Npc::new("Bandit", Vec2::new(900.0, 560.0))
            .with_faction(Faction::Bandit)
            .with_personality(Personality::default().with_aggression(85).with_profession("bandit")),
        Npc::new("Pilgrim", Vec2::new(1400.0, 560.0)).with_personality(
            Personality::default()
                .with_traits(["curious"])
                .with_profession("pilgrim"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo(seed: u64) -> Demo {
        let mut config = IronvaleConfig::default();
        config.simulation.seed = Some(seed);
        let dialogue = DialogueService::from_config(config.dialogue.clone()).expect("dialogue");
        Demo::new(&config, &WeaponCatalog::builtin(), dialogue)
    }

    #[test]
    fn test_scenario_layout() {
        let demo = demo(1);
        assert_eq!(demo.world().npcs().len(), 5);
        assert!(demo.world().player().combatant.has_usable_weapon());
        assert!(!demo.world().encounter().in_combat());
    }

    #[test]
    fn test_autopilot_meets_the_bandit() {
        let mut demo = demo(7);
        let dt = 1.0 / 60.0;
        let mut saw_arena = false;
        for _ in 0..(60 * 20) {
            demo.step(dt);
            saw_arena |= demo.world().encounter().in_combat();
        }
        assert!(saw_arena);
        assert_eq!(demo.stats().fights, 1);
    }

    #[test]
    fn test_choice_records_conversation() {
        let mut demo = demo(3);
        let pilgrim = demo
            .world()
            .npcs()
            .iter()
            .find(|c| c.npc().name() == "Pilgrim")
            .map(|c| c.id())
            .expect("pilgrim");

        demo.handle(&EncounterEvent::ChoiceOffered {
            npc: pilgrim,
            options: EncounterChoice::ALL.to_vec(),
        });
        assert_eq!(demo.world.drain_dialogue(), 1);
        assert_eq!(demo.stats().encounters, 1);
        assert_eq!(demo.transcript().lock().len(), 2);
    }
}
