//! Combatants: the shared health/stat/weapon core of players and NPCs.

use ironvale_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

use crate::skills::SkillSet;
use crate::stats::CharacterStats;
use crate::weapon::Weapon;

/// Which side of the simulation a combatant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatantKind {
    /// The player character
    Player,
    /// A non-player character
    Npc,
}

/// Anything that can attack and be attacked.
///
/// Invariants: `current_health` stays in `[0, max_health]` and `alive` is
/// true exactly while `current_health > 0`. Death is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Unique id
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Player or NPC
    pub kind: CombatantKind,
    /// Position on the active map
    pub position: Vec2,
    /// Attributes
    pub stats: CharacterStats,
    /// Equipped weapon, if any
    pub equipped_weapon: Option<Weapon>,
    /// Movement speed in units per second
    pub current_speed: f32,
    /// Character level
    pub level: u32,
    /// Explicit seconds-between-attacks override
    pub attack_interval_override: Option<f64>,
    /// Proficiencies consulted for weapon damage and shield blocks
    pub skills: Option<SkillSet>,
    current_health: i32,
    max_health: i32,
    alive: bool,
    last_attack_time: Option<f64>,
}

impl Combatant {
    /// Creates a combatant with health and speed derived from `stats`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: CombatantKind,
        position: Vec2,
        stats: CharacterStats,
    ) -> Self {
        let max_health = stats.max_health().max(1);
        Self {
            id: EntityId::new(),
            name: name.into(),
            kind,
            position,
            stats,
            equipped_weapon: None,
            current_speed: stats.movement_speed(),
            level: 1,
            attack_interval_override: None,
            skills: None,
            current_health: max_health,
            max_health,
            alive: true,
            last_attack_time: None,
        }
    }

    /// Equips a weapon.
    #[must_use]
    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.equipped_weapon = Some(weapon);
        self
    }

    /// Overrides the derived maximum health and refills to it.
    #[must_use]
    pub fn with_max_health(mut self, max_health: i32) -> Self {
        self.max_health = max_health.max(1);
        self.current_health = self.max_health;
        self
    }

    /// Attaches a skill set.
    #[must_use]
    pub fn with_skills(mut self, skills: SkillSet) -> Self {
        self.skills = Some(skills);
        self
    }

    /// Forces a fixed interval between attacks.
    #[must_use]
    pub fn with_attack_interval(mut self, seconds: f64) -> Self {
        self.attack_interval_override = Some(seconds);
        self
    }

    /// Current health.
    #[must_use]
    pub const fn current_health(&self) -> i32 {
        self.current_health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Whether the combatant is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Simulation time of the last successful attack, if any.
    #[must_use]
    pub const fn last_attack_time(&self) -> Option<f64> {
        self.last_attack_time
    }

    /// Stamps the last successful attack. Only the combat engine calls this.
    pub(crate) fn mark_attacked(&mut self, sim_time: f64) {
        self.last_attack_time = Some(sim_time);
    }

    /// Health as a fraction in `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            0.0
        } else {
            (self.current_health as f32 / self.max_health as f32).clamp(0.0, 1.0)
        }
    }

    /// Removes health, clamping at zero. Returns the amount actually removed.
    /// A dead combatant takes no damage.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        if !self.alive {
            return 0;
        }
        let applied = amount.min(self.current_health.max(0) as u32);
        self.current_health -= applied as i32;
        if self.current_health <= 0 {
            self.current_health = 0;
            self.alive = false;
        }
        applied
    }

    /// Restores health up to the maximum. Does nothing once dead.
    pub fn heal(&mut self, amount: u32) {
        if !self.alive {
            return;
        }
        let healed = i64::from(self.current_health) + i64::from(amount);
        self.current_health = healed.min(i64::from(self.max_health)) as i32;
    }

    /// Raises maximum health and grants the same amount of current health.
    /// Does nothing once dead.
    pub fn raise_max_health(&mut self, amount: u32) {
        if !self.alive {
            return;
        }
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.max_health = self.max_health.saturating_add(amount);
        self.current_health = self.current_health.saturating_add(amount);
    }

    /// Straight-line distance to another combatant.
    #[must_use]
    pub fn distance_to(&self, other: &Combatant) -> f32 {
        self.position.distance(other.position)
    }

    /// Returns true if the equipped weapon exists and is usable.
    #[must_use]
    pub fn has_usable_weapon(&self) -> bool {
        self.equipped_weapon.as_ref().is_some_and(|w| !w.is_broken())
    }
}

/// Resolves entity handles to live combatants.
///
/// Implemented by whatever owns the combatants for the current tick; an NPC
/// controller never sees itself through this view.
pub trait CombatantRegistry {
    /// Looks up a combatant.
    fn combatant(&self, id: EntityId) -> Option<&Combatant>;
    /// Looks up a combatant mutably.
    fn combatant_mut(&mut self, id: EntityId) -> Option<&mut Combatant>;
}

/// Simple owning registry, mainly for tests and tools.
#[derive(Debug, Default)]
pub struct CombatantPool {
    combatants: Vec<Combatant>,
}

impl CombatantPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a combatant and returns its id.
    pub fn insert(&mut self, combatant: Combatant) -> EntityId {
        let id = combatant.id;
        self.combatants.push(combatant);
        id
    }

    /// Removes and returns a combatant.
    pub fn remove(&mut self, id: EntityId) -> Option<Combatant> {
        let index = self.combatants.iter().position(|c| c.id == id)?;
        Some(self.combatants.swap_remove(index))
    }

    /// Number of combatants held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    /// True if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }
}

impl CombatantRegistry for CombatantPool {
    fn combatant(&self, id: EntityId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    fn combatant_mut(&mut self, id: EntityId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter() -> Combatant {
        Combatant::new(
            "Fighter",
            CombatantKind::Npc,
            Vec2::ZERO,
            CharacterStats::default(),
        )
    }

    #[test]
    fn test_derived_health_and_speed() {
        let c = fighter();
        assert_eq!(c.max_health(), 150);
        assert_eq!(c.current_health(), 150);
        assert_eq!(c.current_speed, 70.0);
        assert!(c.is_alive());
        assert!(c.last_attack_time().is_none());
    }

    #[test]
    fn test_take_damage_clamps_and_kills() {
        let mut c = fighter().with_max_health(100);
        assert_eq!(c.take_damage(30), 30);
        assert_eq!(c.current_health(), 70);

        assert_eq!(c.take_damage(500), 70);
        assert_eq!(c.current_health(), 0);
        assert!(!c.is_alive());

        assert_eq!(c.take_damage(10), 0);
    }

    #[test]
    fn test_heal_caps_and_skips_dead() {
        let mut c = fighter().with_max_health(100);
        c.take_damage(40);
        c.heal(15);
        assert_eq!(c.current_health(), 75);
        c.heal(1000);
        assert_eq!(c.current_health(), 100);

        c.take_damage(100);
        c.heal(50);
        assert_eq!(c.current_health(), 0);
        assert!(!c.is_alive());
    }

    #[test]
    fn test_health_fraction() {
        let mut c = fighter().with_max_health(200);
        c.take_damage(50);
        assert!((c.health_fraction() - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pool_lookup_and_remove() {
        let mut pool = CombatantPool::new();
        let id = pool.insert(fighter());
        assert!(pool.combatant(id).is_some());

        pool.combatant_mut(id).expect("present").take_damage(5);
        assert_eq!(pool.combatant(id).expect("present").current_health(), 145);

        assert!(pool.remove(id).is_some());
        assert!(pool.is_empty());
        assert!(pool.combatant(id).is_none());
    }
}
