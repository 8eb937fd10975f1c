//! Combat resolution.
//!
//! This module resolves single attack attempts between two combatants:
//! - Range checks
//! - Cooldown gating from attack intervals
//! - Miss, block, and critical rolls driven by attributes and skills
//! - Damage from weapons (durability-scaled) or bare hands
//!
//! The engine keeps no per-fight state. `last_attack_time`, weapon
//! durability, and health all live on the combatants and weapons passed in.

use std::collections::VecDeque;
use std::fmt;

use ironvale_common::EntityId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combatant::Combatant;
use crate::skills::{SkillSet, SkillType};
use crate::stats::CharacterStats;
use crate::weapon::Weapon;

/// Tunable constants for combat resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Miss chance before attributes
    pub base_miss_chance: f32,
    /// Block chance before shield skill
    pub base_block_chance: f32,
    /// Critical chance before dexterity
    pub base_critical_chance: f32,
    /// Upper bound for every probability roll
    pub max_chance: f32,
    /// Damage multiplier on a critical hit
    pub critical_multiplier: f32,
    /// Attacker dexterity divisor for the miss roll
    pub attacker_dex_miss_divisor: f32,
    /// Defender dexterity divisor for the miss roll
    pub defender_dex_miss_divisor: f32,
    /// Dexterity divisor for the critical roll
    pub dex_critical_divisor: f32,
    /// Shield skill contribution to block chance at full proficiency
    pub shield_block_factor: f32,
    /// Weapon skill contribution to damage at full proficiency
    pub skill_damage_factor: f32,
    /// Reach of an unarmed attack
    pub unarmed_range: f32,
    /// Interval used when a weapon reports no usable rate
    pub default_attack_interval: f64,
    /// Unarmed interval before dexterity
    pub unarmed_base_interval: f64,
    /// Interval shaved off per full 100 dexterity when unarmed
    pub unarmed_dex_factor: f64,
    /// Shortest unarmed interval
    pub min_unarmed_interval: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            base_miss_chance: 0.05,
            base_block_chance: 0.05,
            base_critical_chance: 0.10,
            max_chance: 0.5,
            critical_multiplier: 1.5,
            attacker_dex_miss_divisor: 200.0,
            defender_dex_miss_divisor: 300.0,
            dex_critical_divisor: 200.0,
            shield_block_factor: 0.2,
            skill_damage_factor: 0.3,
            unarmed_range: 50.0,
            default_attack_interval: 1.0,
            unarmed_base_interval: 1.0,
            unarmed_dex_factor: 0.3,
            min_unarmed_interval: 0.5,
        }
    }
}

/// Source of uniform rolls in `[0, 1)`.
pub trait RollSource: Send {
    /// Returns the next roll.
    fn roll(&mut self) -> f32;
}

impl RollSource for fastrand::Rng {
    fn roll(&mut self) -> f32 {
        self.f32()
    }
}

/// Replays a fixed sequence of rolls, then repeats a fallback value.
///
/// The default fallback of `0.999` never triggers a miss, block, or critical
/// under the default configuration.
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    queue: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedRolls {
    /// Creates a script from the given rolls.
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = f32>) -> Self {
        Self {
            queue: rolls.into_iter().collect(),
            fallback: 0.999,
        }
    }

    /// A script that always hits for plain damage.
    #[must_use]
    pub fn always_hit() -> Self {
        Self::new([])
    }

    /// Sets the value returned once the script runs out.
    #[must_use]
    pub fn with_fallback(mut self, fallback: f32) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of scripted rolls not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl RollSource for ScriptedRolls {
    fn roll(&mut self) -> f32 {
        self.queue.pop_front().unwrap_or(self.fallback)
    }
}

/// What the attacker swings with.
#[derive(Debug)]
pub enum Armament<'a> {
    /// Bare hands, regardless of equipment
    Unarmed,
    /// The attacker's own equipped weapon (bare hands if none)
    Equipped,
    /// A weapon supplied by the caller
    Wielding(&'a mut Weapon),
}

impl<'a> Armament<'a> {
    /// Read-only view of the weapon this armament resolves to.
    #[must_use]
    pub fn weapon<'s>(&'s self, attacker: &'s Combatant) -> Option<&'s Weapon> {
        match self {
            Self::Unarmed => None,
            Self::Equipped => attacker.equipped_weapon.as_ref(),
            Self::Wielding(weapon) => Some(&**weapon),
        }
    }

    fn resolve<'e>(self, equipped: &'e mut Option<Weapon>) -> Option<&'e mut Weapon>
    where
        'a: 'e,
    {
        match self {
            Self::Unarmed => None,
            Self::Equipped => equipped.as_mut(),
            Self::Wielding(weapon) => Some(weapon),
        }
    }
}

/// Optional proficiency sources for both sides of an attack.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatSkills<'a> {
    /// Attacker's skills (weapon damage bonus)
    pub attacker: Option<&'a SkillSet>,
    /// Defender's skills (shield block bonus)
    pub defender: Option<&'a SkillSet>,
}

impl<'a> CombatSkills<'a> {
    /// No skill sources on either side.
    pub const NONE: CombatSkills<'static> = CombatSkills {
        attacker: None,
        defender: None,
    };

    /// Skill sources for attacker and defender.
    #[must_use]
    pub const fn new(attacker: Option<&'a SkillSet>, defender: Option<&'a SkillSet>) -> Self {
        Self { attacker, defender }
    }

    /// One skill source consulted for both the damage and block bonuses.
    #[must_use]
    pub const fn shared(skills: &'a SkillSet) -> Self {
        Self {
            attacker: Some(skills),
            defender: Some(skills),
        }
    }
}

/// Interpreted result of one attack attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackOutcome {
    /// Cooldown not elapsed; nothing was rolled
    OnCooldown,
    /// The attack missed
    Missed,
    /// The defender blocked
    Blocked,
    /// Regular hit
    Hit,
    /// Critical hit
    CriticalHit,
}

/// Record of one attack attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatResult {
    /// Attacking combatant
    pub attacker: EntityId,
    /// Defending combatant
    pub defender: EntityId,
    /// Attacker name, for logs
    pub attacker_name: String,
    /// Defender name, for logs
    pub defender_name: String,
    /// Final damage of the attack, including any critical multiplier
    pub damage_dealt: u32,
    /// The attack missed
    pub is_miss: bool,
    /// The defender blocked
    pub is_blocked: bool,
    /// Damage was multiplied by the critical multiplier
    pub is_critical: bool,
    /// False only when the cooldown rejected the attempt
    pub attack_succeeded: bool,
}

impl CombatResult {
    fn between(attacker: &Combatant, defender: &Combatant, attack_succeeded: bool) -> Self {
        Self {
            attacker: attacker.id,
            defender: defender.id,
            attacker_name: attacker.name.clone(),
            defender_name: defender.name.clone(),
            damage_dealt: 0,
            is_miss: false,
            is_blocked: false,
            is_critical: false,
            attack_succeeded,
        }
    }

    /// Collapses the flags into a single outcome.
    #[must_use]
    pub const fn outcome(&self) -> AttackOutcome {
        if !self.attack_succeeded {
            AttackOutcome::OnCooldown
        } else if self.is_miss {
            AttackOutcome::Missed
        } else if self.is_blocked {
            AttackOutcome::Blocked
        } else if self.is_critical {
            AttackOutcome::CriticalHit
        } else {
            AttackOutcome::Hit
        }
    }

    /// True if health was removed.
    #[must_use]
    pub const fn landed(&self) -> bool {
        matches!(self.outcome(), AttackOutcome::Hit | AttackOutcome::CriticalHit)
    }
}

impl fmt::Display for CombatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, d) = (&self.attacker_name, &self.defender_name);
        match self.outcome() {
            AttackOutcome::OnCooldown => write!(f, "{a} is still recovering"),
            AttackOutcome::Missed => write!(f, "{a} misses {d}"),
            AttackOutcome::Blocked => write!(f, "{d} blocks {a}'s attack"),
            AttackOutcome::CriticalHit => {
                write!(f, "{a} critically hits {d} for {} damage", self.damage_dealt)
            },
            AttackOutcome::Hit => write!(f, "{a} hits {d} for {} damage", self.damage_dealt),
        }
    }
}

/// Miss chance: `clamp(base - atk_dex/200 + def_dex/300, 0, max)`.
#[must_use]
pub fn miss_chance(
    config: &CombatConfig,
    attacker: &CharacterStats,
    defender: &CharacterStats,
) -> f32 {
    let chance = config.base_miss_chance
        - attacker.dexterity as f32 / config.attacker_dex_miss_divisor
        + defender.dexterity as f32 / config.defender_dex_miss_divisor;
    clamp_chance(config, chance)
}

/// Block chance: `clamp(base + shield_effectiveness * 0.2, 0, max)`.
#[must_use]
pub fn block_chance(config: &CombatConfig, defender_skills: Option<&SkillSet>) -> f32 {
    let shield = defender_skills.map_or(0.0, |skills| skills.effectiveness(SkillType::Shield));
    clamp_chance(
        config,
        config.base_block_chance + shield * config.shield_block_factor,
    )
}

/// Critical chance: `clamp(base + atk_dex/200, 0, max)`.
#[must_use]
pub fn critical_chance(config: &CombatConfig, attacker: &CharacterStats) -> f32 {
    clamp_chance(
        config,
        config.base_critical_chance + attacker.dexterity as f32 / config.dex_critical_divisor,
    )
}

fn clamp_chance(config: &CombatConfig, chance: f32) -> f32 {
    if chance.is_nan() {
        return 0.0;
    }
    chance.clamp(0.0, config.max_chance.max(0.0))
}

/// Resolves attacks. Holds configuration and the random source only.
pub struct CombatEngine {
    config: CombatConfig,
    rolls: Box<dyn RollSource>,
}

impl fmt::Debug for CombatEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for CombatEngine {
    fn default() -> Self {
        Self::new(CombatConfig::default(), fastrand::Rng::new())
    }
}

impl CombatEngine {
    /// Creates an engine with the given rolls.
    #[must_use]
    pub fn new(config: CombatConfig, rolls: impl RollSource + 'static) -> Self {
        Self {
            config,
            rolls: Box::new(rolls),
        }
    }

    /// Creates an engine with a seeded random source.
    #[must_use]
    pub fn seeded(config: CombatConfig, seed: u64) -> Self {
        Self::new(config, fastrand::Rng::with_seed(seed))
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Replaces the random source.
    pub fn set_rolls(&mut self, rolls: impl RollSource + 'static) {
        self.rolls = Box::new(rolls);
    }

    /// True if the defender is within reach of the weapon (or of bare hands).
    #[must_use]
    pub fn can_attack(
        &self,
        attacker: &Combatant,
        defender: &Combatant,
        weapon: Option<&Weapon>,
    ) -> bool {
        let reach = weapon.map_or(self.config.unarmed_range, |w| w.range);
        attacker.distance_to(defender) <= reach
    }

    /// Seconds the attacker must wait between attacks.
    #[must_use]
    pub fn attack_interval(&self, attacker: &Combatant, weapon: Option<&Weapon>) -> f64 {
        if let Some(interval) = attacker.attack_interval_override {
            return interval;
        }
        match weapon {
            Some(weapon) => weapon
                .attack_interval()
                .unwrap_or(self.config.default_attack_interval),
            None => {
                let dex_bonus = f64::from(attacker.stats.dexterity) / 100.0;
                (self.config.unarmed_base_interval - dex_bonus * self.config.unarmed_dex_factor)
                    .max(self.config.min_unarmed_interval)
            },
        }
    }

    /// Seconds until the attacker may attack again (zero when ready).
    #[must_use]
    pub fn cooldown_remaining(
        &self,
        attacker: &Combatant,
        sim_time: f64,
        weapon: Option<&Weapon>,
    ) -> f64 {
        match attacker.last_attack_time() {
            Some(last) => (self.attack_interval(attacker, weapon) - (sim_time - last)).max(0.0),
            None => 0.0,
        }
    }

    /// Attempts one attack, gated by the attacker's cooldown.
    ///
    /// A rejected attempt returns `attack_succeeded == false` and touches
    /// nothing: no rolls, no durability loss, no damage, no timestamp.
    pub fn process_combat_round(
        &mut self,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        sim_time: f64,
        armament: Armament<'_>,
        skills: CombatSkills<'_>,
    ) -> CombatResult {
        let interval = self.attack_interval(attacker, armament.weapon(attacker));
        if let Some(last) = attacker.last_attack_time() {
            if sim_time - last < interval {
                return CombatResult::between(attacker, defender, false);
            }
        }

        let mut result = self.calculate_attack(attacker, defender, armament, skills);
        result.attack_succeeded = true;
        attacker.mark_attacked(sim_time);
        result
    }

    /// Resolves one attack, assuming the cooldown has already cleared.
    ///
    /// Rolls happen in order: miss, block, critical. Weapon durability drops
    /// by one only when damage is computed.
    pub fn calculate_attack(
        &mut self,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        armament: Armament<'_>,
        skills: CombatSkills<'_>,
    ) -> CombatResult {
        let mut result = CombatResult::between(attacker, defender, true);
        let attacker_stats = attacker.stats;

        if self.rolls.roll() < miss_chance(&self.config, &attacker_stats, &defender.stats) {
            result.is_miss = true;
            debug!(%result, "Attack resolved");
            return result;
        }

        if self.rolls.roll() < block_chance(&self.config, skills.defender) {
            result.is_blocked = true;
            debug!(%result, "Attack resolved");
            return result;
        }

        let mut damage = match armament.resolve(&mut attacker.equipped_weapon) {
            Some(weapon) => self.weapon_damage(&attacker_stats, weapon, skills.attacker),
            // Bare-hand formula already includes the strength bonus.
            None => attacker_stats.unarmed_melee_damage(),
        };

        if self.rolls.roll() < critical_chance(&self.config, &attacker_stats) {
            damage = (damage as f32 * self.config.critical_multiplier) as i32;
            result.is_critical = true;
        }

        result.damage_dealt = damage.max(0) as u32;
        defender.take_damage(result.damage_dealt);
        debug!(%result, "Attack resolved");
        result
    }

    fn weapon_damage(
        &self,
        stats: &CharacterStats,
        weapon: &mut Weapon,
        skills: Option<&SkillSet>,
    ) -> i32 {
        let base = weapon.effective_damage();
        let stat_bonus = if weapon.weapon_type.is_ranged() {
            stats.dexterity / 2
        } else {
            stats.strength / 2
        };
        let skill_bonus = skills.map_or(0, |skills| {
            let proficiency = skills.effectiveness(weapon.weapon_type.skill());
            (base as f32 * proficiency * self.config.skill_damage_factor) as i32
        });
        weapon.use_once();
        base + stat_bonus + skill_bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::CombatantKind;
    use crate::weapon::{DamageType, WeaponCatalog, WeaponType};
    use ironvale_common::Vec2;
    use proptest::prelude::*;

    fn combatant(name: &str, x: f32, stats: CharacterStats) -> Combatant {
        Combatant::new(name, CombatantKind::Npc, Vec2::new(x, 0.0), stats)
    }

    fn engine(rolls: ScriptedRolls) -> CombatEngine {
        CombatEngine::new(CombatConfig::default(), rolls)
    }

    #[test]
    fn test_unarmed_guaranteed_hit() {
        let mut engine = engine(ScriptedRolls::always_hit());
        let mut attacker = combatant("A", 0.0, CharacterStats::default());
        let mut defender = combatant("D", 10.0, CharacterStats::default()).with_max_health(100);

        let result = engine.process_combat_round(
            &mut attacker,
            &mut defender,
            0.0,
            Armament::Unarmed,
            CombatSkills::NONE,
        );

        assert!(result.attack_succeeded);
        assert_eq!(result.outcome(), AttackOutcome::Hit);
        assert_eq!(result.damage_dealt, 15);
        assert_eq!(defender.current_health(), 85);
        assert_eq!(attacker.last_attack_time(), Some(0.0));
    }

    #[test]
    fn test_cooldown_rejection_mutates_nothing() {
        let mut engine = engine(ScriptedRolls::always_hit());
        let mut attacker = combatant("A", 0.0, CharacterStats::default())
            .with_weapon(WeaponCatalog::builtin().get("iron_sword").expect("sword"));
        let mut defender = combatant("D", 10.0, CharacterStats::default());

        let first = engine.process_combat_round(
            &mut attacker,
            &mut defender,
            5.0,
            Armament::Equipped,
            CombatSkills::NONE,
        );
        assert!(first.attack_succeeded);
        let health = defender.current_health();
        let durability = attacker.equipped_weapon.as_ref().map(Weapon::durability);

        // Sword interval is 1 / 1.2 s.
        let second = engine.process_combat_round(
            &mut attacker,
            &mut defender,
            5.5,
            Armament::Equipped,
            CombatSkills::NONE,
        );
        assert!(!second.attack_succeeded);
        assert_eq!(second.outcome(), AttackOutcome::OnCooldown);
        assert_eq!(second.damage_dealt, 0);
        assert!(!second.is_miss && !second.is_blocked && !second.is_critical);
        assert_eq!(defender.current_health(), health);
        assert_eq!(
            attacker.equipped_weapon.as_ref().map(Weapon::durability),
            durability
        );
        assert_eq!(attacker.last_attack_time(), Some(5.0));

        let third = engine.process_combat_round(
            &mut attacker,
            &mut defender,
            5.9,
            Armament::Equipped,
            CombatSkills::NONE,
        );
        assert!(third.attack_succeeded);
    }

    #[test]
    fn test_rejection_consumes_no_rolls() {
        let mut attacker = combatant("A", 0.0, CharacterStats::default());
        let mut defender = combatant("D", 0.0, CharacterStats::default());
        let mut engine = engine(ScriptedRolls::always_hit());
        engine.process_combat_round(
            &mut attacker,
            &mut defender,
            0.0,
            Armament::Unarmed,
            CombatSkills::NONE,
        );

        // First roll would be a miss if consumed.
        engine.set_rolls(ScriptedRolls::new([0.0]));
        let rejected = engine.process_combat_round(
            &mut attacker,
            &mut defender,
            0.1,
            Armament::Unarmed,
            CombatSkills::NONE,
        );
        assert!(!rejected.attack_succeeded);

        let next = engine.process_combat_round(
            &mut attacker,
            &mut defender,
            2.0,
            Armament::Unarmed,
            CombatSkills::NONE,
        );
        assert_eq!(next.outcome(), AttackOutcome::Missed);
    }

    #[test]
    fn test_miss_leaves_weapon_untouched() {
        let mut engine = engine(ScriptedRolls::new([0.0]));
        let mut attacker = combatant("A", 0.0, CharacterStats::default());
        let mut defender = combatant("D", 0.0, CharacterStats::default().with_dexterity(30));
        let mut axe = WeaponCatalog::builtin().get("axe").expect("axe");

        let result = engine.calculate_attack(
            &mut attacker,
            &mut defender,
            Armament::Wielding(&mut axe),
            CombatSkills::NONE,
        );
        assert!(result.is_miss);
        assert_eq!(result.damage_dealt, 0);
        assert_eq!(axe.durability(), axe.max_durability());
        assert_eq!(defender.current_health(), defender.max_health());
    }

    #[test]
    fn test_block_leaves_weapon_untouched() {
        // Miss roll passes, block roll fails.
        let mut engine = engine(ScriptedRolls::new([0.9, 0.01]));
        let mut attacker = combatant("A", 0.0, CharacterStats::default())
            .with_weapon(WeaponCatalog::builtin().get("dagger").expect("dagger"));
        let mut defender = combatant("D", 0.0, CharacterStats::default());

        let result = engine.calculate_attack(
            &mut attacker,
            &mut defender,
            Armament::Equipped,
            CombatSkills::NONE,
        );
        assert_eq!(result.outcome(), AttackOutcome::Blocked);
        assert_eq!(
            attacker.equipped_weapon.as_ref().map(Weapon::durability),
            Some(100)
        );
    }

    #[test]
    fn test_weapon_damage_with_bonuses() {
        let mut engine = engine(ScriptedRolls::always_hit());
        let mut attacker = combatant("A", 0.0, CharacterStats::default().with_strength(14));
        let mut defender = combatant("D", 0.0, CharacterStats::default());
        let mut sword = WeaponCatalog::builtin().get("iron_sword").expect("sword");
        let skills = SkillSet::new().with_level(SkillType::OneHanded, 50);

        let result = engine.calculate_attack(
            &mut attacker,
            &mut defender,
            Armament::Wielding(&mut sword),
            CombatSkills::new(Some(&skills), None),
        );
        // 15 base + 7 strength + trunc(15 * 0.5 * 0.3) = 2
        assert_eq!(result.damage_dealt, 24);
        assert_eq!(sword.durability(), 99);
    }

    #[test]
    fn test_ranged_weapon_uses_dexterity() {
        let mut engine = engine(ScriptedRolls::always_hit());
        let stats = CharacterStats::default().with_strength(2).with_dexterity(16);
        let mut attacker = combatant("A", 0.0, stats);
        let mut defender = combatant("D", 150.0, CharacterStats::default());
        let mut bow = WeaponCatalog::builtin().get("longbow").expect("bow");

        assert!(engine.can_attack(&attacker, &defender, Some(&bow)));
        let result = engine.calculate_attack(
            &mut attacker,
            &mut defender,
            Armament::Wielding(&mut bow),
            CombatSkills::NONE,
        );
        assert_eq!(result.damage_dealt, 28);
    }

    #[test]
    fn test_critical_truncates() {
        // miss no, block no, crit yes
        let mut engine = engine(ScriptedRolls::new([0.9, 0.9, 0.0]));
        let mut attacker = combatant("A", 0.0, CharacterStats::default().with_strength(11));
        let mut defender = combatant("D", 0.0, CharacterStats::default());

        let result = engine.calculate_attack(
            &mut attacker,
            &mut defender,
            Armament::Unarmed,
            CombatSkills::NONE,
        );
        assert_eq!(result.outcome(), AttackOutcome::CriticalHit);
        // trunc(15 * 1.5)
        assert_eq!(result.damage_dealt, 22);
    }

    #[test]
    fn test_broken_weapon_still_deals_half() {
        let mut engine = engine(ScriptedRolls::always_hit());
        let mut attacker = combatant("A", 0.0, CharacterStats::default().with_strength(0));
        let mut defender = combatant("D", 0.0, CharacterStats::default());
        let mut mace = Weapon::new("Mace", WeaponType::Mace, 20, DamageType::Blunt);
        mace.wear(1000);

        let result = engine.calculate_attack(
            &mut attacker,
            &mut defender,
            Armament::Wielding(&mut mace),
            CombatSkills::NONE,
        );
        assert_eq!(result.damage_dealt, 10);
        assert_eq!(mace.durability(), 0);
    }

    #[test]
    fn test_damage_reported_in_full_on_overkill() {
        let mut engine = engine(ScriptedRolls::always_hit());
        let mut attacker = combatant("A", 0.0, CharacterStats::default());
        let mut defender = combatant("D", 0.0, CharacterStats::default()).with_max_health(6);

        let result = engine.calculate_attack(
            &mut attacker,
            &mut defender,
            Armament::Unarmed,
            CombatSkills::NONE,
        );
        assert_eq!(result.damage_dealt, 15);
        assert_eq!(defender.current_health(), 0);
        assert!(!defender.is_alive());
    }

    #[test]
    fn test_can_attack_ranges() {
        let engine = CombatEngine::default();
        let attacker = combatant("A", 0.0, CharacterStats::default());
        let near = combatant("N", 50.0, CharacterStats::default());
        let far = combatant("F", 50.5, CharacterStats::default());
        let spear = WeaponCatalog::builtin().get("spear").expect("spear");

        assert!(engine.can_attack(&attacker, &near, None));
        assert!(!engine.can_attack(&attacker, &far, None));
        assert!(engine.can_attack(&attacker, &far, Some(&spear)));
    }

    #[test]
    fn test_attack_interval_precedence() {
        let engine = CombatEngine::default();
        let dagger = WeaponCatalog::builtin().get("dagger").expect("dagger");

        let unarmed = combatant("A", 0.0, CharacterStats::default());
        assert!((engine.attack_interval(&unarmed, None) - 0.97).abs() < 1e-9);

        let nimble = combatant("B", 0.0, CharacterStats::default().with_dexterity(400));
        assert!((engine.attack_interval(&nimble, None) - 0.5).abs() < 1e-9);

        assert!((engine.attack_interval(&unarmed, Some(&dagger)) - 1.0 / 1.5).abs() < 1e-6);

        let stalled = dagger.clone().with_attack_rate(0.0);
        assert!((engine.attack_interval(&unarmed, Some(&stalled)) - 1.0).abs() < 1e-9);

        let forced = unarmed.clone().with_attack_interval(2.5);
        assert!((engine.attack_interval(&forced, Some(&dagger)) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_cooldown_remaining() {
        let mut engine = engine(ScriptedRolls::always_hit());
        let mut attacker = combatant("A", 0.0, CharacterStats::default()).with_attack_interval(2.0);
        let mut defender = combatant("D", 0.0, CharacterStats::default());
        assert_eq!(engine.cooldown_remaining(&attacker, 0.0, None), 0.0);

        engine.process_combat_round(
            &mut attacker,
            &mut defender,
            10.0,
            Armament::Unarmed,
            CombatSkills::NONE,
        );
        assert!((engine.cooldown_remaining(&attacker, 10.5, None) - 1.5).abs() < 1e-9);
        assert_eq!(engine.cooldown_remaining(&attacker, 20.0, None), 0.0);
    }

    #[test]
    fn test_shield_skill_raises_block() {
        let config = CombatConfig::default();
        let shield = SkillSet::new().with_level(SkillType::Shield, 100);
        assert!((block_chance(&config, None) - 0.05).abs() < 1e-6);
        assert!((block_chance(&config, Some(&shield)) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_result_display() {
        let mut engine = engine(ScriptedRolls::always_hit());
        let mut attacker = combatant("Aldric", 0.0, CharacterStats::default());
        let mut defender = combatant("Bandit", 0.0, CharacterStats::default());
        let result = engine.calculate_attack(
            &mut attacker,
            &mut defender,
            Armament::Unarmed,
            CombatSkills::NONE,
        );
        assert_eq!(result.to_string(), "Aldric hits Bandit for 15 damage");
    }

    proptest! {
        #[test]
        fn chances_stay_clamped(
            atk_dex in -1000i32..1000,
            def_dex in -1000i32..1000,
            shield in 0u32..=100,
        ) {
            let config = CombatConfig::default();
            let attacker = CharacterStats::default().with_dexterity(atk_dex);
            let defender = CharacterStats::default().with_dexterity(def_dex);
            let skills = SkillSet::new().with_level(SkillType::Shield, shield);

            let miss = miss_chance(&config, &attacker, &defender);
            let block = block_chance(&config, Some(&skills));
            let crit = critical_chance(&config, &attacker);

            prop_assert!((0.0..=0.5).contains(&miss));
            prop_assert!((0.0..=0.5).contains(&block));
            prop_assert!((0.0..=0.5).contains(&crit));
        }

        #[test]
        fn durability_never_increases_through_combat(rolls in proptest::collection::vec(0.0f32..1.0, 0..60)) {
            let mut engine = CombatEngine::new(CombatConfig::default(), ScriptedRolls::new(rolls));
            let mut attacker = combatant("A", 0.0, CharacterStats::default())
                .with_weapon(WeaponCatalog::builtin().get("dagger").expect("dagger"));
            let mut defender = combatant("D", 0.0, CharacterStats::default()).with_max_health(100_000);

            let mut last = 100;
            for step in 0..20 {
                engine.process_combat_round(
                    &mut attacker,
                    &mut defender,
                    f64::from(step),
                    Armament::Equipped,
                    CombatSkills::NONE,
                );
                let now = attacker.equipped_weapon.as_ref().map_or(0, Weapon::durability);
                prop_assert!(now <= last);
                last = now;
            }
        }
    }
}
