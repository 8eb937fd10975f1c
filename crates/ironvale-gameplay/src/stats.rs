//! Character attribute model.
//!
//! Six integer attributes drive every derived combat and movement value:
//! - Strength: melee damage
//! - Dexterity: attack speed, hit/miss, crits, movement
//! - Constitution: maximum health
//! - Intelligence, Wisdom, Charisma: carried for skills and dialogue

use serde::{Deserialize, Serialize};

/// Value every attribute starts at.
pub const DEFAULT_STAT: i32 = 10;

/// Health granted before constitution is applied.
pub const BASE_HEALTH: i32 = 100;

/// Health granted per point of constitution.
pub const HEALTH_PER_CONSTITUTION: i32 = 5;

/// Movement speed before dexterity is applied (units per second).
pub const BASE_SPEED: f32 = 50.0;

/// Movement speed granted per point of dexterity.
pub const SPEED_PER_DEXTERITY: f32 = 2.0;

/// Flat damage of an unarmed melee strike.
pub const UNARMED_MELEE_BASE: i32 = 10;

/// Flat damage of an unarmed ranged attack (thrown stones and the like).
pub const UNARMED_RANGED_BASE: i32 = 8;

/// Attribute selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    /// Strength
    Strength,
    /// Dexterity
    Dexterity,
    /// Constitution
    Constitution,
    /// Intelligence
    Intelligence,
    /// Wisdom
    Wisdom,
    /// Charisma
    Charisma,
}

impl StatType {
    /// All attribute kinds in display order.
    pub const ALL: [Self; 6] = [
        Self::Strength,
        Self::Dexterity,
        Self::Constitution,
        Self::Intelligence,
        Self::Wisdom,
        Self::Charisma,
    ];
}

/// The six-attribute bundle carried by every combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterStats {
    /// Strength
    pub strength: i32,
    /// Dexterity
    pub dexterity: i32,
    /// Constitution
    pub constitution: i32,
    /// Intelligence
    pub intelligence: i32,
    /// Wisdom
    pub wisdom: i32,
    /// Charisma
    pub charisma: i32,
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self {
            strength: DEFAULT_STAT,
            dexterity: DEFAULT_STAT,
            constitution: DEFAULT_STAT,
            intelligence: DEFAULT_STAT,
            wisdom: DEFAULT_STAT,
            charisma: DEFAULT_STAT,
        }
    }
}

impl CharacterStats {
    /// Creates the default attribute bundle (all 10).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets strength.
    #[must_use]
    pub fn with_strength(mut self, value: i32) -> Self {
        self.strength = value;
        self
    }

    /// Sets dexterity.
    #[must_use]
    pub fn with_dexterity(mut self, value: i32) -> Self {
        self.dexterity = value;
        self
    }

    /// Sets constitution.
    #[must_use]
    pub fn with_constitution(mut self, value: i32) -> Self {
        self.constitution = value;
        self
    }

    /// Returns the value of one attribute.
    #[must_use]
    pub const fn get(&self, stat: StatType) -> i32 {
        match stat {
            StatType::Strength => self.strength,
            StatType::Dexterity => self.dexterity,
            StatType::Constitution => self.constitution,
            StatType::Intelligence => self.intelligence,
            StatType::Wisdom => self.wisdom,
            StatType::Charisma => self.charisma,
        }
    }

    /// Overwrites one attribute.
    pub fn set(&mut self, stat: StatType, value: i32) {
        let slot = match stat {
            StatType::Strength => &mut self.strength,
            StatType::Dexterity => &mut self.dexterity,
            StatType::Constitution => &mut self.constitution,
            StatType::Intelligence => &mut self.intelligence,
            StatType::Wisdom => &mut self.wisdom,
            StatType::Charisma => &mut self.charisma,
        };
        *slot = value;
    }

    /// Adds a (possibly negative) modifier, flooring the result at zero.
    pub fn modify(&mut self, stat: StatType, modifier: i32) {
        let value = self.get(stat).saturating_add(modifier).max(0);
        self.set(stat, value);
    }

    /// Maximum health: `100 + 5 * constitution`.
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        BASE_HEALTH + self.constitution * HEALTH_PER_CONSTITUTION
    }

    /// Movement speed: `50 + 2 * dexterity`.
    #[must_use]
    pub fn movement_speed(&self) -> f32 {
        BASE_SPEED + self.dexterity as f32 * SPEED_PER_DEXTERITY
    }

    /// Unarmed melee damage: `10 + strength / 2`.
    #[must_use]
    pub const fn unarmed_melee_damage(&self) -> i32 {
        UNARMED_MELEE_BASE + self.strength / 2
    }

    /// Unarmed ranged damage: `8 + dexterity / 3`.
    #[must_use]
    pub const fn unarmed_ranged_damage(&self) -> i32 {
        UNARMED_RANGED_BASE + self.dexterity / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stats() {
        let stats = CharacterStats::default();
        for stat in StatType::ALL {
            assert_eq!(stats.get(stat), 10);
        }
    }

    #[test]
    fn test_derived_values() {
        let stats = CharacterStats::new();
        assert_eq!(stats.max_health(), 150);
        assert_eq!(stats.movement_speed(), 70.0);
        assert_eq!(stats.unarmed_melee_damage(), 15);
        assert_eq!(stats.unarmed_ranged_damage(), 11);
    }

    #[test]
    fn test_modify_floors_at_zero() {
        let mut stats = CharacterStats::new();
        stats.modify(StatType::Wisdom, -25);
        assert_eq!(stats.wisdom, 0);

        stats.modify(StatType::Charisma, 5);
        assert_eq!(stats.charisma, 15);
    }

    #[test]
    fn test_set_targets_single_attribute() {
        let mut stats = CharacterStats::new();
        stats.set(StatType::Intelligence, 18);
        assert_eq!(stats.intelligence, 18);
        assert_eq!(stats.strength, 10);
    }

    #[test]
    fn test_builder() {
        let stats = CharacterStats::new()
            .with_strength(16)
            .with_dexterity(4)
            .with_constitution(12);
        assert_eq!(stats.max_health(), 160);
        assert_eq!(stats.movement_speed(), 58.0);
        assert_eq!(stats.unarmed_melee_damage(), 18);
    }
}
