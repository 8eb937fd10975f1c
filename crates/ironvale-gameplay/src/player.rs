//! The player character.

use ironvale_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, CombatantKind};
use crate::stats::CharacterStats;

/// Money a new player starts with.
pub const STARTING_MONEY: u64 = 1000;

/// Experience per level; level `n` needs `n * EXPERIENCE_PER_PLAYER_LEVEL`.
pub const EXPERIENCE_PER_PLAYER_LEVEL: u64 = 100;

/// The player: a combatant plus purse, standing and experience.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Health, stats, position, and weapon
    pub combatant: Combatant,
    /// Reputation; may go negative
    pub reputation: i32,
    money: u64,
    experience: u64,
}

impl Player {
    /// Creates a player with default stats.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Vec2) -> Self {
        Self::with_stats(name, position, CharacterStats::default())
    }

    /// Creates a player with the given stats.
    #[must_use]
    pub fn with_stats(name: impl Into<String>, position: Vec2, stats: CharacterStats) -> Self {
        Self {
            combatant: Combatant::new(name, CombatantKind::Player, position, stats),
            reputation: 0,
            money: STARTING_MONEY,
            experience: 0,
        }
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.combatant.id
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.combatant.position
    }

    /// Moves the player without any bounds check.
    pub fn set_position(&mut self, position: Vec2) {
        self.combatant.position = position;
    }

    /// Coins held.
    #[must_use]
    pub const fn money(&self) -> u64 {
        self.money
    }

    /// Adds (or with a negative amount, removes) money. Never drops below zero.
    pub fn add_money(&mut self, amount: i64) {
        self.money = if amount >= 0 {
            self.money.saturating_add(amount.unsigned_abs())
        } else {
            self.money.saturating_sub(amount.unsigned_abs())
        };
    }

    /// True if the player holds at least `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: u64) -> bool {
        self.money >= cost
    }

    /// Pays `cost` if affordable. Returns whether the payment went through.
    pub fn spend(&mut self, cost: u64) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.money -= cost;
        true
    }

    /// Total experience earned.
    #[must_use]
    pub const fn experience(&self) -> u64 {
        self.experience
    }

    /// Adds experience and levels up as often as it pays for. Returns the
    /// number of levels gained.
    pub fn add_experience(&mut self, amount: u64) -> u32 {
        self.experience = self.experience.saturating_add(amount);
        let mut gained = 0;
        while self.experience >= u64::from(self.combatant.level) * EXPERIENCE_PER_PLAYER_LEVEL {
            self.level_up();
            gained += 1;
        }
        gained
    }

    fn level_up(&mut self) {
        self.combatant.level += 1;
        let bonus = 10 + self.combatant.stats.constitution.max(0) / 2;
        self.combatant.raise_max_health(bonus.unsigned_abs());
        tracing::info!(level = self.combatant.level, "Player leveled up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_never_negative() {
        let mut player = Player::new("Hero", Vec2::ZERO);
        assert_eq!(player.money(), 1000);
        player.add_money(-5000);
        assert_eq!(player.money(), 0);
        player.add_money(250);
        assert_eq!(player.money(), 250);
    }

    #[test]
    fn test_spend() {
        let mut player = Player::new("Hero", Vec2::ZERO);
        assert!(player.spend(400));
        assert_eq!(player.money(), 600);
        assert!(!player.spend(601));
        assert_eq!(player.money(), 600);
    }

    #[test]
    fn test_level_up_raises_health() {
        let mut player = Player::new("Hero", Vec2::ZERO);
        let before = player.combatant.max_health();
        assert_eq!(player.add_experience(100), 1);
        assert_eq!(player.combatant.level, 2);
        assert_eq!(player.combatant.max_health(), before + 15);
        assert_eq!(player.combatant.current_health(), before + 15);

        // Level 2 needs 200 total.
        assert_eq!(player.add_experience(50), 0);
        assert_eq!(player.add_experience(50), 1);
    }
}
