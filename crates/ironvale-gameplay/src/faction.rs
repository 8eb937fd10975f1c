//! Factions and NPC-to-player relationships.

use serde::{Deserialize, Serialize};

/// Lowest relationship value.
pub const RELATIONSHIP_MIN: i32 = -100;

/// Highest relationship value.
pub const RELATIONSHIP_MAX: i32 = 100;

/// Relationship band boundaries, each the inclusive lower bound of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipThresholds {
    /// Ally at or above
    pub ally: i32,
    /// Friend at or above
    pub friend: i32,
    /// Neutral at or above
    pub neutral: i32,
    /// Enemy at or above; anything lower is hostile
    pub enemy: i32,
}

impl RelationshipThresholds {
    /// Standard bands.
    pub const STANDARD: Self = Self {
        ally: 80,
        friend: 50,
        neutral: -50,
        enemy: -80,
    };
}

impl Default for RelationshipThresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Allegiance of an NPC on the overworld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Unaligned townsfolk and travellers
    #[default]
    Neutral,
    /// Declared enemies
    Enemy,
    /// Outlaws
    Bandit,
    /// Friendly forces
    Alliance,
}

impl Faction {
    /// Hostile factions attack on contact.
    #[must_use]
    pub const fn is_hostile(self) -> bool {
        matches!(self, Self::Enemy | Self::Bandit)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Enemy => "enemy",
            Self::Bandit => "bandit",
            Self::Alliance => "alliance",
        }
    }
}

/// Relationship band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// Ally
    Ally,
    /// Friend
    Friend,
    /// Neutral
    #[default]
    Neutral,
    /// Enemy
    Enemy,
    /// Hostile
    Hostile,
}

impl Relationship {
    /// Band for a value under the given thresholds.
    #[must_use]
    pub const fn from_value(value: i32, thresholds: &RelationshipThresholds) -> Self {
        if value >= thresholds.ally {
            Self::Ally
        } else if value >= thresholds.friend {
            Self::Friend
        } else if value >= thresholds.neutral {
            Self::Neutral
        } else if value >= thresholds.enemy {
            Self::Enemy
        } else {
            Self::Hostile
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ally => "ally",
            Self::Friend => "friend",
            Self::Neutral => "neutral",
            Self::Enemy => "enemy",
            Self::Hostile => "hostile",
        }
    }
}

/// A relationship value with its band kept in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipTracker {
    value: i32,
    band: Relationship,
    thresholds: RelationshipThresholds,
}

impl Default for RelationshipTracker {
    fn default() -> Self {
        Self::new(RelationshipThresholds::STANDARD)
    }
}

impl RelationshipTracker {
    /// Starts at zero (neutral).
    #[must_use]
    pub const fn new(thresholds: RelationshipThresholds) -> Self {
        Self {
            value: 0,
            band: Relationship::from_value(0, &thresholds),
            thresholds,
        }
    }

    /// Current value in `[-100, 100]`.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// Current band.
    #[must_use]
    pub const fn band(&self) -> Relationship {
        self.band
    }

    /// Thresholds in use.
    #[must_use]
    pub const fn thresholds(&self) -> &RelationshipThresholds {
        &self.thresholds
    }

    /// Adds a delta, clamps, and re-bands.
    pub fn modify(&mut self, delta: i32) {
        self.set(self.value.saturating_add(delta));
    }

    /// Sets the value directly, clamps, and re-bands.
    pub fn set(&mut self, value: i32) {
        self.value = value.clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX);
        self.band = Relationship::from_value(self.value, &self.thresholds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        let t = RelationshipThresholds::STANDARD;
        assert_eq!(Relationship::from_value(80, &t), Relationship::Ally);
        assert_eq!(Relationship::from_value(79, &t), Relationship::Friend);
        assert_eq!(Relationship::from_value(50, &t), Relationship::Friend);
        assert_eq!(Relationship::from_value(49, &t), Relationship::Neutral);
        assert_eq!(Relationship::from_value(-50, &t), Relationship::Neutral);
        assert_eq!(Relationship::from_value(-51, &t), Relationship::Enemy);
        assert_eq!(Relationship::from_value(-80, &t), Relationship::Enemy);
        assert_eq!(Relationship::from_value(-81, &t), Relationship::Hostile);
    }

    #[test]
    fn test_tracker_clamps() {
        let mut tracker = RelationshipTracker::default();
        tracker.modify(250);
        assert_eq!(tracker.value(), 100);
        assert_eq!(tracker.band(), Relationship::Ally);

        tracker.modify(-1000);
        assert_eq!(tracker.value(), -100);
        assert_eq!(tracker.band(), Relationship::Hostile);
    }

    #[test]
    fn test_custom_thresholds() {
        let touchy = RelationshipThresholds {
            ally: 95,
            friend: 70,
            neutral: -10,
            enemy: -40,
        };
        let mut tracker = RelationshipTracker::new(touchy);
        tracker.modify(-20);
        assert_eq!(tracker.band(), Relationship::Enemy);
    }

    #[test]
    fn test_hostile_factions() {
        assert!(Faction::Bandit.is_hostile());
        assert!(Faction::Enemy.is_hostile());
        assert!(!Faction::Neutral.is_hostile());
        assert!(!Faction::Alliance.is_hostile());
    }
}
