//! Skill proficiencies.
//!
//! Skills level from 0 to 100. Reaching level `n + 1` from level `n` costs
//! `(n + 1) * 100` experience; leftover experience carries over.

use serde::{Deserialize, Serialize};

/// Highest attainable skill level.
pub const MAX_SKILL_LEVEL: u32 = 100;

/// Experience per level step (multiplied by the next level).
pub const EXPERIENCE_PER_LEVEL: u32 = 100;

/// Skill kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    /// One-handed weapons
    OneHanded,
    /// Two-handed weapons
    TwoHanded,
    /// Bows and crossbows
    Archery,
    /// Spears
    Polearm,
    /// Mounted movement
    Riding,
    /// Shield blocking
    Shield,
    /// Bartering
    Trading,
    /// Leading followers
    Leadership,
    /// Siege and construction
    Engineering,
    /// Healing
    Medicine,
    /// Item making
    Crafting,
}

impl SkillType {
    /// Every skill kind.
    pub const ALL: [Self; 11] = [
        Self::OneHanded,
        Self::TwoHanded,
        Self::Archery,
        Self::Polearm,
        Self::Riding,
        Self::Shield,
        Self::Trading,
        Self::Leadership,
        Self::Engineering,
        Self::Medicine,
        Self::Crafting,
    ];

    /// True for skills that feed into combat resolution.
    #[must_use]
    pub const fn is_combat(self) -> bool {
        matches!(
            self,
            Self::OneHanded
                | Self::TwoHanded
                | Self::Archery
                | Self::Polearm
                | Self::Riding
                | Self::Shield
        )
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// A single skill's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Skill {
    /// Level in `[0, 100]`
    pub level: u32,
    /// Experience toward the next level
    pub experience: u32,
}

impl Skill {
    /// Creates a skill at the given level.
    #[must_use]
    pub fn at_level(level: u32) -> Self {
        Self {
            level: level.min(MAX_SKILL_LEVEL),
            experience: 0,
        }
    }

    /// Experience needed to go from the current level to the next.
    #[must_use]
    pub const fn experience_to_next(&self) -> u32 {
        (self.level + 1) * EXPERIENCE_PER_LEVEL
    }

    /// Adds experience, leveling up as many times as it pays for.
    /// Returns the number of levels gained.
    pub fn add_experience(&mut self, amount: u32) -> u32 {
        self.experience = self.experience.saturating_add(amount);
        let start = self.level;
        while self.level < MAX_SKILL_LEVEL && self.experience >= self.experience_to_next() {
            self.experience -= self.experience_to_next();
            self.level += 1;
        }
        self.level - start
    }

    /// Effectiveness in `[0, 1]`.
    #[must_use]
    pub fn effectiveness(&self) -> f32 {
        self.level.min(MAX_SKILL_LEVEL) as f32 / MAX_SKILL_LEVEL as f32
    }
}

/// One skill slot per `SkillType`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillSet {
    skills: [Skill; 11],
}

impl SkillSet {
    /// All skills at level 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a skill's level (builder form).
    #[must_use]
    pub fn with_level(mut self, skill: SkillType, level: u32) -> Self {
        self.skills[skill.index()] = Skill::at_level(level);
        self
    }

    /// Returns one skill.
    #[must_use]
    pub fn get(&self, skill: SkillType) -> Skill {
        self.skills[skill.index()]
    }

    /// Returns one skill's effectiveness in `[0, 1]`.
    #[must_use]
    pub fn effectiveness(&self, skill: SkillType) -> f32 {
        self.get(skill).effectiveness()
    }

    /// Adds experience to one skill. Returns levels gained.
    pub fn add_experience(&mut self, skill: SkillType, amount: u32) -> u32 {
        self.skills[skill.index()].add_experience(amount)
    }

    /// Sum of all skill levels.
    #[must_use]
    pub fn total_levels(&self) -> u32 {
        self.skills.iter().map(|skill| skill.level).sum()
    }
}
