//! Weapon data, durability, and the weapon catalog.
//!
//! This module provides:
//! - Weapon categories, damage types, and the `Weapon` value type
//! - Durability-scaled effective damage
//! - A catalog of named weapons that hands out owned copies
//! - Loading additional catalog entries from TOML

use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use ironvale_common::SchemaVersion;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::skills::SkillType;

/// Default maximum durability for new weapons.
pub const DEFAULT_DURABILITY: u32 = 100;

/// Default reach of a weapon that does not specify one.
pub const DEFAULT_RANGE: f32 = 50.0;

/// Fraction of base damage a weapon keeps at zero durability.
pub const BROKEN_DAMAGE_FLOOR: f32 = 0.5;

/// Errors that can occur during weapon catalog loading.
#[derive(Debug, Error)]
pub enum WeaponLoadError {
    /// File not found.
    #[error("Weapon file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read file.
    #[error("Failed to read weapon file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse weapon TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error.
    #[error("Weapon validation error for '{key}': {reason}")]
    ValidationError {
        /// Catalog key of the offending weapon
        key: String,
        /// What was wrong
        reason: String,
    },

    /// Duplicate catalog key.
    #[error("Duplicate weapon key: {0}")]
    DuplicateKey(String),

    /// File written for an incompatible catalog layout.
    #[error("Unsupported weapon file version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version this build reads
        expected: SchemaVersion,
        /// Version declared by the file
        found: SchemaVersion,
    },
}

/// Result type for weapon loading operations.
pub type WeaponLoadResult<T> = Result<T, WeaponLoadError>;

/// Weapon category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    /// One-handed sword
    Sword,
    /// Axe
    Axe,
    /// Mace
    Mace,
    /// Spear
    Spear,
    /// Bow
    Bow,
    /// Crossbow
    Crossbow,
    /// Dagger
    Dagger,
    /// Two-handed sword
    Greatsword,
}

impl WeaponType {
    /// Returns true if this is a ranged weapon.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(self, Self::Bow | Self::Crossbow)
    }

    /// Returns the proficiency skill that governs this weapon.
    #[must_use]
    pub const fn skill(self) -> SkillType {
        match self {
            Self::Sword | Self::Axe | Self::Mace | Self::Dagger => SkillType::OneHanded,
            Self::Greatsword => SkillType::TwoHanded,
            Self::Spear => SkillType::Polearm,
            Self::Bow | Self::Crossbow => SkillType::Archery,
        }
    }
}

/// Kind of damage a weapon deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Edged
    #[default]
    Slash,
    /// Pointed
    Pierce,
    /// Crushing
    Blunt,
}

/// A single weapon instance. Catalog lookups return independent copies, so
/// wear on one instance never leaks into another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Display name
    pub name: String,
    /// Category
    pub weapon_type: WeaponType,
    /// Base damage at full durability
    pub damage: i32,
    /// Damage type
    pub damage_type: DamageType,
    /// Attacks per second
    pub attack_rate: f32,
    /// Reach in world units
    pub range: f32,
    /// Usable while mounted
    pub can_mounted: bool,
    /// Current durability
    durability: u32,
    /// Maximum durability
    max_durability: u32,
}

impl Weapon {
    /// Creates a weapon at full durability with default rate and range.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        weapon_type: WeaponType,
        damage: i32,
        damage_type: DamageType,
    ) -> Self {
        Self {
            name: name.into(),
            weapon_type,
            damage,
            damage_type,
            attack_rate: 1.0,
            range: DEFAULT_RANGE,
            can_mounted: false,
            durability: DEFAULT_DURABILITY,
            max_durability: DEFAULT_DURABILITY,
        }
    }

    /// Sets the attack rate (attacks per second).
    #[must_use]
    pub fn with_attack_rate(mut self, rate: f32) -> Self {
        self.attack_rate = rate;
        self
    }

    /// Sets the reach.
    #[must_use]
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    /// Marks the weapon as usable while mounted.
    #[must_use]
    pub fn mounted(mut self) -> Self {
        self.can_mounted = true;
        self
    }

    /// Sets maximum durability and refills to it.
    #[must_use]
    pub fn with_max_durability(mut self, max: u32) -> Self {
        self.max_durability = max;
        self.durability = max;
        self
    }

    /// Returns current durability.
    #[must_use]
    pub const fn durability(&self) -> u32 {
        self.durability
    }

    /// Returns maximum durability.
    #[must_use]
    pub const fn max_durability(&self) -> u32 {
        self.max_durability
    }

    /// Returns durability as a fraction in `[0, 1]`.
    #[must_use]
    pub fn durability_ratio(&self) -> f32 {
        if self.max_durability == 0 {
            return 0.0;
        }
        (self.durability as f32 / self.max_durability as f32).clamp(0.0, 1.0)
    }

    /// Damage scaled by wear: `trunc(damage * (0.5 + 0.5 * ratio))`.
    #[must_use]
    pub fn effective_damage(&self) -> i32 {
        let scale = BROKEN_DAMAGE_FLOOR + (1.0 - BROKEN_DAMAGE_FLOOR) * self.durability_ratio();
        (self.damage as f32 * scale) as i32
    }

    /// Seconds between attacks at this weapon's rate, if the rate is usable.
    #[must_use]
    pub fn attack_interval(&self) -> Option<f64> {
        (self.attack_rate > 0.0).then(|| 1.0 / f64::from(self.attack_rate))
    }

    /// Wears the weapon down by one use. Never goes below zero.
    pub fn use_once(&mut self) {
        self.wear(1);
    }

    /// Wears the weapon down by `amount`.
    pub fn wear(&mut self, amount: u32) {
        self.durability = self.durability.saturating_sub(amount);
    }

    /// Restores durability, capped at the maximum.
    pub fn repair(&mut self, amount: u32) {
        self.durability = self.durability.saturating_add(amount).min(self.max_durability);
    }

    /// True once durability has reached zero.
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.durability == 0
    }
}

/// One catalog entry as written in a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponDefinition {
    /// Display name
    pub name: String,
    /// Category
    pub weapon_type: WeaponType,
    /// Base damage
    pub damage: i32,
    /// Damage type
    #[serde(default)]
    pub damage_type: DamageType,
    /// Attacks per second
    #[serde(default = "default_attack_rate")]
    pub attack_rate: f32,
    /// Reach
    #[serde(default = "default_range")]
    pub range: f32,
    /// Usable while mounted
    #[serde(default)]
    pub can_mounted: bool,
    /// Maximum durability
    #[serde(default = "default_durability")]
    pub max_durability: u32,
}

const fn default_attack_rate() -> f32 {
    1.0
}

const fn default_range() -> f32 {
    DEFAULT_RANGE
}

const fn default_durability() -> u32 {
    DEFAULT_DURABILITY
}

impl WeaponDefinition {
    /// Checks the definition for values the combat math cannot use.
    pub fn validate(&self, key: &str) -> WeaponLoadResult<()> {
        let fail = |reason: &str| -> WeaponLoadResult<()> {
            Err(WeaponLoadError::ValidationError {
                key: key.to_string(),
                reason: reason.to_string(),
            })
        };
        if self.name.trim().is_empty() {
            return fail("name is empty");
        }
        if self.damage <= 0 {
            return fail("damage must be positive");
        }
        if self.attack_rate.is_nan() || self.attack_rate <= 0.0 {
            return fail("attack_rate must be positive");
        }
        if self.range.is_nan() || self.range <= 0.0 {
            return fail("range must be positive");
        }
        if self.max_durability == 0 {
            return fail("max_durability must be positive");
        }
        Ok(())
    }

    /// Builds a fresh weapon instance from this definition.
    #[must_use]
    pub fn instantiate(&self) -> Weapon {
        let mut weapon = Weapon::new(
            self.name.clone(),
            self.weapon_type,
            self.damage,
            self.damage_type,
        )
        .with_attack_rate(self.attack_rate)
        .with_range(self.range)
        .with_max_durability(self.max_durability);
        weapon.can_mounted = self.can_mounted;
        weapon
    }
}

/// Top-level layout of a weapon catalog file.
#[derive(Debug, Deserialize)]
struct WeaponFile {
    #[serde(default)]
    version: Option<SchemaVersion>,
    #[serde(default)]
    weapons: std::collections::BTreeMap<String, WeaponDefinition>,
}

/// Named weapon templates. `get` always returns an owned copy.
#[derive(Debug, Clone, Default)]
pub struct WeaponCatalog {
    entries: AHashMap<String, Weapon>,
}

impl WeaponCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the standard weapon set.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        let standard = [
            (
                "iron_sword",
                Weapon::new("Iron Sword", WeaponType::Sword, 15, DamageType::Slash)
                    .with_attack_rate(1.2)
                    .with_range(60.0),
            ),
            (
                "longbow",
                Weapon::new("Longbow", WeaponType::Bow, 20, DamageType::Pierce)
                    .with_attack_rate(0.8)
                    .with_range(200.0),
            ),
            (
                "spear",
                Weapon::new("Spear", WeaponType::Spear, 18, DamageType::Pierce)
                    .with_attack_rate(1.0)
                    .with_range(120.0)
                    .mounted(),
            ),
            (
                "axe",
                Weapon::new("War Axe", WeaponType::Axe, 22, DamageType::Slash)
                    .with_attack_rate(0.9)
                    .with_range(55.0),
            ),
            (
                "dagger",
                Weapon::new("Dagger", WeaponType::Dagger, 12, DamageType::Pierce)
                    .with_attack_rate(1.5)
                    .with_range(40.0),
            ),
        ];
        for (key, weapon) in standard {
            catalog.entries.insert(key.to_string(), weapon);
        }
        catalog
    }

    /// Returns a copy of the named weapon.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Weapon> {
        self.entries.get(key).cloned()
    }

    /// Returns true if the key exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Catalog keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Adds a weapon under a new key.
    pub fn insert(&mut self, key: impl Into<String>, weapon: Weapon) -> WeaponLoadResult<()> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(WeaponLoadError::DuplicateKey(key));
        }
        self.entries.insert(key, weapon);
        Ok(())
    }

    /// Parses `[weapons.<key>]` tables and merges them into the catalog.
    /// Nothing is merged unless every entry validates.
    pub fn load_str(&mut self, contents: &str) -> WeaponLoadResult<usize> {
        let file: WeaponFile = toml::from_str(contents)?;
        if let Some(found) = file.version {
            let expected = SchemaVersion::WEAPON_CATALOG;
            if !expected.is_compatible_with(&found) {
                return Err(WeaponLoadError::UnsupportedVersion { expected, found });
            }
        }
        for (key, definition) in &file.weapons {
            definition.validate(key)?;
            if self.entries.contains_key(key) {
                return Err(WeaponLoadError::DuplicateKey(key.clone()));
            }
        }

        let count = file.weapons.len();
        for (key, definition) in file.weapons {
            debug!(weapon = %key, "Registered weapon");
            self.entries.insert(key, definition.instantiate());
        }
        Ok(count)
    }

    /// Loads catalog entries from a TOML file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> WeaponLoadResult<usize> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WeaponLoadError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let count = self.load_str(&contents)?;
        info!("Loaded {count} weapons from {}", path.display());
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    #[test]
    fn test_effective_damage_full_and_broken() {
        let mut sword = WeaponCatalog::builtin().get("iron_sword").expect("sword");
        assert_eq!(sword.effective_damage(), 15);

        sword.wear(DEFAULT_DURABILITY);
        assert!(sword.is_broken());
        // trunc(15 * 0.5)
        assert_eq!(sword.effective_damage(), 7);
    }

    #[test]
    fn test_use_never_goes_negative() {
        let mut dagger = Weapon::new("Dagger", WeaponType::Dagger, 12, DamageType::Pierce)
            .with_max_durability(2);
        dagger.use_once();
        dagger.use_once();
        dagger.use_once();
        assert_eq!(dagger.durability(), 0);
    }

    #[test]
    fn test_repair_caps_at_max() {
        let mut axe = WeaponCatalog::builtin().get("axe").expect("axe");
        axe.wear(30);
        axe.repair(10);
        assert_eq!(axe.durability(), 80);
        axe.repair(500);
        assert_eq!(axe.durability(), axe.max_durability());
    }

    #[test]
    fn test_catalog_returns_copies() {
        let catalog = WeaponCatalog::builtin();
        let mut first = catalog.get("spear").expect("spear");
        first.wear(40);

        let second = catalog.get("spear").expect("spear");
        assert_eq!(second.durability(), DEFAULT_DURABILITY);
        assert!(second.can_mounted);
    }

    #[test]
    fn test_builtin_contents() {
        let catalog = WeaponCatalog::builtin();
        assert_eq!(catalog.keys(), vec!["axe", "dagger", "iron_sword", "longbow", "spear"]);

        let bow = catalog.get("longbow").expect("longbow");
        assert!(bow.weapon_type.is_ranged());
        assert_eq!(bow.range, 200.0);
        assert!(catalog.get("excalibur").is_none());
    }

    #[test]
    fn test_weapon_skill_mapping() {
        assert_eq!(WeaponType::Mace.skill(), SkillType::OneHanded);
        assert_eq!(WeaponType::Greatsword.skill(), SkillType::TwoHanded);
        assert_eq!(WeaponType::Spear.skill(), SkillType::Polearm);
        assert_eq!(WeaponType::Crossbow.skill(), SkillType::Archery);
    }

    #[test]
    fn test_attack_interval() {
        let dagger = WeaponCatalog::builtin().get("dagger").expect("dagger");
        let interval = dagger.attack_interval().expect("positive rate");
        assert!((interval - 1.0 / 1.5).abs() < 1e-6);

        let stalled = dagger.with_attack_rate(0.0);
        assert!(stalled.attack_interval().is_none());
    }

    #[test]
    fn test_load_str_merges_entries() {
        let mut catalog = WeaponCatalog::builtin();
        let count = catalog
            .load_str(
                r#"
                [weapons.warhammer]
                name = "Warhammer"
                weapon_type = "mace"
                damage = 26
                damage_type = "blunt"
                attack_rate = 0.7

                [weapons.claymore]
                name = "Claymore"
                weapon_type = "greatsword"
                damage = 30
                range = 70.0
                "#,
            )
            .expect("valid catalog");
        assert_eq!(count, 2);
        assert_eq!(catalog.len(), 7);

        let claymore = catalog.get("claymore").expect("claymore");
        assert_eq!(claymore.damage_type, DamageType::Slash);
        assert_eq!(claymore.attack_rate, 1.0);
    }

    #[test]
    fn test_load_str_rejects_invalid_entry() {
        let mut catalog = WeaponCatalog::new();
        let result = catalog.load_str(
            r#"
            [weapons.twig]
            name = "Twig"
            weapon_type = "dagger"
            damage = 0
            "#,
        );
        assert!(matches!(result, Err(WeaponLoadError::ValidationError { .. })));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_str_rejects_duplicate() {
        let mut catalog = WeaponCatalog::builtin();
        let result = catalog.load_str(
            r#"
            [weapons.axe]
            name = "Another Axe"
            weapon_type = "axe"
            damage = 20
            "#,
        );
        assert!(matches!(result, Err(WeaponLoadError::DuplicateKey(key)) if key == "axe"));
    }

    #[test]
    fn test_catalog_version_checked() {
        let mut catalog = WeaponCatalog::new();
        let current = catalog.load_str(
            r#"
            version = { major = 1, minor = 0, patch = 0 }

            [weapons.club]
            name = "Club"
            weapon_type = "mace"
            damage = 9
            "#,
        );
        assert_eq!(current.expect("current version loads"), 1);

        let future = catalog.load_str(
            r#"
            version = { major = 2, minor = 0, patch = 0 }

            [weapons.halberd]
            name = "Halberd"
            weapon_type = "spear"
            damage = 25
            "#,
        );
        assert!(matches!(
            future,
            Err(WeaponLoadError::UnsupportedVersion { found, .. }) if found.major == 2
        ));
        assert!(!catalog.contains("halberd"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[weapons.sling]\nname = \"Sling\"\nweapon_type = \"bow\"\ndamage = 6\nrange = 150.0"
        )
        .expect("write");

        let mut catalog = WeaponCatalog::new();
        assert_eq!(catalog.load_file(file.path()).expect("load"), 1);
        assert!(catalog.contains("sling"));

        let missing = catalog.load_file("/nonexistent/weapons.toml");
        assert!(matches!(missing, Err(WeaponLoadError::NotFound(_))));
    }

    proptest! {
        #[test]
        fn effective_damage_monotonic_in_durability(
            damage in 1i32..500,
            max in 1u32..1000,
            a in 0u32..1000,
            b in 0u32..1000,
        ) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let base = Weapon::new("Test", WeaponType::Sword, damage, DamageType::Slash)
                .with_max_durability(max);

            let mut worn = base.clone();
            worn.wear(max.saturating_sub(low.min(max)));
            let mut fresh = base.clone();
            fresh.wear(max.saturating_sub(high.min(max)));

            prop_assert!(worn.effective_damage() <= fresh.effective_damage());
            prop_assert!(worn.effective_damage() >= (damage as f32 * 0.5) as i32);
        }
    }
}
