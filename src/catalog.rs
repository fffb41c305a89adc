//! Tower catalog: base stats, prices and upgrade tiers
//!
//! Loaded from JSON. Upgrade stat keys are resolved into typed
//! [`StatEffect`]s at load time; an unknown key rejects the whole file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::settings::Difficulty;
use crate::sim::tower::{FirePattern, UpgradePath};

const BUILTIN_CATALOG: &str = include_str!("../data/towers.json");

/// Static data failed to load or validate
#[derive(Debug, Error)]
pub enum DataError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("path needs at least 2 waypoints, got {0}")]
    PathTooShort(usize),
    #[error("path contains a non-finite point")]
    NonFinitePoint,
    #[error("{tower}: {path} has {count} tiers, at most 5 allowed")]
    TooManyTiers {
        tower: String,
        path: &'static str,
        count: usize,
    },
    #[error("{tower}: {reason}")]
    InvalidStats { tower: String, reason: &'static str },
}

/// One resolved stat change from an upgrade tier
#[derive(Debug, Clone, PartialEq)]
pub enum StatEffect {
    Damage(i32),
    Range(f32),
    FireRate(f32),
    Pierce(i32),
    ProjectileSpeed(f32),
    /// Replaces the volley size
    Projectiles(u32),
    /// Replaces the blast radius
    ExplosionRadius(f32),
    /// Replaces the slow strength
    SlowEffect(f32),
    SeeCamo,
    PopLead,
    Seeking,
    Special(String),
}

/// Raw `stats` object of an upgrade tier
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStats {
    damage: Option<i32>,
    range: Option<f32>,
    fire_rate: Option<f32>,
    pierce: Option<i32>,
    projectile_speed: Option<f32>,
    projectiles: Option<u32>,
    explosion_radius: Option<f32>,
    slow_effect: Option<f32>,
    can_see_camo: Option<bool>,
    can_pop_lead: Option<bool>,
    has_seeking: Option<bool>,
    #[serde(default)]
    special_effects: Vec<String>,
}

impl RawStats {
    fn into_effects(self) -> Vec<StatEffect> {
        let mut effects = Vec::new();
        effects.extend(self.damage.map(StatEffect::Damage));
        effects.extend(self.range.map(StatEffect::Range));
        effects.extend(self.fire_rate.map(StatEffect::FireRate));
        effects.extend(self.pierce.map(StatEffect::Pierce));
        effects.extend(self.projectile_speed.map(StatEffect::ProjectileSpeed));
        effects.extend(self.projectiles.map(StatEffect::Projectiles));
        effects.extend(self.explosion_radius.map(StatEffect::ExplosionRadius));
        effects.extend(self.slow_effect.map(StatEffect::SlowEffect));
        if self.can_see_camo == Some(true) {
            effects.push(StatEffect::SeeCamo);
        }
        if self.can_pop_lead == Some(true) {
            effects.push(StatEffect::PopLead);
        }
        if self.has_seeking == Some(true) {
            effects.push(StatEffect::Seeking);
        }
        effects.extend(self.special_effects.into_iter().map(StatEffect::Special));
        effects
    }
}

#[derive(Debug, Deserialize)]
struct RawUpgrade {
    name: String,
    #[serde(default)]
    description: String,
    cost: u32,
    #[serde(default)]
    stats: RawStats,
}

/// One purchasable tier
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawUpgrade")]
pub struct Upgrade {
    pub name: String,
    pub description: String,
    /// Base price before the difficulty multiplier
    pub cost: u32,
    pub effects: Vec<StatEffect>,
}

impl From<RawUpgrade> for Upgrade {
    fn from(raw: RawUpgrade) -> Self {
        Self {
            name: raw.name,
            description: raw.description,
            cost: raw.cost,
            effects: raw.stats.into_effects(),
        }
    }
}

/// A named path of up to five tiers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpgradePathDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub upgrades: Vec<Upgrade>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpgradePaths {
    #[serde(default)]
    pub path1: UpgradePathDef,
    #[serde(default)]
    pub path2: UpgradePathDef,
    #[serde(default)]
    pub path3: UpgradePathDef,
}

impl UpgradePaths {
    pub fn get(&self, path: UpgradePath) -> &UpgradePathDef {
        match path {
            UpgradePath::Path1 => &self.path1,
            UpgradePath::Path2 => &self.path2,
            UpgradePath::Path3 => &self.path3,
        }
    }
}

fn default_count() -> u32 {
    1
}

fn default_projectile_speed() -> f32 {
    DEFAULT_PROJECTILE_SPEED
}

/// Stats a freshly placed tower starts with
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BaseStats {
    pub range: f32,
    pub damage: i32,
    /// Shots per second
    pub fire_rate: f32,
    #[serde(default = "default_count")]
    pub pierce: u32,
    #[serde(default = "default_count")]
    pub projectiles: u32,
    #[serde(default = "default_projectile_speed")]
    pub projectile_speed: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TowerDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_cost: u32,
    /// RGB, presentation only
    #[serde(default)]
    pub icon_color: [u8; 3],
    #[serde(default)]
    pub pattern: FirePattern,
    pub base_stats: BaseStats,
    #[serde(default)]
    pub upgrade_paths: UpgradePaths,
}

impl TowerDefinition {
    fn validate(&self, id: &str) -> Result<(), DataError> {
        let stats = &self.base_stats;
        if !(stats.range.is_finite() && stats.range >= 0.0) {
            return Err(DataError::InvalidStats {
                tower: id.to_string(),
                reason: "range must be finite and non-negative",
            });
        }
        if !(stats.fire_rate.is_finite() && stats.fire_rate > 0.0) {
            return Err(DataError::InvalidStats {
                tower: id.to_string(),
                reason: "fire_rate must be positive",
            });
        }
        for path in UpgradePath::ALL {
            let count = self.upgrade_paths.get(path).upgrades.len();
            if count > MAX_UPGRADE_LEVEL as usize {
                return Err(DataError::TooManyTiers {
                    tower: id.to_string(),
                    path: path.as_str(),
                    count,
                });
            }
        }
        Ok(())
    }
}

/// Upgrade price scaling per difficulty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyMultipliers {
    #[serde(rename = "E")]
    pub easy: f32,
    #[serde(rename = "M")]
    pub medium: f32,
    #[serde(rename = "H")]
    pub hard: f32,
    #[serde(rename = "I")]
    pub impoppable: f32,
}

impl Default for DifficultyMultipliers {
    fn default() -> Self {
        Self {
            easy: 1.0,
            medium: 1.2,
            hard: 1.5,
            impoppable: 2.0,
        }
    }
}

impl DifficultyMultipliers {
    pub fn get(&self, difficulty: Difficulty) -> f32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Impoppable => self.impoppable,
        }
    }
}

/// Every tower type the game knows about, keyed by type id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TowerCatalog {
    #[serde(default)]
    towers: BTreeMap<String, TowerDefinition>,
    #[serde(default)]
    difficulty_multipliers: DifficultyMultipliers,
}

impl TowerCatalog {
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let catalog: TowerCatalog = serde_json::from_str(json)?;
        for (id, def) in &catalog.towers {
            def.validate(id)?;
        }
        Ok(catalog)
    }

    /// The catalog compiled into the binary
    pub fn builtin() -> Self {
        match Self::from_json(BUILTIN_CATALOG) {
            Ok(catalog) => catalog,
            Err(e) => {
                log::warn!("Built-in tower catalog invalid ({}), no towers available", e);
                Self::default()
            }
        }
    }

    /// Load a catalog file, falling back to the built-in catalog on any failure
    pub fn load_or_default(file: impl AsRef<std::path::Path>) -> Self {
        let file = file.as_ref();
        let result = std::fs::read_to_string(file)
            .map_err(DataError::from)
            .and_then(|json| Self::from_json(&json));
        match result {
            Ok(catalog) => {
                log::info!("Loaded {} tower types from {}", catalog.len(), file.display());
                catalog
            }
            Err(e) => {
                log::warn!("Catalog {} unavailable ({}), using built-in", file.display(), e);
                Self::builtin()
            }
        }
    }

    pub fn get(&self, tower_type: &str) -> Option<&TowerDefinition> {
        self.towers.get(tower_type)
    }

    /// Type ids in sorted order
    pub fn tower_types(&self) -> impl Iterator<Item = &str> {
        self.towers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.towers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.towers.is_empty()
    }

    pub fn base_cost(&self, tower_type: &str) -> Option<u32> {
        self.get(tower_type).map(|d| d.base_cost)
    }

    pub fn multipliers(&self) -> &DifficultyMultipliers {
        &self.difficulty_multipliers
    }

    /// Tier data for buying `path` when the tower currently sits at `level`
    pub fn upgrade_tier(&self, tower_type: &str, path: UpgradePath, level: u8) -> Option<&Upgrade> {
        self.get(tower_type)?
            .upgrade_paths
            .get(path)
            .upgrades
            .get(usize::from(level))
    }

    /// Price of the next tier after the difficulty multiplier, 0 if none exists
    pub fn upgrade_cost(
        &self,
        tower_type: &str,
        path: UpgradePath,
        level: u8,
        difficulty: Difficulty,
    ) -> u32 {
        let Some(tier) = self.upgrade_tier(tower_type, path, level) else {
            return 0;
        };
        let mult = f64::from(self.difficulty_multipliers.get(difficulty));
        let cost = (f64::from(tier.cost) * mult).floor();
        if cost.is_finite() && cost > 0.0 {
            cost.min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }
}
