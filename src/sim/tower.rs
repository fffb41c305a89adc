//! Towers: stationary shooters with targeting modes and three upgrade paths

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bloon::{Bloon, BloonId};
use super::projectile::{Projectile, ProjectileStats};
use crate::catalog::{StatEffect, TowerDefinition, Upgrade};
use crate::consts::*;
use crate::{angle_between, direction_from_angle};

/// Stable tower identity, unique within a game session
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TowerId(pub u32);

/// How a tower picks among bloons in range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetingMode {
    /// Furthest along the path
    #[default]
    First,
    /// Least far along the path
    Last,
    /// Nearest to the tower
    Close,
    /// Most health remaining
    Strong,
}

impl TargetingMode {
    /// First -> Last -> Close -> Strong -> First
    pub fn next(&self) -> Self {
        match self {
            TargetingMode::First => TargetingMode::Last,
            TargetingMode::Last => TargetingMode::Close,
            TargetingMode::Close => TargetingMode::Strong,
            TargetingMode::Strong => TargetingMode::First,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetingMode::First => "First",
            TargetingMode::Last => "Last",
            TargetingMode::Close => "Close",
            TargetingMode::Strong => "Strong",
        }
    }
}

/// Projectile emission pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirePattern {
    /// `projectiles` shots fanned around the target direction
    #[default]
    Aimed,
    /// Fixed ring of shots in every direction, ignoring where the target is
    Burst,
}

/// One of the three independent upgrade paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradePath {
    #[serde(rename = "path1")]
    Path1,
    #[serde(rename = "path2")]
    Path2,
    #[serde(rename = "path3")]
    Path3,
}

impl UpgradePath {
    pub const ALL: [UpgradePath; UPGRADE_PATH_COUNT] =
        [UpgradePath::Path1, UpgradePath::Path2, UpgradePath::Path3];

    #[inline]
    pub fn index(&self) -> usize {
        match self {
            UpgradePath::Path1 => 0,
            UpgradePath::Path2 => 1,
            UpgradePath::Path3 => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradePath::Path1 => "path1",
            UpgradePath::Path2 => "path2",
            UpgradePath::Path3 => "path3",
        }
    }
}

/// Why an upgrade path is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeBlocked {
    /// Path is already at tier 5
    MaxLevel,
    /// Another path is past tier 2, so this one stops at 2
    CrossPathCap,
    /// No tier data (or a zero cost) for the next level
    Unavailable,
    /// Not enough money for the next tier
    CannotAfford { cost: u32 },
}

/// A tower entity
#[derive(Debug, Clone)]
pub struct Tower {
    pub id: TowerId,
    /// Catalog key, e.g. "dart_monkey"
    pub tower_type: String,
    pub position: Vec2,
    pub range: f32,
    pub damage: i32,
    /// Shots per second
    pub fire_rate: f32,
    /// None until the first shot, so a fresh tower fires immediately
    pub last_shot_ms: Option<u64>,
    /// Lookup-only reference into the live bloon collection
    pub target: Option<BloonId>,
    pub pattern: FirePattern,
    pub targeting_mode: TargetingMode,
    pub pierce: u32,
    /// Shots per volley for the aimed pattern
    pub projectiles: u32,
    pub projectile_speed: f32,
    pub can_see_camo: bool,
    pub can_pop_lead: bool,
    pub has_seeking: bool,
    pub explosion_radius: f32,
    pub slow_effect: f32,
    pub special_effects: Vec<String>,
    pub upgrade_levels: [u8; UPGRADE_PATH_COUNT],
    /// Paths in the order they were upgraded
    pub upgrade_history: Vec<UpgradePath>,
    pub base_cost: u32,
    /// Base cost plus every upgrade paid for
    pub total_spent: u32,
    /// UI selection, drives range-circle visibility
    pub selected: bool,
}

impl Tower {
    /// A tower with the generic dart stats (range 100, 1 damage, 1 shot/s)
    pub fn new(position: Vec2, tower_type: &str) -> Self {
        Self {
            id: TowerId::default(),
            tower_type: tower_type.to_string(),
            position,
            range: 100.0,
            damage: 1,
            fire_rate: 1.0,
            last_shot_ms: None,
            target: None,
            pattern: FirePattern::Aimed,
            targeting_mode: TargetingMode::First,
            pierce: 1,
            projectiles: 1,
            projectile_speed: DEFAULT_PROJECTILE_SPEED,
            can_see_camo: false,
            can_pop_lead: false,
            has_seeking: false,
            explosion_radius: 0.0,
            slow_effect: 0.0,
            special_effects: Vec::new(),
            upgrade_levels: [0; UPGRADE_PATH_COUNT],
            upgrade_history: Vec::new(),
            base_cost: 0,
            total_spent: 0,
            selected: false,
        }
    }

    /// A tower built from catalog data, with its base cost recorded
    pub fn from_definition(position: Vec2, tower_type: &str, def: &TowerDefinition) -> Self {
        let stats = &def.base_stats;
        let mut tower = Self::new(position, tower_type);
        tower.range = stats.range;
        tower.damage = stats.damage;
        tower.fire_rate = stats.fire_rate;
        tower.pierce = stats.pierce.max(1);
        tower.projectiles = stats.projectiles.max(1);
        tower.projectile_speed = stats.projectile_speed;
        tower.pattern = def.pattern;
        tower.set_base_cost(def.base_cost);
        tower
    }

    pub fn set_base_cost(&mut self, cost: u32) {
        self.base_cost = cost;
        self.total_spent = cost;
    }

    /// 70% of everything spent on this tower, rounded down
    pub fn sell_price(&self) -> u32 {
        (u64::from(self.total_spent) * SELL_RATIO_NUM / SELL_RATIO_DEN) as u32
    }

    /// Whether `point` lands on the tower body
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) <= TOWER_RADIUS * TOWER_RADIUS
    }

    pub fn cycle_targeting_mode(&mut self) -> TargetingMode {
        self.targeting_mode = self.targeting_mode.next();
        self.targeting_mode
    }

    /// Camo needs camo detection, lead needs lead popping
    pub fn can_target_bloon(&self, bloon: &Bloon) -> bool {
        (!bloon.camo || self.can_see_camo) && (!bloon.lead || self.can_pop_lead)
    }

    fn in_range(&self, bloon: &Bloon) -> bool {
        self.position.distance_squared(bloon.position) <= self.range * self.range
    }

    fn is_valid_target(&self, bloon: &Bloon) -> bool {
        bloon.is_active() && self.in_range(bloon) && self.can_target_bloon(bloon)
    }

    /// Pick a target among `bloons` according to the targeting mode
    ///
    /// Pure: depends only on current state. On ties the bloon met first in
    /// slice order wins.
    pub fn find_target(&self, bloons: &[Bloon]) -> Option<BloonId> {
        let mut best: Option<&Bloon> = None;
        for bloon in bloons.iter().filter(|b| self.is_valid_target(b)) {
            let better = match best {
                None => true,
                Some(current) => match self.targeting_mode {
                    TargetingMode::First => bloon.path_index > current.path_index,
                    TargetingMode::Last => bloon.path_index < current.path_index,
                    TargetingMode::Close => {
                        self.position.distance_squared(bloon.position)
                            < self.position.distance_squared(current.position)
                    }
                    TargetingMode::Strong => bloon.health > current.health,
                },
            };
            if better {
                best = Some(bloon);
            }
        }
        best.map(|b| b.id)
    }

    /// Cooldown check against a millisecond clock
    ///
    /// A non-positive fire rate never fires.
    pub fn can_shoot(&self, now_ms: u64) -> bool {
        if !(self.fire_rate.is_finite() && self.fire_rate > 0.0) {
            return false;
        }
        let Some(last) = self.last_shot_ms else {
            return true;
        };
        let period_ms = 1000.0 / f64::from(self.fire_rate);
        now_ms.saturating_sub(last) as f64 >= period_ms
    }

    fn projectile_stats(&self) -> ProjectileStats {
        ProjectileStats {
            damage: self.damage,
            speed: self.projectile_speed,
            pierce: self.pierce,
            seeking: self.has_seeking,
        }
    }

    /// Fire a volley at `target` if the cooldown allows
    pub fn fire_projectiles(&mut self, target: &Bloon, now_ms: u64) -> Vec<Projectile> {
        if !self.can_shoot(now_ms) {
            return Vec::new();
        }
        self.last_shot_ms = Some(now_ms);

        let stats = self.projectile_stats();
        match self.pattern {
            FirePattern::Burst => (0..BURST_PROJECTILE_COUNT)
                .map(|i| {
                    let theta = std::f32::consts::TAU * i as f32 / BURST_PROJECTILE_COUNT as f32;
                    let dir = direction_from_angle(theta);
                    Projectile::new(
                        self.position + dir * BURST_SPAWN_OFFSET,
                        self.position + dir * self.range,
                        stats,
                    )
                })
                .collect(),
            FirePattern::Aimed => {
                let count = self.projectiles.max(1);
                let base_angle = angle_between(self.position, target.position);
                (0..count)
                    .map(|i| {
                        let spread = if count > 1 {
                            (i as f32 - (count - 1) as f32 / 2.0) * MULTI_SHOT_SPREAD
                        } else {
                            0.0
                        };
                        let dir = direction_from_angle(base_angle + spread);
                        let spawn = self.position + dir * AIMED_SPAWN_OFFSET;
                        let aim_distance = self.position.distance(target.position).max(1.0);
                        Projectile::new(spawn, self.position + dir * aim_distance, stats)
                    })
                    .collect()
            }
        }
    }

    /// Keep or re-acquire a target, then fire at it
    pub fn update(&mut self, bloons: &[Bloon], now_ms: u64) -> Vec<Projectile> {
        let current = self
            .target
            .and_then(|id| bloons.iter().find(|b| b.id == id))
            .filter(|b| self.is_valid_target(b));

        let target = match current {
            Some(b) => Some(b),
            None => {
                self.target = self.find_target(bloons);
                self.target.and_then(|id| bloons.iter().find(|b| b.id == id))
            }
        };

        match target {
            Some(bloon) => self.fire_projectiles(bloon, now_ms),
            None => Vec::new(),
        }
    }

    /// Level rules only: tier cap and the cross-path cap
    pub fn check_upgrade_path(&self, path: UpgradePath) -> Result<(), UpgradeBlocked> {
        let level = self.upgrade_levels[path.index()];
        if level >= MAX_UPGRADE_LEVEL {
            return Err(UpgradeBlocked::MaxLevel);
        }
        let other_past_cap = UpgradePath::ALL
            .iter()
            .filter(|p| **p != path)
            .any(|p| self.upgrade_levels[p.index()] > CROSS_PATH_CAP);
        if other_past_cap && level >= CROSS_PATH_CAP {
            return Err(UpgradeBlocked::CrossPathCap);
        }
        Ok(())
    }

    /// Full gate for buying the next tier of `path` at `cost`
    ///
    /// A zero cost means the tier does not exist.
    pub fn check_upgrade(&self, path: UpgradePath, cost: u32, money: u32) -> Result<(), UpgradeBlocked> {
        self.check_upgrade_path(path)?;
        if cost == 0 {
            return Err(UpgradeBlocked::Unavailable);
        }
        if money < cost {
            return Err(UpgradeBlocked::CannotAfford { cost });
        }
        Ok(())
    }

    pub fn can_upgrade(&self, path: UpgradePath, cost: u32, money: u32) -> bool {
        self.check_upgrade(path, cost, money).is_ok()
    }

    /// Apply an upgrade tier, charging `cost` to the tower's total spent
    ///
    /// Does not re-validate; callers gate with [`Tower::can_upgrade`]. Rate and
    /// power stats add up, count and radius stats take the tier's value,
    /// abilities once granted stay granted.
    pub fn apply_upgrade(&mut self, path: UpgradePath, upgrade: &Upgrade, cost: u32) {
        for effect in &upgrade.effects {
            match effect {
                StatEffect::Damage(d) => self.damage = self.damage.saturating_add(*d),
                StatEffect::Range(d) => self.range += d,
                StatEffect::FireRate(d) => self.fire_rate += d,
                StatEffect::Pierce(d) => self.pierce = self.pierce.saturating_add_signed(*d).max(1),
                StatEffect::ProjectileSpeed(d) => self.projectile_speed += d,
                StatEffect::Projectiles(n) => self.projectiles = *n,
                StatEffect::ExplosionRadius(r) => self.explosion_radius = *r,
                StatEffect::SlowEffect(s) => self.slow_effect = *s,
                StatEffect::SeeCamo => self.can_see_camo = true,
                StatEffect::PopLead => self.can_pop_lead = true,
                StatEffect::Seeking => self.has_seeking = true,
                StatEffect::Special(tag) => self.special_effects.push(tag.clone()),
            }
        }

        self.total_spent = self.total_spent.saturating_add(cost);
        let level = &mut self.upgrade_levels[path.index()];
        *level = level.saturating_add(1);
        self.upgrade_history.push(path);

        log::debug!(
            "Tower {:?} upgraded {}: {} (DMG {} RNG {} FR {:.2} PIERCE {}, sell ${})",
            self.id,
            path.as_str(),
            upgrade.name,
            self.damage,
            self.range,
            self.fire_rate,
            self.pierce,
            self.sell_price()
        );
    }
}
