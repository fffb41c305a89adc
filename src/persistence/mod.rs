//! Save/restore of round state
//!
//! Features:
//! - Versioned JSON envelope
//! - Towers rebuilt from catalog data by replaying their upgrade order
//! - Consistency check between recorded levels and the replayed history
//!
//! Bloons and projectiles in flight are not saved; a restored game resumes
//! between waves, replaying the recorded round if it was interrupted.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::TowerCatalog;
use crate::settings::{Difficulty, Settings};
use crate::sim::bloon::BloonArena;
use crate::sim::map::Map;
use crate::sim::state::{GameMode, GamePhase, GameState};
use crate::sim::tower::{TargetingMode, Tower, TowerId, UpgradePath};

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("malformed save: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
    #[error("unknown tower type {0}")]
    UnknownTower(String),
    #[error("tower {tower:?} cannot take {path:?} at its recorded level")]
    InvalidUpgrade { tower: TowerId, path: UpgradePath },
    #[error("tower {0:?} levels do not match its upgrade history")]
    Inconsistent(TowerId),
}

/// One placed tower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerRecord {
    pub id: TowerId,
    pub tower_type: String,
    pub position: Vec2,
    #[serde(default)]
    pub targeting_mode: TargetingMode,
    pub upgrade_levels: [u8; 3],
    /// Paths in purchase order
    #[serde(default)]
    pub upgrade_history: Vec<UpgradePath>,
    #[serde(default)]
    pub last_shot_ms: Option<u64>,
}

/// Plain economy and round record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub money: u32,
    pub lives: i32,
    pub round: u32,
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub clock_ms: u64,
    #[serde(default)]
    pub wave_completed_at: Option<u64>,
    #[serde(default = "first_id")]
    pub next_bloon_id: u32,
    #[serde(default = "first_id")]
    pub next_tower_id: u32,
    pub towers: Vec<TowerRecord>,
}

fn first_id() -> u32 {
    1
}

/// Versioned wrapper written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    pub record: SaveRecord,
}

impl SaveRecord {
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        let envelope = SaveEnvelope {
            version: SAVE_VERSION,
            record: self.clone(),
        };
        Ok(serde_json::to_string_pretty(&envelope)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let envelope: SaveEnvelope = serde_json::from_str(json)?;
        if envelope.version != SAVE_VERSION {
            return Err(PersistenceError::UnsupportedVersion(envelope.version));
        }
        Ok(envelope.record)
    }
}

impl GameState {
    /// Capture the persistent part of the round state
    pub fn snapshot(&self) -> SaveRecord {
        SaveRecord {
            money: self.money,
            lives: self.lives,
            round: self.round,
            mode: self.mode,
            difficulty: self.settings.difficulty,
            clock_ms: self.clock_ms,
            wave_completed_at: self.wave_completed_at,
            next_bloon_id: self.bloons.next_id(),
            next_tower_id: self.peek_tower_id(),
            towers: self
                .towers
                .iter()
                .map(|t| TowerRecord {
                    id: t.id,
                    tower_type: t.tower_type.clone(),
                    position: t.position,
                    targeting_mode: t.targeting_mode,
                    upgrade_levels: t.upgrade_levels,
                    upgrade_history: t.upgrade_history.clone(),
                    last_shot_ms: t.last_shot_ms,
                })
                .collect(),
        }
    }

    /// Rebuild a game from a save record
    ///
    /// The record's difficulty overrides the one in `settings`, so replayed
    /// upgrades are charged what the player actually paid.
    pub fn restore(
        record: &SaveRecord,
        map: Map,
        catalog: TowerCatalog,
        settings: Settings,
    ) -> Result<Self, PersistenceError> {
        let settings = settings.with_difficulty(record.difficulty);
        let towers = record
            .towers
            .iter()
            .map(|r| rebuild_tower(r, &catalog, record.difficulty))
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = GameState::new(map, catalog, settings);
        state.mode = record.mode;
        state.money = record.money;
        state.lives = record.lives;
        state.round = record.round.max(1);
        state.clock_ms = record.clock_ms;
        state.wave_completed_at = record.wave_completed_at;
        state.phase = if record.wave_completed_at.is_some() {
            GamePhase::WaveComplete
        } else {
            GamePhase::Idle
        };
        state.resume_phase = state.phase;
        if record.mode == GameMode::Normal && record.lives <= 0 {
            state.phase = GamePhase::GameOver;
        }
        state.bloons = BloonArena::with_next_id(record.next_bloon_id);
        let max_tower_id = towers.iter().map(|t| t.id.0).max().unwrap_or(0);
        state.set_next_tower_id(record.next_tower_id.max(max_tower_id + 1));
        state.towers = towers;

        log::info!(
            "Restored round {} with {} towers (${}, {} lives)",
            state.round,
            state.towers.len(),
            state.money,
            state.lives
        );
        Ok(state)
    }
}

fn rebuild_tower(
    record: &TowerRecord,
    catalog: &TowerCatalog,
    difficulty: Difficulty,
) -> Result<Tower, PersistenceError> {
    let def = catalog
        .get(&record.tower_type)
        .ok_or_else(|| PersistenceError::UnknownTower(record.tower_type.clone()))?;
    let mut tower = Tower::from_definition(record.position, &record.tower_type, def);
    tower.id = record.id;

    for &path in &record.upgrade_history {
        let level = tower.upgrade_levels[path.index()];
        let invalid = PersistenceError::InvalidUpgrade {
            tower: record.id,
            path,
        };
        if tower.check_upgrade_path(path).is_err() {
            return Err(invalid);
        }
        let Some(tier) = catalog.upgrade_tier(&record.tower_type, path, level) else {
            return Err(invalid);
        };
        let cost = catalog.upgrade_cost(&record.tower_type, path, level, difficulty);
        tower.apply_upgrade(path, tier, cost);
    }

    if tower.upgrade_levels != record.upgrade_levels {
        return Err(PersistenceError::Inconsistent(record.id));
    }

    tower.targeting_mode = record.targeting_mode;
    tower.last_shot_ms = record.last_shot_ms;
    Ok(tower)
}
