//! Round controller state and player actions
//!
//! Everything a save needs to reproduce a session lives here, together with
//! the mutation entry points the input layer calls between ticks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bloon::{Bloon, BloonArena, BloonId, BloonKind};
use super::geometry::nearest_point_on_path;
use super::map::Map;
use super::projectile::Projectile;
use super::tower::{TargetingMode, Tower, TowerId, UpgradePath};
use super::wave::Wave;
use crate::catalog::TowerCatalog;
use crate::consts::*;
use crate::settings::Settings;

/// Current phase of the round state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No wave has been started yet
    Idle,
    /// Bloons are spawning or still on the board
    WaveActive,
    /// Between waves, waiting for a manual or automatic start
    WaveComplete,
    /// Frozen; resumes into the phase it was paused from
    Paused,
    /// Lives ran out
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Normal,
    /// Unlimited money and lives, bloons spawnable on demand
    Sandbox,
}

/// Notable things that happened during a tick or action
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    WaveStarted { round: u32 },
    WaveCompleted { round: u32 },
    BloonPopped { id: BloonId, kind: BloonKind, reward: u32 },
    BloonLeaked { id: BloonId, kind: BloonKind },
    TowerPlaced { id: TowerId, tower_type: String, cost: u32 },
    TowerSold { id: TowerId, refund: u32 },
    TowerUpgraded { id: TowerId, path: UpgradePath, level: u8, cost: u32 },
    GameOver { round: u32 },
}

/// Complete round state
#[derive(Debug, Clone)]
pub struct GameState {
    pub map: Map,
    pub catalog: TowerCatalog,
    pub settings: Settings,
    pub mode: GameMode,
    pub phase: GamePhase,
    /// Phase to return to when unpausing
    pub resume_phase: GamePhase,
    pub money: u32,
    pub lives: i32,
    /// Round the next (or current) wave belongs to, 1-based
    pub round: u32,
    /// Logical clock, only advanced by unpaused ticks
    pub clock_ms: u64,
    pub wave_completed_at: Option<u64>,
    pub wave: Option<Wave>,
    /// Live bloons in spawn order
    pub bloons: BloonArena,
    /// Live towers in placement order
    pub towers: Vec<Tower>,
    pub projectiles: Vec<Projectile>,
    pub selected: Option<TowerId>,
    pub sandbox_bloon_kind: BloonKind,
    /// Pending events, oldest first
    ///
    /// Nothing in the simulation consumes these; an embedder that never calls
    /// [`GameState::drain_events`] keeps growing this list.
    pub events: Vec<GameEvent>,
    next_tower_id: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Map::default(), TowerCatalog::builtin(), Settings::default())
    }
}

impl GameState {
    pub fn new(map: Map, catalog: TowerCatalog, settings: Settings) -> Self {
        Self {
            map,
            catalog,
            mode: GameMode::Normal,
            phase: GamePhase::Idle,
            resume_phase: GamePhase::Idle,
            money: settings.starting_money,
            lives: settings.starting_lives,
            round: 1,
            clock_ms: 0,
            wave_completed_at: None,
            wave: None,
            bloons: BloonArena::new(),
            towers: Vec::new(),
            projectiles: Vec::new(),
            selected: None,
            sandbox_bloon_kind: BloonKind::Red,
            events: Vec::new(),
            next_tower_id: 1,
            settings,
        }
    }

    /// Allocate a new tower ID
    pub fn next_tower_id(&mut self) -> TowerId {
        let id = TowerId(self.next_tower_id);
        self.next_tower_id += 1;
        id
    }

    /// Next tower ID without allocating it (used by saves)
    pub fn peek_tower_id(&self) -> u32 {
        self.next_tower_id
    }

    pub(crate) fn set_next_tower_id(&mut self, next: u32) {
        self.next_tower_id = next.max(1);
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    #[inline]
    pub fn is_wave_active(&self) -> bool {
        self.phase == GamePhase::WaveActive
            || (self.phase == GamePhase::Paused && self.resume_phase == GamePhase::WaveActive)
    }

    pub fn tower(&self, id: TowerId) -> Option<&Tower> {
        self.towers.iter().find(|t| t.id == id)
    }

    fn tower_index(&self, id: TowerId) -> Option<usize> {
        self.towers.iter().position(|t| t.id == id)
    }

    /// Take the pending events, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deduct `cost` if affordable; sandbox money never runs out
    fn spend(&mut self, cost: u32) -> bool {
        if self.mode == GameMode::Sandbox {
            return true;
        }
        if self.money < cost {
            return false;
        }
        self.money -= cost;
        true
    }

    /// Add money (pop rewards, refunds)
    pub(crate) fn credit(&mut self, amount: u32) {
        if self.mode == GameMode::Normal {
            self.money = self.money.saturating_add(amount);
        }
    }

    /// Lose a life for a leaked bloon; returns true if that ended the game
    pub(crate) fn lose_life(&mut self) -> bool {
        if self.mode == GameMode::Normal {
            self.lives -= 1;
        }
        self.lives <= 0
    }

    pub(crate) fn set_game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        self.events.push(GameEvent::GameOver { round: self.round });
        log::info!("Game over on round {}", self.round);
    }

    // === Towers ===

    /// Place a tower of `tower_type` at `position`
    ///
    /// Fails without side effects on an unknown type, insufficient money or an
    /// illegal spot.
    pub fn place_tower(&mut self, position: Vec2, tower_type: &str) -> Option<TowerId> {
        if self.is_game_over() {
            return None;
        }
        let Some(def) = self.catalog.get(tower_type) else {
            log::debug!("Unknown tower type {}", tower_type);
            return None;
        };
        let cost = def.base_cost;
        if self.mode == GameMode::Normal && self.money < cost {
            log::debug!("Cannot afford {} (${} < ${})", tower_type, self.money, cost);
            return None;
        }
        if !self.map.can_place_tower(position, &self.towers, TOWER_RADIUS) {
            log::debug!("Invalid placement for {} at {:?}", tower_type, position);
            return None;
        }

        let mut tower = Tower::from_definition(position, tower_type, def);
        self.spend(cost);
        let id = self.next_tower_id();
        tower.id = id;
        self.towers.push(tower);

        self.events.push(GameEvent::TowerPlaced {
            id,
            tower_type: tower_type.to_string(),
            cost,
        });
        log::info!("Placed {} {:?} at ({:.0}, {:.0}) for ${}", tower_type, id, position.x, position.y, cost);
        Some(id)
    }

    /// Sell a tower for 70% of everything spent on it
    pub fn sell_tower(&mut self, id: TowerId) -> Option<u32> {
        if self.is_game_over() {
            return None;
        }
        let index = self.tower_index(id)?;
        let tower = self.towers.remove(index);
        let refund = tower.sell_price();
        self.credit(refund);
        if self.selected == Some(id) {
            self.selected = None;
        }

        self.events.push(GameEvent::TowerSold { id, refund });
        log::info!("Sold {} {:?} for ${}", tower.tower_type, id, refund);
        Some(refund)
    }

    pub fn cycle_targeting_mode(&mut self, id: TowerId) -> Option<TargetingMode> {
        let index = self.tower_index(id)?;
        let mode = self.towers[index].cycle_targeting_mode();
        log::debug!("Tower {:?} now targets {}", id, mode.label());
        Some(mode)
    }

    /// Price of the tower's next tier on `path` at the current difficulty, 0 if none
    pub fn upgrade_cost(&self, id: TowerId, path: UpgradePath) -> u32 {
        let Some(tower) = self.tower(id) else {
            return 0;
        };
        self.catalog.upgrade_cost(
            &tower.tower_type,
            path,
            tower.upgrade_levels[path.index()],
            self.settings.difficulty,
        )
    }

    fn available_money(&self) -> u32 {
        match self.mode {
            GameMode::Normal => self.money,
            GameMode::Sandbox => u32::MAX,
        }
    }

    pub fn can_upgrade(&self, id: TowerId, path: UpgradePath) -> bool {
        let cost = self.upgrade_cost(id, path);
        self.tower(id)
            .is_some_and(|t| t.can_upgrade(path, cost, self.available_money()))
    }

    /// Buy the next tier on `path`; returns the money spent, 0 if rejected
    pub fn upgrade_tower(&mut self, id: TowerId, path: UpgradePath) -> u32 {
        if self.is_game_over() {
            return 0;
        }
        let Some(index) = self.tower_index(id) else {
            return 0;
        };
        let cost = self.upgrade_cost(id, path);
        if let Err(reason) = self.towers[index].check_upgrade(path, cost, self.available_money()) {
            log::debug!("Upgrade {:?} {} rejected: {:?}", id, path.as_str(), reason);
            return 0;
        }

        let level = self.towers[index].upgrade_levels[path.index()];
        let Some(tier) = self
            .catalog
            .upgrade_tier(&self.towers[index].tower_type, path, level)
        else {
            return 0;
        };
        let tier = tier.clone();

        self.spend(cost);
        let tower = &mut self.towers[index];
        tower.apply_upgrade(path, &tier, cost);
        let level = tower.upgrade_levels[path.index()];

        self.events.push(GameEvent::TowerUpgraded { id, path, level, cost });
        log::info!("Upgraded {:?} {} to tier {}: {} (${})", id, path.as_str(), level, tier.name, cost);
        cost
    }

    /// Tower whose body covers `point`, topmost (latest placed) first
    pub fn tower_at(&self, point: Vec2) -> Option<TowerId> {
        self.towers
            .iter()
            .rev()
            .find(|t| t.contains_point(point))
            .map(|t| t.id)
    }

    /// Click-select: selects the tower under `point`, or clears the selection
    ///
    /// Clicking the already-selected tower deselects it.
    pub fn select_tower(&mut self, point: Vec2) -> Option<TowerId> {
        let hit = self.tower_at(point);
        let next = if hit == self.selected { None } else { hit };
        for tower in &mut self.towers {
            tower.selected = Some(tower.id) == next;
        }
        self.selected = next;
        next
    }

    // === Waves ===

    /// Start the wave for the current round
    pub fn start_wave(&mut self) -> bool {
        match self.phase {
            GamePhase::Idle | GamePhase::WaveComplete => {}
            _ => {
                log::debug!("Cannot start a wave while {:?}", self.phase);
                return false;
            }
        }

        let wave = Wave::for_round(self.round);
        log::info!(
            "Round {} started: {} bloons, {}ms apart",
            self.round,
            wave.total(),
            wave.spawn_delay_ms()
        );
        self.wave = Some(wave);
        self.phase = GamePhase::WaveActive;
        self.events.push(GameEvent::WaveStarted { round: self.round });
        true
    }

    /// Close the active wave: advance the round and clear the board
    pub(crate) fn complete_wave(&mut self) {
        let finished = self.round;
        self.phase = GamePhase::WaveComplete;
        self.round += 1;
        self.wave_completed_at = Some(self.clock_ms);
        self.bloons.retain(Bloon::is_active);
        self.projectiles.clear();
        for tower in &mut self.towers {
            tower.target = None;
        }

        self.events.push(GameEvent::WaveCompleted { round: finished });
        log::info!("Round {} complete (${} / {} lives)", finished, self.money, self.lives);
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::GameOver => {}
            GamePhase::Paused => {
                self.phase = self.resume_phase;
                log::info!("Resumed");
            }
            phase => {
                self.resume_phase = phase;
                self.phase = GamePhase::Paused;
                log::info!("Paused");
            }
        }
    }

    // === Modes ===

    /// Switch modes, starting the session over on a cleared board
    ///
    /// Entering sandbox sets money and lives to the sentinel, leaving it
    /// restores the configured starting values. Nothing built or spawned in
    /// one mode carries over into the other.
    pub fn set_mode(&mut self, mode: GameMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.towers.clear();
        self.bloons.clear();
        self.projectiles.clear();
        self.wave = None;
        self.selected = None;
        self.round = 1;
        self.wave_completed_at = None;
        self.phase = GamePhase::Idle;
        self.resume_phase = GamePhase::Idle;
        match mode {
            GameMode::Sandbox => {
                self.money = SANDBOX_SENTINEL;
                self.lives = SANDBOX_SENTINEL as i32;
            }
            GameMode::Normal => {
                self.money = self.settings.starting_money;
                self.lives = self.settings.starting_lives;
            }
        }
        log::info!("Mode set to {:?}", mode);
    }

    /// RED -> BLUE -> GREEN -> YELLOW -> RED
    pub fn cycle_sandbox_bloon_kind(&mut self) -> BloonKind {
        self.sandbox_bloon_kind = self.sandbox_bloon_kind.next();
        self.sandbox_bloon_kind
    }

    /// Sandbox only: drop a bloon onto the path point nearest `point`
    ///
    /// The bloon continues toward the end of the segment it landed on.
    pub fn spawn_bloon(&mut self, point: Vec2, kind: BloonKind) -> Option<BloonId> {
        if self.mode != GameMode::Sandbox || self.is_game_over() {
            return None;
        }
        let path = self.map.path();
        let projection = nearest_point_on_path(point, path.points())?;
        let bloon = Bloon::at(kind, path.clone(), projection.point, projection.segment);
        let id = self.bloons.insert(bloon);
        log::debug!("Sandbox spawned {} {:?} at {:?}", kind.as_str(), id, projection.point);
        Some(id)
    }
}
