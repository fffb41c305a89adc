//! Bloon Defense headless runner
//!
//! Loads settings, map and tower data (falling back to built-ins), then lets a
//! seeded autoplayer place towers and play rounds until it runs out of lives
//! or reaches the round limit.

use std::path::PathBuf;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use bloon_defense::sim::{
    GameEvent, GamePhase, GameState, Map, TickInput, UpgradePath, point_along_path, tick,
};
use bloon_defense::{Difficulty, Settings, TowerCatalog};

/// Play Bloon Defense rounds with a seeded autoplayer
#[derive(Debug, Parser)]
#[command(name = "bloon-defense", version, about)]
struct Options {
    /// Stop once this many rounds have been played
    #[arg(long, default_value_t = 10)]
    rounds: u32,
    /// Seed for the autoplayer's placement and upgrade choices
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Settings JSON; defaults are used if it is missing or invalid
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,
    /// Map JSON; the built-in path is used if it is missing or invalid
    #[arg(long, default_value = "map.json")]
    map: PathBuf,
    /// Tower catalog JSON; the built-in catalog is used if it is missing or invalid
    #[arg(long, default_value = "towers.json")]
    towers: PathBuf,
    /// Overrides the settings file (easy, medium, hard, impoppable)
    #[arg(long)]
    difficulty: Option<Difficulty>,
    /// Write a save of the final state here
    #[arg(long)]
    save: Option<PathBuf>,
}

/// Random but legal tower placement and upgrades between waves
struct AutoPlayer {
    rng: Pcg32,
}

impl AutoPlayer {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Try a few spots beside the path for an affordable tower
    fn place_towers(&mut self, state: &mut GameState) {
        let mut types: Vec<(String, u32)> = state
            .catalog
            .tower_types()
            .filter_map(|t| state.catalog.base_cost(t).map(|c| (t.to_string(), c)))
            .filter(|(_, cost)| *cost <= state.money)
            .collect();
        if types.is_empty() {
            return;
        }
        types.sort_by_key(|(_, cost)| *cost);

        for _ in 0..20 {
            let (tower_type, cost) = &types[self.rng.random_range(0..types.len())];
            if *cost > state.money {
                continue;
            }
            let along: f32 = self.rng.random_range(0.05..0.95);
            let Some(anchor) = point_along_path(state.map.path().points(), along) else {
                return;
            };
            let angle: f32 = self.rng.random_range(0.0..std::f32::consts::TAU);
            let distance: f32 = self.rng.random_range(40.0..90.0);
            let position = anchor + bloon_defense::direction_from_angle(angle) * distance;
            if state.place_tower(position, tower_type).is_some() {
                return;
            }
        }
    }

    /// Buy one random affordable upgrade, if any
    fn upgrade(&mut self, state: &mut GameState) {
        let candidates: Vec<_> = state
            .towers
            .iter()
            .flat_map(|t| UpgradePath::ALL.map(|p| (t.id, p)))
            .filter(|(id, path)| state.can_upgrade(*id, *path))
            .collect();
        if candidates.is_empty() {
            return;
        }
        let (id, path) = candidates[self.rng.random_range(0..candidates.len())];
        state.upgrade_tower(id, path);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bloon Defense (headless) starting...");

    let options = Options::parse();
    let mut settings = Settings::load(&options.settings);
    if let Some(difficulty) = options.difficulty {
        settings = settings.with_difficulty(difficulty);
    }
    log::info!("Difficulty: {}", settings.difficulty.as_str());
    let map = Map::load_or_default(&options.map);
    let catalog = TowerCatalog::load_or_default(&options.towers);
    let tick_ms = settings.tick_ms;

    let mut state = GameState::new(map, catalog, settings);
    let mut player = AutoPlayer::new(options.seed);
    let (mut popped, mut leaked) = (0u32, 0u32);

    // Hard stop so a stalled round can never spin forever
    let max_ticks = u64::from(options.rounds) * 60_000 / tick_ms.max(1);
    let mut ticks = 0u64;

    while state.round <= options.rounds && !state.is_game_over() && ticks < max_ticks {
        let mut input = TickInput::default();
        if matches!(state.phase, GamePhase::Idle | GamePhase::WaveComplete) {
            player.place_towers(&mut state);
            player.upgrade(&mut state);
            input.start_wave = true;
        }

        tick(&mut state, &input, tick_ms);
        ticks += 1;

        for event in state.drain_events() {
            match event {
                GameEvent::BloonPopped { .. } => popped += 1,
                GameEvent::BloonLeaked { .. } => leaked += 1,
                _ => {}
            }
        }
    }

    log::info!(
        "Finished after {} ticks ({:.1}s simulated): round {}, ${}, {} lives, {} towers, {} popped, {} leaked",
        ticks,
        state.clock_ms as f64 / 1000.0,
        state.round,
        state.money,
        state.lives,
        state.towers.len(),
        popped,
        leaked
    );
    println!(
        "round={} money={} lives={} towers={} popped={} leaked={} game_over={}",
        state.round,
        state.money,
        state.lives,
        state.towers.len(),
        popped,
        leaked,
        state.is_game_over()
    );

    if let Some(path) = options.save {
        match state.snapshot().to_json() {
            Ok(json) => match std::fs::write(&path, json) {
                Ok(()) => log::info!("Saved to {}", path.display()),
                Err(e) => log::warn!("Could not write {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Could not serialize save: {}", e),
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser shell; the library is driven by an embedding application
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloon_defense::consts::*;

    #[test]
    fn test_options_parse() {
        let options = Options::try_parse_from(["bloon-defense"]).unwrap();
        assert_eq!(options.rounds, 10);
        assert_eq!(options.seed, 42);
        assert_eq!(options.settings, PathBuf::from("settings.json"));
        assert!(options.difficulty.is_none());
        assert!(options.save.is_none());

        let options = Options::try_parse_from([
            "bloon-defense",
            "--rounds",
            "3",
            "--difficulty",
            "hard",
            "--save",
            "run.json",
        ])
        .unwrap();
        assert_eq!(options.rounds, 3);
        assert_eq!(options.difficulty, Some(Difficulty::Hard));
        assert_eq!(options.save, Some(PathBuf::from("run.json")));
    }

    #[test]
    fn test_options_reject_bad_input() {
        // A trailing flag without its value is an error, not a silent default
        assert!(Options::try_parse_from(["bloon-defense", "--save"]).is_err());
        assert!(Options::try_parse_from(["bloon-defense", "--rounds", "many"]).is_err());
        assert!(Options::try_parse_from(["bloon-defense", "--difficulty", "nightmare"]).is_err());
        assert!(Options::try_parse_from(["bloon-defense", "--speed", "2"]).is_err());
    }

    #[test]
    fn test_autoplayer_places_legal_towers() {
        let mut state = GameState::default();
        let mut player = AutoPlayer::new(7);
        for _ in 0..10 {
            player.place_towers(&mut state);
        }
        assert!(!state.towers.is_empty());
        assert!(state.money < STARTING_MONEY);
        for tower in &state.towers {
            let others: Vec<_> = state
                .towers
                .iter()
                .filter(|t| t.id != tower.id)
                .cloned()
                .collect();
            assert!(state.map.can_place_tower(tower.position, &others, TOWER_RADIUS));
        }
    }
}
