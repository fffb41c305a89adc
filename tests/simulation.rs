//! End-to-end scenarios driving the round controller through `tick`

use bloon_defense::consts::*;
use bloon_defense::persistence::SaveRecord;
use bloon_defense::sim::{
    Bloon, BloonArena, BloonKind, GameEvent, GameMode, GamePhase, GameState, Map, Path,
    Projectile, ProjectileStats, TickInput, Tower, UpgradePath, Wave, WaveEntry, tick,
};
use bloon_defense::{Settings, TowerCatalog};
use glam::Vec2;

fn start() -> TickInput {
    TickInput {
        start_wave: true,
        ..Default::default()
    }
}

fn run_until(state: &mut GameState, max_ticks: u32, done: impl Fn(&GameState) -> bool) {
    for _ in 0..max_ticks {
        if done(state) {
            return;
        }
        tick(state, &TickInput::default(), TICK_MS);
    }
}

fn defended_state() -> GameState {
    let mut state = GameState::default();
    state.money = 2000;
    for pos in [
        Vec2::new(125.0, 300.0),
        Vec2::new(300.0, 260.0),
        Vec2::new(470.0, 350.0),
    ] {
        state.place_tower(pos, "dart_monkey").unwrap();
    }
    state
}

#[test]
fn wave_exhaustion() {
    let path = Path::new(vec![Vec2::ZERO, Vec2::new(100.0, 0.0)]);
    let mut wave = Wave::new(vec![WaveEntry::new(BloonKind::Red, 3)], 0);
    let spawned = (1..=5u64)
        .filter(|t| wave.spawn_next_bloon(*t, &path).is_some())
        .count();
    assert_eq!(spawned, 3);
    assert!(wave.is_complete());
}

#[test]
fn first_mode_targets_furthest_bloon() {
    let path = Path::new(vec![Vec2::ZERO, Vec2::new(100.0, 0.0)]);
    let mut arena = BloonArena::new();
    arena.insert(Bloon::at(BloonKind::Red, path.clone(), Vec2::ZERO, 0));
    let ahead = arena.insert(Bloon::at(BloonKind::Red, path, Vec2::new(100.0, 0.0), 1));

    let mut tower = Tower::new(Vec2::new(50.0, 0.0), "dart_monkey");
    tower.range = 60.0;
    assert_eq!(tower.find_target(arena.as_slice()), Some(ahead));
}

#[test]
fn pierce_exhaustion() {
    let path = Path::new(vec![Vec2::ZERO, Vec2::new(500.0, 0.0)]);
    let mut arena = BloonArena::new();
    for x in [100.0, 104.0, 108.0] {
        arena.insert(Bloon::at(BloonKind::Green, path.clone(), Vec2::new(x, 0.0), 0));
    }
    let mut projectile = Projectile::new(
        Vec2::new(96.0, 0.0),
        Vec2::new(400.0, 0.0),
        ProjectileStats {
            pierce: 3,
            ..Default::default()
        },
    );
    projectile.update(arena.as_mut_slice());

    assert_eq!(arena.iter().filter(|b| b.health < b.max_health).count(), 3);
    assert_eq!(projectile.pierce_remaining, 0);
    assert!(!projectile.alive);
}

#[test]
fn placement_rejection() {
    let map = Map::from_path(vec![
        Vec2::new(50.0, 100.0),
        Vec2::new(150.0, 100.0),
        Vec2::new(250.0, 100.0),
    ]);
    assert!(!map.can_place_tower(Vec2::new(100.0, 100.0), &[], TOWER_RADIUS));
    assert!(map.can_place_tower(Vec2::new(300.0, 300.0), &[], TOWER_RADIUS));
    let placed = Tower::new(Vec2::new(300.0, 300.0), "dart_monkey");
    assert!(!map.can_place_tower(Vec2::new(310.0, 310.0), &[placed], TOWER_RADIUS));
}

#[test]
fn sell_price_after_upgrades() {
    let catalog = TowerCatalog::builtin();
    let mut tower = Tower::new(Vec2::ZERO, "dart_monkey");
    tower.set_base_cost(200);
    let mut sharp = catalog
        .upgrade_tier("dart_monkey", UpgradePath::Path1, 0)
        .unwrap()
        .clone();
    sharp.cost = 130;
    tower.apply_upgrade(UpgradePath::Path1, &sharp, 130);
    tower.apply_upgrade(UpgradePath::Path1, &sharp, 350);
    assert_eq!(tower.total_spent, 680);
    assert_eq!(tower.sell_price(), 476);
}

#[test]
fn defended_rounds_progress() {
    let mut state = defended_state();
    for round in 1..=3 {
        tick(&mut state, &start(), TICK_MS);
        assert_eq!(state.phase, GamePhase::WaveActive);
        run_until(&mut state, 30_000, |s| s.phase == GamePhase::WaveComplete);
        assert_eq!(state.phase, GamePhase::WaveComplete);
        assert_eq!(state.round, round + 1);
    }
    assert!(state.lives > 0);
    assert!(state.money > 2000 - 3 * 200);
}

#[test]
fn game_over_is_terminal() {
    let settings = Settings {
        starting_lives: 1,
        ..Default::default()
    };
    let mut state = GameState::new(Map::default(), TowerCatalog::builtin(), settings);
    tick(&mut state, &start(), TICK_MS);
    run_until(&mut state, 20_000, GameState::is_game_over);

    assert!(state.is_game_over());
    let events = state.drain_events();
    assert!(matches!(events.last(), Some(GameEvent::GameOver { round: 1 })));

    // Pausing and ticking do nothing any more
    tick(
        &mut state,
        &TickInput {
            pause: true,
            start_wave: true,
        },
        TICK_MS,
    );
    assert_eq!(state.phase, GamePhase::GameOver);
    assert!(state.drain_events().is_empty());
}

#[test]
fn save_restore_reproduces_play() {
    let mut original = defended_state();
    let id = original.towers[1].id;
    original.upgrade_tower(id, UpgradePath::Path2);
    tick(&mut original, &start(), TICK_MS);
    run_until(&mut original, 30_000, |s| s.phase == GamePhase::WaveComplete);
    original.drain_events();

    let json = original.snapshot().to_json().unwrap();
    let record = SaveRecord::from_json(&json).unwrap();
    let mut restored = GameState::restore(
        &record,
        Map::default(),
        TowerCatalog::builtin(),
        Settings::default(),
    )
    .unwrap();
    assert_eq!(restored.snapshot(), original.snapshot());

    tick(&mut original, &start(), TICK_MS);
    tick(&mut restored, &start(), TICK_MS);
    for _ in 0..1500 {
        tick(&mut original, &TickInput::default(), TICK_MS);
        tick(&mut restored, &TickInput::default(), TICK_MS);
    }

    assert_eq!(restored.money, original.money);
    assert_eq!(restored.lives, original.lives);
    assert_eq!(restored.round, original.round);
    assert_eq!(restored.drain_events(), original.drain_events());
    let positions = |s: &GameState| s.bloons.iter().map(|b| b.position).collect::<Vec<_>>();
    assert_eq!(positions(&restored), positions(&original));
}

#[test]
fn sandbox_spawned_bloons_follow_the_path() {
    let mut state = GameState::default();
    state.set_mode(GameMode::Sandbox);
    let kind = state.cycle_sandbox_bloon_kind();
    let id = state.spawn_bloon(Vec2::new(1100.0, 180.0), kind).unwrap();
    assert_eq!(state.bloons.get(id).map(|b| b.path_index), Some(10));

    // Leaks never cost sandbox lives
    run_until(&mut state, 2000, |s| s.bloons.is_empty());
    assert!(state.bloons.is_empty());
    assert_eq!(state.lives, SANDBOX_SENTINEL as i32);
    assert!(matches!(
        state.drain_events().as_slice(),
        [GameEvent::BloonLeaked { kind: BloonKind::Blue, .. }]
    ));
}
