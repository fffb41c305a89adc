//! Property tests for the simulation invariants

use bloon_defense::TowerCatalog;
use bloon_defense::catalog::{StatEffect, Upgrade};
use bloon_defense::consts::*;
use bloon_defense::sim::{
    Bloon, BloonArena, BloonKind, Map, Path, TargetingMode, Tower, UpgradePath,
};
use glam::Vec2;
use proptest::prelude::*;

fn kind_strategy() -> impl Strategy<Value = BloonKind> {
    prop::sample::select(BloonKind::ALL.to_vec())
}

fn path_strategy() -> impl Strategy<Value = UpgradePath> {
    prop::sample::select(UpgradePath::ALL.to_vec())
}

fn mode_strategy() -> impl Strategy<Value = TargetingMode> {
    prop::sample::select(vec![
        TargetingMode::First,
        TargetingMode::Last,
        TargetingMode::Close,
        TargetingMode::Strong,
    ])
}

fn tier(cost: u32) -> Upgrade {
    Upgrade {
        name: "Tier".to_string(),
        description: String::new(),
        cost,
        effects: vec![StatEffect::Damage(1), StatEffect::Pierce(1)],
    }
}

proptest! {
    #[test]
    fn health_stays_in_bounds(kind in kind_strategy(), hits in prop::collection::vec(-3i32..10, 0..20)) {
        let path = Path::new(vec![Vec2::ZERO, Vec2::new(100.0, 0.0)]);
        let mut bloon = Bloon::new(kind, path);
        let mut pops = 0;
        for amount in hits {
            if bloon.take_damage(amount) {
                pops += 1;
            }
            prop_assert!(bloon.health >= 0);
            prop_assert!(bloon.health <= bloon.max_health);
            prop_assert_eq!(bloon.alive, bloon.health > 0);
        }
        prop_assert!(pops <= 1);
    }

    #[test]
    fn upgrade_levels_respect_caps(attempts in prop::collection::vec(path_strategy(), 0..40)) {
        let mut tower = Tower::new(Vec2::ZERO, "dart_monkey");
        for path in attempts {
            if tower.can_upgrade(path, 100, u32::MAX) {
                tower.apply_upgrade(path, &tier(100), 100);
            }
            let levels = tower.upgrade_levels;
            prop_assert!(levels.iter().all(|l| *l <= MAX_UPGRADE_LEVEL));
            prop_assert!(levels.iter().filter(|l| **l > CROSS_PATH_CAP).count() <= 1);
        }
    }

    #[test]
    fn sell_price_tracks_spend(base in 0u32..5000, costs in prop::collection::vec(1u32..50_000, 0..15)) {
        let mut tower = Tower::new(Vec2::ZERO, "dart_monkey");
        tower.set_base_cost(base);
        let mut last = tower.sell_price();
        prop_assert_eq!(u64::from(last), u64::from(base) * 7 / 10);

        for (i, cost) in costs.into_iter().enumerate() {
            let path = UpgradePath::ALL[i % UPGRADE_PATH_COUNT];
            if !tower.can_upgrade(path, cost, u32::MAX) {
                continue;
            }
            tower.apply_upgrade(path, &tier(cost), cost);
            let price = tower.sell_price();
            prop_assert!(price >= last);
            prop_assert_eq!(u64::from(price), u64::from(tower.total_spent) * 7 / 10);
            last = price;
        }
    }

    #[test]
    fn find_target_is_idempotent(
        mode in mode_strategy(),
        bloons in prop::collection::vec((kind_strategy(), 0.0f32..400.0, -50.0f32..50.0, 0usize..3), 0..12),
    ) {
        let path = Path::new(vec![
            Vec2::ZERO,
            Vec2::new(200.0, 0.0),
            Vec2::new(400.0, 0.0),
        ]);
        let mut arena = BloonArena::new();
        for (kind, x, y, index) in bloons {
            arena.insert(Bloon::at(kind, path.clone(), Vec2::new(x, y), index));
        }
        let mut tower = Tower::new(Vec2::new(200.0, 20.0), "dart_monkey");
        tower.targeting_mode = mode;
        tower.range = 150.0;

        let first = tower.find_target(arena.as_slice());
        prop_assert_eq!(first, tower.find_target(arena.as_slice()));
        if let Some(id) = first {
            let target = arena.get(id).unwrap();
            prop_assert!(target.position.distance(tower.position) <= tower.range);
        }
    }

    #[test]
    fn catalog_upgrades_never_break_caps(attempts in prop::collection::vec(path_strategy(), 0..30)) {
        let catalog = TowerCatalog::builtin();
        let mut tower = Tower::new(Vec2::ZERO, "boomerang_monkey");
        for path in attempts {
            let level = tower.upgrade_levels[path.index()];
            let cost = catalog.upgrade_cost("boomerang_monkey", path, level, Default::default());
            if tower.can_upgrade(path, cost, u32::MAX) {
                let tier = catalog.upgrade_tier("boomerang_monkey", path, level).unwrap();
                tower.apply_upgrade(path, tier, cost);
            }
        }
        let levels = tower.upgrade_levels;
        prop_assert!(levels.iter().all(|l| *l <= MAX_UPGRADE_LEVEL));
        prop_assert!(levels.iter().filter(|l| **l > CROSS_PATH_CAP).count() <= 1);
        prop_assert!(tower.pierce >= 1);
    }

    #[test]
    fn placement_keeps_clear_of_path(x in 0.0f32..1280.0, y in 0.0f32..720.0) {
        let map = Map::default();
        if map.can_place_tower(Vec2::new(x, y), &[], TOWER_RADIUS) {
            let d = bloon_defense::sim::distance_to_path(Vec2::new(x, y), map.path().points());
            prop_assert!(d >= TOWER_RADIUS + PATH_HALF_WIDTH);
        }
    }
}
