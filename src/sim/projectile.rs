//! Projectiles: moving damage carriers fired by towers

use glam::Vec2;

use super::bloon::{Bloon, BloonId};
use crate::consts::*;

/// Damage-related stats a tower hands to each projectile it fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileStats {
    pub damage: i32,
    pub speed: f32,
    pub pierce: u32,
    pub seeking: bool,
}

impl Default for ProjectileStats {
    fn default() -> Self {
        Self {
            damage: 1,
            speed: DEFAULT_PROJECTILE_SPEED,
            pierce: 1,
            seeking: false,
        }
    }
}

/// A projectile entity
#[derive(Debug, Clone)]
pub struct Projectile {
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: i32,
    pub speed: f32,
    pub pierce: u32,
    pub pierce_remaining: u32,
    /// Bloons already damaged by this projectile, in hit order
    pub hit_bloons: Vec<BloonId>,
    pub seeking: bool,
    pub alive: bool,
    pub age_ticks: u32,
    pub max_lifetime_ticks: u32,
}

impl Projectile {
    /// Launch from `start` toward `aim_point`
    ///
    /// Aiming at the start point itself yields a stationary projectile that
    /// simply expires.
    pub fn new(start: Vec2, aim_point: Vec2, stats: ProjectileStats) -> Self {
        let pierce = stats.pierce.max(1);
        Self {
            position: start,
            velocity: (aim_point - start).normalize_or_zero() * stats.speed,
            damage: stats.damage,
            speed: stats.speed,
            pierce,
            pierce_remaining: pierce,
            hit_bloons: Vec::with_capacity(pierce as usize),
            seeking: stats.seeking,
            alive: true,
            age_ticks: 0,
            max_lifetime_ticks: PROJECTILE_MAX_LIFETIME_TICKS,
        }
    }

    #[inline]
    pub fn has_hit(&self, id: BloonId) -> bool {
        self.hit_bloons.contains(&id)
    }

    /// Re-aim at the nearest active, not-yet-hit bloon within seek range
    fn seek(&mut self, bloons: &[Bloon]) {
        let max_sq = PROJECTILE_SEEK_RADIUS * PROJECTILE_SEEK_RADIUS;
        let mut nearest: Option<(f32, Vec2)> = None;
        for bloon in bloons {
            if !bloon.is_active() || self.has_hit(bloon.id) {
                continue;
            }
            let d_sq = self.position.distance_squared(bloon.position);
            if d_sq <= max_sq && nearest.is_none_or(|(best, _)| d_sq < best) {
                nearest = Some((d_sq, bloon.position));
            }
        }
        if let Some((_, target)) = nearest {
            let dir = (target - self.position).normalize_or_zero();
            if dir != Vec2::ZERO {
                self.velocity = dir * self.speed;
            }
        }
    }

    fn out_of_bounds(&self) -> bool {
        let m = PROJECTILE_BOUNDS_MARGIN;
        self.position.x < -m
            || self.position.y < -m
            || self.position.x > PLAY_AREA_WIDTH + m
            || self.position.y > PLAY_AREA_HEIGHT + m
    }

    /// Advance one tick: age, seek, move, collide, cull
    ///
    /// Bloons are scanned in slice order; when pierce runs out mid-scan the
    /// remaining bloons are untouched this tick. Returns the ids popped by
    /// this projectile during the tick.
    pub fn update(&mut self, bloons: &mut [Bloon]) -> Vec<BloonId> {
        let mut popped = Vec::new();
        if !self.alive {
            return popped;
        }

        self.age_ticks += 1;
        if self.age_ticks > self.max_lifetime_ticks {
            self.alive = false;
            return popped;
        }

        if self.seeking {
            self.seek(bloons);
        }

        self.position += self.velocity;

        for bloon in bloons.iter_mut() {
            if !bloon.is_active() || self.has_hit(bloon.id) {
                continue;
            }
            let reach = bloon.size + PROJECTILE_RADIUS;
            if self.position.distance_squared(bloon.position) > reach * reach {
                continue;
            }

            if bloon.take_damage(self.damage) {
                popped.push(bloon.id);
            }
            self.hit_bloons.push(bloon.id);
            self.pierce_remaining -= 1;
            if self.pierce_remaining == 0 {
                self.alive = false;
                break;
            }
        }

        if self.alive && self.out_of_bounds() {
            self.alive = false;
        }

        popped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::bloon::{BloonArena, BloonKind};
    use crate::sim::map::Path;

    fn arena_with(positions: &[Vec2], kind: BloonKind) -> BloonArena {
        let path = Path::new(vec![Vec2::new(0.0, 100.0), Vec2::new(1000.0, 100.0)]);
        let mut arena = BloonArena::new();
        for p in positions {
            let mut bloon = Bloon::new(kind, path.clone());
            bloon.position = *p;
            arena.insert(bloon);
        }
        arena
    }

    #[test]
    fn test_pierce_exhaustion() {
        let mut arena = arena_with(
            &[
                Vec2::new(100.0, 100.0),
                Vec2::new(105.0, 100.0),
                Vec2::new(110.0, 100.0),
            ],
            BloonKind::Yellow,
        );
        let mut proj = Projectile::new(
            Vec2::new(97.0, 100.0),
            Vec2::new(200.0, 100.0),
            ProjectileStats {
                damage: 1,
                speed: 8.0,
                pierce: 3,
                seeking: false,
            },
        );

        proj.update(arena.as_mut_slice());

        assert!(arena.iter().all(|b| b.health == 3));
        assert_eq!(proj.pierce_remaining, 0);
        assert!(!proj.alive);
        assert_eq!(proj.hit_bloons.len(), 3);
    }

    #[test]
    fn test_pierce_stops_in_iteration_order() {
        let mut arena = arena_with(
            &[
                Vec2::new(100.0, 100.0),
                Vec2::new(104.0, 100.0),
                Vec2::new(108.0, 100.0),
            ],
            BloonKind::Green,
        );
        let mut proj = Projectile::new(
            Vec2::new(96.0, 100.0),
            Vec2::new(200.0, 100.0),
            ProjectileStats {
                pierce: 2,
                ..Default::default()
            },
        );

        proj.update(arena.as_mut_slice());

        let healths: Vec<i32> = arena.iter().map(|b| b.health).collect();
        assert_eq!(healths, vec![2, 2, 3]);
        assert!(!proj.alive);
    }

    #[test]
    fn test_never_hits_same_bloon_twice() {
        let mut arena = arena_with(&[Vec2::new(100.0, 100.0)], BloonKind::Yellow);
        let mut proj = Projectile::new(
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 100.0),
            ProjectileStats {
                pierce: 5,
                ..Default::default()
            },
        );

        for _ in 0..3 {
            proj.update(arena.as_mut_slice());
        }

        assert_eq!(arena.as_slice()[0].health, 3);
        assert_eq!(proj.pierce_remaining, 4);
        assert!(proj.alive);
    }

    #[test]
    fn test_popped_ids_reported() {
        let mut arena = arena_with(&[Vec2::new(100.0, 100.0)], BloonKind::Red);
        let mut proj = Projectile::new(
            Vec2::new(95.0, 100.0),
            Vec2::new(200.0, 100.0),
            ProjectileStats::default(),
        );
        let popped = proj.update(arena.as_mut_slice());
        assert_eq!(popped, vec![arena.as_slice()[0].id]);
        assert!(!arena.as_slice()[0].alive);
    }

    #[test]
    fn test_lifetime_expiry() {
        let mut proj = Projectile::new(Vec2::new(500.0, 500.0), Vec2::new(500.0, 500.0), ProjectileStats::default());
        for _ in 0..PROJECTILE_MAX_LIFETIME_TICKS {
            proj.update(&mut []);
        }
        assert!(proj.alive);
        proj.update(&mut []);
        assert!(!proj.alive);
    }

    #[test]
    fn test_out_of_bounds_cull() {
        let mut proj = Projectile::new(
            Vec2::new(PLAY_AREA_WIDTH + PROJECTILE_BOUNDS_MARGIN - 1.0, 300.0),
            Vec2::new(PLAY_AREA_WIDTH + 500.0, 300.0),
            ProjectileStats::default(),
        );
        proj.update(&mut []);
        assert!(!proj.alive);
    }

    #[test]
    fn test_seeking_reaims_at_nearest() {
        let mut arena = arena_with(
            &[Vec2::new(300.0, 250.0), Vec2::new(300.0, 150.0)],
            BloonKind::Red,
        );
        // Fired straight right, the nearer bloon is above
        let mut proj = Projectile::new(
            Vec2::new(300.0, 200.0),
            Vec2::new(400.0, 200.0),
            ProjectileStats {
                seeking: true,
                ..Default::default()
            },
        );
        proj.position = Vec2::new(300.0, 190.0);

        proj.update(arena.as_mut_slice());

        assert!(proj.velocity.x.abs() < 0.0001);
        assert!(proj.velocity.y < 0.0);
    }
}
