//! Bloon Defense - a deterministic tower-defense simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bloons, towers, projectiles, waves, economy)
//! - `catalog`: Tower definitions and upgrade tiers loaded from JSON
//! - `settings`: Session configuration (starting money, lives, difficulty)
//! - `persistence`: Save/restore of round state as a versioned JSON envelope
//!
//! Rendering, input and backend sync are left to the application shell; every
//! entity exposes read-only state for a renderer to draw.

pub mod catalog;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use catalog::TowerCatalog;
pub use settings::{Difficulty, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Default simulation step in milliseconds (~60 Hz)
    pub const TICK_MS: u64 = 16;

    /// Play area dimensions
    pub const PLAY_AREA_WIDTH: f32 = 1280.0;
    pub const PLAY_AREA_HEIGHT: f32 = 720.0;

    /// Tower body radius used for placement and click detection
    pub const TOWER_RADIUS: f32 = 20.0;
    /// Half the drawn path width (path is 30 px wide)
    pub const PATH_HALF_WIDTH: f32 = 15.0;
    /// Extra clearance around the spawn and end markers
    pub const ENDPOINT_CLEARANCE: f32 = 25.0;

    /// Bloons snap to a waypoint once closer than this
    pub const WAYPOINT_SNAP_DISTANCE: f32 = 5.0;

    /// Projectile defaults
    pub const PROJECTILE_RADIUS: f32 = 3.0;
    pub const PROJECTILE_MAX_LIFETIME_TICKS: u32 = 300; // ~5s at 60 Hz
    pub const PROJECTILE_SEEK_RADIUS: f32 = 100.0;
    /// Projectiles leaving the play area by more than this are culled
    pub const PROJECTILE_BOUNDS_MARGIN: f32 = 50.0;
    pub const DEFAULT_PROJECTILE_SPEED: f32 = 8.0;

    /// Firing patterns
    pub const BURST_PROJECTILE_COUNT: u32 = 8;
    pub const BURST_SPAWN_OFFSET: f32 = 30.0;
    pub const AIMED_SPAWN_OFFSET: f32 = 15.0;
    /// Radians between neighbouring shots of a multi-shot volley
    pub const MULTI_SHOT_SPREAD: f32 = 0.1;

    /// Upgrades
    pub const UPGRADE_PATH_COUNT: usize = 3;
    pub const MAX_UPGRADE_LEVEL: u8 = 5;
    /// A path may not pass this level while another path is above it
    pub const CROSS_PATH_CAP: u8 = 2;
    /// Sell refund as a ratio (7/10 of total spent, rounded down)
    pub const SELL_RATIO_NUM: u64 = 7;
    pub const SELL_RATIO_DEN: u64 = 10;

    /// Economy defaults
    pub const STARTING_MONEY: u32 = 650;
    pub const STARTING_LIVES: i32 = 20;
    /// Money and lives in sandbox mode
    pub const SANDBOX_SENTINEL: u32 = 999_999;
    pub const AUTO_START_DELAY_MS: u64 = 3000;
}

/// Unit vector pointing along `theta` (radians, x-right / y-down screen space)
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle of the vector from `from` to `to`, in radians
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_direction_from_angle() {
        let right = direction_from_angle(0.0);
        assert!((right - Vec2::X).length() < 0.0001);

        let down = direction_from_angle(PI / 2.0);
        assert!((down - Vec2::Y).length() < 0.0001);
    }

    #[test]
    fn test_angle_between() {
        let a = angle_between(Vec2::new(10.0, 10.0), Vec2::new(10.0, 20.0));
        assert!((a - PI / 2.0).abs() < 0.0001);
    }
}
