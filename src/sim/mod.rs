//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep and a logical millisecond clock only
//! - Stable iteration order (bloons by spawn order, towers by placement order)
//! - No rendering, file or network access inside a tick

pub mod bloon;
pub mod geometry;
pub mod map;
pub mod projectile;
pub mod state;
pub mod tick;
pub mod tower;
pub mod wave;

pub use bloon::{Bloon, BloonArena, BloonId, BloonKind, BloonStats};
pub use geometry::{
    PathProjection, closest_point_on_segment, distance_to_path, nearest_point_on_path,
    path_length, point_along_path, point_segment_distance,
};
pub use map::{Map, MapData, Path, Rect, default_path_points};
pub use projectile::{Projectile, ProjectileStats};
pub use state::{GameEvent, GameMode, GamePhase, GameState};
pub use tick::{TickInput, tick};
pub use tower::{FirePattern, TargetingMode, Tower, TowerId, UpgradeBlocked, UpgradePath};
pub use wave::{Wave, WaveEntry};
