//! Bloons: enemies that follow the map path

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::map::Path;
use crate::consts::WAYPOINT_SNAP_DISTANCE;

/// Bloon tiers, ordered weakest to strongest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BloonKind {
    #[default]
    Red,
    Blue,
    Green,
    Yellow,
}

/// Per-tier stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloonStats {
    pub health: i32,
    /// Pixels per tick
    pub speed: f32,
    pub reward: u32,
    /// Collision/render radius
    pub size: f32,
    /// RGB, presentation only
    pub color: [u8; 3],
}

impl BloonKind {
    pub const ALL: [BloonKind; 4] = [
        BloonKind::Red,
        BloonKind::Blue,
        BloonKind::Green,
        BloonKind::Yellow,
    ];

    pub fn stats(&self) -> BloonStats {
        match self {
            BloonKind::Red => BloonStats {
                health: 1,
                speed: 1.0,
                reward: 1,
                size: 15.0,
                color: [255, 0, 0],
            },
            BloonKind::Blue => BloonStats {
                health: 2,
                speed: 1.2,
                reward: 2,
                size: 15.0,
                color: [0, 0, 255],
            },
            BloonKind::Green => BloonStats {
                health: 3,
                speed: 1.5,
                reward: 3,
                size: 15.0,
                color: [0, 255, 0],
            },
            BloonKind::Yellow => BloonStats {
                health: 4,
                speed: 2.0,
                reward: 4,
                size: 15.0,
                color: [255, 255, 0],
            },
        }
    }

    /// Next tier, wrapping back to red (sandbox spawner cycling)
    pub fn next(&self) -> Self {
        match self {
            BloonKind::Red => BloonKind::Blue,
            BloonKind::Blue => BloonKind::Green,
            BloonKind::Green => BloonKind::Yellow,
            BloonKind::Yellow => BloonKind::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BloonKind::Red => "red",
            BloonKind::Blue => "blue",
            BloonKind::Green => "green",
            BloonKind::Yellow => "yellow",
        }
    }
}

/// Stable bloon identity, unique within a game session
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct BloonId(pub u32);

/// A bloon entity
#[derive(Debug, Clone)]
pub struct Bloon {
    /// Assigned by [`BloonArena::insert`]
    pub id: BloonId,
    pub kind: BloonKind,
    pub health: i32,
    pub max_health: i32,
    pub speed: f32,
    pub reward: u32,
    pub size: f32,
    pub path: Path,
    /// Index of the last waypoint reached
    pub path_index: usize,
    pub position: Vec2,
    /// path_index / (waypoints - 1)
    pub progress: f32,
    pub alive: bool,
    pub reached_end: bool,
    pub camo: bool,
    pub lead: bool,
}

impl Bloon {
    /// Create a bloon at the start of `path`
    pub fn new(kind: BloonKind, path: Path) -> Self {
        let stats = kind.stats();
        let position = path.start();
        Self {
            id: BloonId::default(),
            kind,
            health: stats.health,
            max_health: stats.health,
            speed: stats.speed,
            reward: stats.reward,
            size: stats.size,
            path,
            path_index: 0,
            position,
            progress: 0.0,
            alive: true,
            reached_end: false,
            camo: false,
            lead: false,
        }
    }

    /// Create a bloon mid-path, heading for waypoint `path_index + 1`
    pub fn at(kind: BloonKind, path: Path, position: Vec2, path_index: usize) -> Self {
        let mut bloon = Self::new(kind, path);
        bloon.position = position;
        bloon.path_index = path_index.min(bloon.path.last_index());
        bloon.progress = bloon.compute_progress();
        bloon
    }

    pub fn with_camo(mut self) -> Self {
        self.camo = true;
        self
    }

    pub fn with_lead(mut self) -> Self {
        self.lead = true;
        self
    }

    /// Still on the board and targetable
    #[inline]
    pub fn is_active(&self) -> bool {
        self.alive && !self.reached_end
    }

    fn compute_progress(&self) -> f32 {
        let last = self.path.last_index();
        if last == 0 {
            1.0
        } else {
            self.path_index as f32 / last as f32
        }
    }

    /// Advance one tick along the path
    pub fn update(&mut self) {
        if !self.is_active() {
            return;
        }

        if self.path_index >= self.path.last_index() {
            self.reached_end = true;
            self.progress = 1.0;
            return;
        }

        let Some(target) = self.path.waypoint(self.path_index + 1) else {
            self.reached_end = true;
            self.progress = 1.0;
            return;
        };

        let delta = target - self.position;
        let dist_sq = delta.length_squared();
        if dist_sq < WAYPOINT_SNAP_DISTANCE * WAYPOINT_SNAP_DISTANCE {
            // Snap instead of stepping to avoid oscillating around the waypoint
            self.path_index += 1;
        } else {
            self.position += delta / dist_sq.sqrt() * self.speed;
        }
        self.progress = self.compute_progress();
    }

    /// Apply damage; returns true if this hit popped the bloon
    ///
    /// Health never drops below zero. Reward and removal are the caller's job.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount.max(0)).max(0);
        if self.health == 0 {
            self.alive = false;
            return true;
        }
        false
    }
}

/// Insertion-ordered bloon store with stable ids
///
/// Iteration order is insertion order, which is also ascending id order.
/// Targeting ties and pierce exhaustion depend on it.
#[derive(Debug, Clone)]
pub struct BloonArena {
    bloons: Vec<Bloon>,
    next_id: u32,
}

impl Default for BloonArena {
    fn default() -> Self {
        Self::new()
    }
}

impl BloonArena {
    pub fn new() -> Self {
        Self::with_next_id(1)
    }

    /// Empty arena whose next id is `next_id` (used when restoring a save)
    pub fn with_next_id(next_id: u32) -> Self {
        Self {
            bloons: Vec::new(),
            next_id: next_id.max(1),
        }
    }

    /// Take ownership of a bloon and assign its id
    pub fn insert(&mut self, mut bloon: Bloon) -> BloonId {
        let id = BloonId(self.next_id);
        self.next_id += 1;
        bloon.id = id;
        self.bloons.push(bloon);
        id
    }

    pub fn get(&self, id: BloonId) -> Option<&Bloon> {
        self.bloons
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.bloons[i])
    }

    pub fn as_slice(&self) -> &[Bloon] {
        &self.bloons
    }

    pub fn as_mut_slice(&mut self) -> &mut [Bloon] {
        &mut self.bloons
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bloon> {
        self.bloons.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bloon> {
        self.bloons.iter_mut()
    }

    /// Remove every bloon for which `keep` returns false, preserving order
    pub fn retain(&mut self, keep: impl FnMut(&Bloon) -> bool) {
        self.bloons.retain(keep);
    }

    /// Drop every bloon; ids keep counting up
    pub fn clear(&mut self) {
        self.bloons.clear();
    }

    pub fn len(&self) -> usize {
        self.bloons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bloons.is_empty()
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }
}
