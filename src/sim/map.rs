//! Map data: the bloon path and tower placement rules

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::distance_to_path;
use super::tower::Tower;
use crate::catalog::DataError;
use crate::consts::*;

/// Read-only waypoint polyline shared by every bloon of a round
///
/// Cloning is cheap; all clones point at the same waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Path(Arc<[Vec2]>);

impl Path {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self(points.into())
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index of the final waypoint (0 for an empty path)
    #[inline]
    pub fn last_index(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    #[inline]
    pub fn waypoint(&self, index: usize) -> Option<Vec2> {
        self.0.get(index).copied()
    }

    /// First waypoint, or the origin for an empty path
    pub fn start(&self) -> Vec2 {
        self.0.first().copied().unwrap_or(Vec2::ZERO)
    }
}

impl From<Vec<Vec2>> for Path {
    fn from(points: Vec<Vec2>) -> Self {
        Self::new(points)
    }
}

/// Axis-aligned rectangle hint for where towers may go
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// On-disk map description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapData {
    pub path: Vec<Vec2>,
    #[serde(default)]
    pub spawn_point: Option<Vec2>,
    #[serde(default)]
    pub end_point: Option<Vec2>,
    #[serde(default)]
    pub placeable_areas: Vec<Rect>,
}

/// The fallback track: a 12-point zig-zag across the play area
pub fn default_path_points() -> Vec<Vec2> {
    [
        (50.0, 360.0),
        (200.0, 360.0),
        (200.0, 200.0),
        (400.0, 200.0),
        (400.0, 500.0),
        (600.0, 500.0),
        (600.0, 300.0),
        (800.0, 300.0),
        (800.0, 600.0),
        (1000.0, 600.0),
        (1000.0, 200.0),
        (1230.0, 200.0),
    ]
    .into_iter()
    .map(|(x, y)| Vec2::new(x, y))
    .collect()
}

/// Immutable level geometry
#[derive(Debug, Clone)]
pub struct Map {
    path: Path,
    spawn_point: Vec2,
    end_point: Vec2,
    placeable_areas: Vec<Rect>,
}

impl Default for Map {
    fn default() -> Self {
        Self::from_path(default_path_points())
    }
}

impl Map {
    /// Build a map whose spawn and end markers sit on the first and last waypoints
    pub fn from_path(points: Vec<Vec2>) -> Self {
        let spawn_point = points.first().copied().unwrap_or(Vec2::ZERO);
        let end_point = points.last().copied().unwrap_or(Vec2::ZERO);
        Self {
            path: Path::new(points),
            spawn_point,
            end_point,
            placeable_areas: Vec::new(),
        }
    }

    /// Validate map data; movement is undefined for fewer than two waypoints
    pub fn from_data(data: MapData) -> Result<Self, DataError> {
        if data.path.len() < 2 {
            return Err(DataError::PathTooShort(data.path.len()));
        }
        if data.path.iter().any(|p| !p.is_finite()) {
            return Err(DataError::NonFinitePoint);
        }
        let mut map = Self::from_path(data.path);
        if let Some(spawn) = data.spawn_point {
            map.spawn_point = spawn;
        }
        if let Some(end) = data.end_point {
            map.end_point = end;
        }
        map.placeable_areas = data.placeable_areas;
        Ok(map)
    }

    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let data: MapData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    /// Load a map file, falling back to the built-in track on any failure
    pub fn load_or_default(file: impl AsRef<std::path::Path>) -> Self {
        let file = file.as_ref();
        let result = std::fs::read_to_string(file)
            .map_err(DataError::from)
            .and_then(|json| Self::from_json(&json));
        match result {
            Ok(map) => {
                log::info!("Loaded map {} ({} waypoints)", file.display(), map.path.len());
                map
            }
            Err(e) => {
                log::warn!("Map {} unavailable ({}), using default path", file.display(), e);
                Self::default()
            }
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn spawn_point(&self) -> Vec2 {
        self.spawn_point
    }

    #[inline]
    pub fn end_point(&self) -> Vec2 {
        self.end_point
    }

    pub fn placeable_areas(&self) -> &[Rect] {
        &self.placeable_areas
    }

    /// Check whether a tower of `tower_radius` fits at `position`
    ///
    /// Rejected when the tower would overlap the path band, crowd the spawn
    /// or end marker, overlap another tower, or poke outside the play area.
    /// When the map lists placeable areas the center must also fall in one.
    pub fn can_place_tower(&self, position: Vec2, towers: &[Tower], tower_radius: f32) -> bool {
        if !position.is_finite() {
            return false;
        }

        if distance_to_path(position, self.path.points()) < tower_radius + PATH_HALF_WIDTH {
            return false;
        }

        let marker_clearance = tower_radius + ENDPOINT_CLEARANCE;
        if position.distance(self.spawn_point) < marker_clearance
            || position.distance(self.end_point) < marker_clearance
        {
            return false;
        }

        let min_spacing = 2.0 * tower_radius;
        if towers
            .iter()
            .any(|t| position.distance(t.position) < min_spacing)
        {
            return false;
        }

        if position.x - tower_radius < 0.0
            || position.y - tower_radius < 0.0
            || position.x + tower_radius > PLAY_AREA_WIDTH
            || position.y + tower_radius > PLAY_AREA_HEIGHT
        {
            return false;
        }

        self.placeable_areas.is_empty() || self.placeable_areas.iter().any(|r| r.contains(position))
    }
}
