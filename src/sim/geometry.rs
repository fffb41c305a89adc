//! Path geometry helpers
//!
//! Point-to-segment distance and polyline queries shared by placement
//! validation, sandbox spawning and bloon movement.

use glam::Vec2;

/// Segments shorter than this (squared) are treated as a single point
const DEGENERATE_SEGMENT_SQ: f32 = 0.0001;

/// Closest point to `p` on the segment `a`-`b`
///
/// Projects `p` onto the segment and clamps the projection parameter to
/// [0, 1]. A zero-length segment collapses to `a`.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let seg = b - a;
    let len_sq = seg.length_squared();
    if len_sq < DEGENERATE_SEGMENT_SQ {
        return a;
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    a + seg * t
}

/// Euclidean distance from `p` to the segment `a`-`b`
#[inline]
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    p.distance(closest_point_on_segment(p, a, b))
}

/// Where a point lands when projected onto a polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProjection {
    /// Index of the segment's starting waypoint
    pub segment: usize,
    /// Closest point on the polyline
    pub point: Vec2,
    /// Distance from the query point to `point`
    pub distance: f32,
}

/// Project `p` onto the nearest segment of `points`
///
/// Ties keep the earliest segment. Returns `None` for an empty polyline; a
/// single-point polyline projects onto that point.
pub fn nearest_point_on_path(p: Vec2, points: &[Vec2]) -> Option<PathProjection> {
    match points {
        [] => None,
        [only] => Some(PathProjection {
            segment: 0,
            point: *only,
            distance: p.distance(*only),
        }),
        _ => {
            let mut best: Option<PathProjection> = None;
            for (i, pair) in points.windows(2).enumerate() {
                let point = closest_point_on_segment(p, pair[0], pair[1]);
                let distance = p.distance(point);
                if best.is_none_or(|b| distance < b.distance) {
                    best = Some(PathProjection {
                        segment: i,
                        point,
                        distance,
                    });
                }
            }
            best
        }
    }
}

/// Minimum distance from `p` to any segment of `points`
pub fn distance_to_path(p: Vec2, points: &[Vec2]) -> f32 {
    nearest_point_on_path(p, points)
        .map(|proj| proj.distance)
        .unwrap_or(f32::INFINITY)
}

/// Total arc length of a polyline
pub fn path_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Point at `fraction` (0..=1) of the polyline's arc length
pub fn point_along_path(points: &[Vec2], fraction: f32) -> Option<Vec2> {
    let first = *points.first()?;
    let total = path_length(points);
    if total <= 0.0 {
        return Some(first);
    }

    let mut remaining = fraction.clamp(0.0, 1.0) * total;
    for pair in points.windows(2) {
        let len = pair[0].distance(pair[1]);
        if remaining <= len {
            if len <= 0.0 {
                return Some(pair[0]);
            }
            return Some(pair[0].lerp(pair[1], remaining / len));
        }
        remaining -= len;
    }
    points.last().copied()
}
