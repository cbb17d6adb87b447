//! Planar geometry utilities for circuit coordinates.
//!
//! Circuit positions are already projected onto a plane, so all distances
//! here are plain Euclidean.

use crate::TrackPoint;

/// Euclidean distance between two points.
pub fn euclidean_distance(a: &TrackPoint, b: &TrackPoint) -> f64 {
    distance_sq(a, b).sqrt()
}

/// Squared Euclidean distance. Used for nearest-point comparisons.
#[inline]
pub fn distance_sq(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Total length of a polyline (sum of consecutive point distances).
pub fn polyline_length(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| euclidean_distance(&w[0], &w[1]))
        .sum()
}

/// Distance along the polyline at each point, starting at 0.
pub fn cumulative_distances(points: &[TrackPoint]) -> Vec<f64> {
    let mut result = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += euclidean_distance(&points[i - 1], p);
        }
        result.push(total);
    }
    result
}

/// Unit direction of travel at `index`, looking `lookahead` points ahead.
///
/// Used to place a race-direction marker on track maps.
pub fn direction_at(points: &[TrackPoint], index: usize, lookahead: usize) -> Option<TrackPoint> {
    let from = points.get(index)?;
    let to = points.get(index + lookahead)?;
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let norm = (dx * dx + dy * dy).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(TrackPoint::new(dx / norm, dy / norm))
}
