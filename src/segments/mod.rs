//! # Track Segmentation
//!
//! Divides a circuit centerline into near-equal-length contiguous segments
//! and attributes each segment to the driver who was fastest at its midpoint.
//!
//! ## Algorithm
//! 1. Sum the Euclidean lengths of the centerline to get the track length `L`
//! 2. Target segment length is `L / N` for `N` requested segments
//! 3. Walk the points once, cutting whenever the accumulated length reaches
//!    the target (at most `N - 1` such cuts) and at the final point
//! 4. The cut point is shared by both neighbouring segments, so the segments
//!    reconstruct the centerline exactly
//! 5. Each segment's midpoint is the point at index `len / 2`
//!
//! Cuts only happen at existing samples, so segment lengths vary around the
//! target. A remainder of fewer than two points after the final cut is only
//! ever the shared endpoint, and is discarded.

mod attribution;
mod export;
mod rtree;

use serde::{Deserialize, Serialize};

use crate::error::{InsightsError, Result};
use crate::geo_utils::{euclidean_distance, polyline_length};
use crate::TrackPoint;

pub use attribution::{
    AttributionConfig, AttributionReport, DriverOutcome, LeaderShare, NearestSearch,
    SegmentAttribution, SkipReason, attribute_segments,
};
pub use export::{SegmentRow, export_segments_csv, segment_rows, write_segments_csv};
pub use rtree::{IndexedSample, build_rtree};

/// Minimum points a retained segment must contain.
const MIN_SEGMENT_POINTS: usize = 2;

/// Configuration for track segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Number of segments to aim for. Actual count is never higher.
    /// Default: 80
    pub target_segments: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            target_segments: 80,
        }
    }
}

/// A contiguous piece of the circuit centerline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    /// Position of this segment in track order
    pub index: usize,
    /// Points of the segment; first and last are shared with neighbours
    pub points: Vec<TrackPoint>,
    /// Index of the first point in the source centerline
    pub start_index: usize,
    /// Index of the last point in the source centerline (inclusive)
    pub end_index: usize,
    /// Arc length of this segment
    pub length: f64,
    /// Arc length of the centerline before this segment starts
    pub start_distance: f64,
}

impl TrackSegment {
    /// Index of the midpoint within `points`.
    pub fn midpoint_index(&self) -> usize {
        self.points.len() / 2
    }

    /// The point at the floor-half index of the segment.
    pub fn midpoint(&self) -> TrackPoint {
        self.points[self.midpoint_index()]
    }

    pub fn end_distance(&self) -> f64 {
        self.start_distance + self.length
    }
}

/// Split a centerline into near-equal-length segments.
///
/// Fails fast on degenerate input: fewer than two points, a zero target
/// count, or a non-finite coordinate.
///
/// # Example
/// ```
/// use f1_insights::TrackPoint;
/// use f1_insights::segments::{segment_track, SegmentConfig};
///
/// let track: Vec<TrackPoint> = (0..5).map(|i| TrackPoint::new(i as f64 * 10.0, 0.0)).collect();
/// let segments = segment_track(&track, &SegmentConfig { target_segments: 2 }).unwrap();
///
/// assert_eq!(segments[0].midpoint(), TrackPoint::new(10.0, 0.0));
/// assert_eq!(segments[1].midpoint(), TrackPoint::new(30.0, 0.0));
/// ```
pub fn segment_track(points: &[TrackPoint], config: &SegmentConfig) -> Result<Vec<TrackSegment>> {
    validate_centerline(points)?;
    if config.target_segments == 0 {
        return Err(InsightsError::InvalidSegmentCount(config.target_segments));
    }

    let target_count = config.target_segments;
    let target_length = polyline_length(points) / target_count as f64;
    let last = points.len() - 1;

    let mut segments: Vec<TrackSegment> = Vec::with_capacity(target_count);
    let mut start = 0;
    let mut accumulated = 0.0;
    let mut travelled = 0.0;

    for i in 1..=last {
        accumulated += euclidean_distance(&points[i - 1], &points[i]);

        // Keep room for the final segment so the count never exceeds the target
        let may_cut = segments.len() + 1 < target_count;
        if i == last || (may_cut && accumulated >= target_length) {
            let segment_points = &points[start..=i];
            if segment_points.len() >= MIN_SEGMENT_POINTS {
                segments.push(TrackSegment {
                    index: segments.len(),
                    points: segment_points.to_vec(),
                    start_index: start,
                    end_index: i,
                    length: accumulated,
                    start_distance: travelled,
                });
            }
            travelled += accumulated;
            start = i;
            accumulated = 0.0;
        }
    }

    log::debug!(
        "[Segments] {} points -> {} segments (target {}, {:.1} per segment)",
        points.len(),
        segments.len(),
        target_count,
        target_length
    );

    Ok(segments)
}

/// Rebuild the centerline from its segments, dropping shared boundary points.
pub fn reconstruct_polyline(segments: &[TrackSegment]) -> Vec<TrackPoint> {
    let mut points = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        let skip = if i == 0 { 0 } else { 1 };
        points.extend(segment.points.iter().skip(skip).copied());
    }
    points
}

fn validate_centerline(points: &[TrackPoint]) -> Result<()> {
    if points.len() < MIN_SEGMENT_POINTS {
        return Err(InsightsError::InsufficientPoints {
            context: "track centerline".to_string(),
            point_count: points.len(),
            minimum_required: MIN_SEGMENT_POINTS,
        });
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(InsightsError::NonFiniteCoordinate { index });
    }
    Ok(())
}
