//! # F1 Insights
//!
//! Formula 1 telemetry analysis library.
//!
//! This library provides:
//! - Track segmentation into near-equal-length segments
//! - Fastest-driver attribution per segment (who was quickest where)
//! - Slipstream detection over straight sections
//! - Speed trace smoothing, lap time deltas and speed envelopes
//! - A session context loaded from exported telemetry files
//!
//! ## Features
//!
//! - **`parallel`** - Run per-driver attribution lookups with rayon
//! - **`synthetic`** - Deterministic synthetic circuit generator for tests and benches
//!
//! ## Quick Start
//!
//! ```rust
//! use f1_insights::{TrackPoint, TelemetrySample, DriverObservation};
//! use f1_insights::segments::{
//!     AttributionConfig, SegmentConfig, attribute_segments, segment_track,
//! };
//!
//! let track: Vec<TrackPoint> = (0..5).map(|i| TrackPoint::new(i as f64 * 10.0, 0.0)).collect();
//! let segments = segment_track(&track, &SegmentConfig { target_segments: 2 }).unwrap();
//! assert_eq!(segments.len(), 2);
//!
//! let ver = DriverObservation::new("VER", vec![TelemetrySample::at(10.0, 0.0, 310.0)]);
//! let report = attribute_segments(&segments, &[ver], &AttributionConfig::default());
//! assert_eq!(report.attributions[0].fastest_driver.as_deref(), Some("VER"));
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{InsightsError, OptionExt, Result};

// Planar geometry helpers (distance, polyline length, bounds)
pub mod geo_utils;

// Configuration structs with documented defaults
pub mod config;
pub use config::AnalysisConfig;

// Track segmentation and fastest-driver attribution
pub mod segments;
pub use segments::{
    AttributionConfig, AttributionReport, DriverOutcome, LeaderShare, NearestSearch,
    SegmentAttribution, SegmentConfig, SegmentRow, SkipReason, TrackSegment, attribute_segments,
    segment_track,
};

// Session context (explicit replacement for a global telemetry session)
pub mod session;
pub use session::{
    CenterlineSource, CircuitInfo, Corner, Lap, LapSelector, Session, SessionInfo,
    TelemetryProvider, driver_lap_telemetry, track_centerline,
};

// End-to-end track breakdown over a session
pub mod breakdown;
pub use breakdown::{TrackBreakdown, track_breakdown};

// Slipstream, smoothing, delta and envelope analysis
pub mod analysis;

// Synthetic circuit generator for testing and benchmarking
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A planar coordinate on the circuit.
///
/// Units follow the telemetry source (FastF1-style exports use 1/10 m).
///
/// # Example
/// ```
/// use f1_insights::TrackPoint;
/// let p = TrackPoint::new(120.0, -45.5);
/// assert!(p.is_finite());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
}

impl TrackPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check that both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for TrackPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One telemetry sample from a lap.
///
/// Mirrors the merged car/position channels of a lap telemetry export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    /// Distance driven since the start of the lap (meters)
    #[serde(default)]
    pub distance: f64,
    /// Session time of the sample (seconds)
    #[serde(default)]
    pub time: f64,
    pub x: f64,
    pub y: f64,
    /// Speed in km/h
    pub speed: f64,
    /// Gap to the car ahead in meters, when the export provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_to_car_ahead: Option<f64>,
}

impl TelemetrySample {
    /// Create a sample that only carries position and speed.
    pub fn at(x: f64, y: f64, speed: f64) -> Self {
        Self {
            distance: 0.0,
            time: 0.0,
            x,
            y,
            speed,
            distance_to_car_ahead: None,
        }
    }

    pub fn position(&self) -> TrackPoint {
        TrackPoint::new(self.x, self.y)
    }
}

/// The telemetry of one driver's lap used for segment attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverObservation {
    /// Driver abbreviation (e.g. "VER")
    pub driver: String,
    pub samples: Vec<TelemetrySample>,
}

impl DriverObservation {
    pub fn new(driver: impl Into<String>, samples: Vec<TelemetrySample>) -> Self {
        Self {
            driver: driver.into(),
            samples,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Axis-aligned bounds of a set of track points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from track points.
    pub fn from_points(points: &[TrackPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;

        for p in points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        Some(Self {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Grow the bounds by `margin` on every side (plot extents).
    pub fn padded(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            max_x: self.max_x + margin,
            min_y: self.min_y - margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn center(&self) -> TrackPoint {
        TrackPoint::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}
