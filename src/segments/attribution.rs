//! Fastest-driver attribution per track segment.
//!
//! For every driver and every segment, the telemetry sample nearest to the
//! segment midpoint supplies that driver's speed there. A segment keeps the
//! driver with the strictly highest speed, so on equal speeds the driver
//! processed first wins.

use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::TrackSegment;
use super::rtree::{build_rtree, nearest_sample};
use crate::error::InsightsError;
use crate::geo_utils::distance_sq;
use crate::{DriverObservation, TelemetrySample, TrackPoint};

/// Strategy for finding the sample nearest a segment midpoint.
///
/// Both strategies return the same sample (lowest index on distance ties).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NearestSearch {
    /// Scan every sample. O(samples) per query.
    Linear,
    /// Query an R-tree built once per driver.
    #[default]
    RTree,
}

impl NearestSearch {
    pub fn as_str(&self) -> &'static str {
        match self {
            NearestSearch::Linear => "linear",
            NearestSearch::RTree => "rtree",
        }
    }
}

impl fmt::Display for NearestSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NearestSearch {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(NearestSearch::Linear),
            "rtree" | "r-tree" => Ok(NearestSearch::RTree),
            other => Err(format!("unknown nearest search strategy '{}'", other)),
        }
    }
}

/// Configuration for segment attribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// Nearest-sample search strategy. Default: R-tree
    pub search: NearestSearch,
}

/// Fastest driver recorded for one segment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentAttribution {
    /// `None` when no driver exceeded 0 km/h at this segment
    pub fastest_driver: Option<String>,
    /// Speed of the fastest driver in km/h, 0 if unattributed
    pub fastest_speed: f64,
}

/// Why a driver did not contribute to attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Driver has no laps in the session
    NoLaps,
    /// Requested lap does not exist
    LapNotFound,
    /// Lap exists but carries no telemetry
    NoTelemetry,
    /// Telemetry has no finite position samples
    NoPositionData,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoLaps => "no laps",
            SkipReason::LapNotFound => "lap not found",
            SkipReason::NoTelemetry => "no telemetry",
            SkipReason::NoPositionData => "no position data",
        }
    }

    /// Map a lap lookup failure onto a skip reason.
    pub fn from_error(error: &InsightsError) -> Self {
        match error {
            InsightsError::NoLaps { .. } => SkipReason::NoLaps,
            InsightsError::LapNotFound { .. } => SkipReason::LapNotFound,
            _ => SkipReason::NoTelemetry,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-driver result of an attribution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriverOutcome {
    /// Driver data was compared against every segment
    Processed { driver: String, segments_led: usize },
    /// Driver was left out
    Skipped { driver: String, reason: SkipReason },
}

impl DriverOutcome {
    pub fn driver(&self) -> &str {
        match self {
            DriverOutcome::Processed { driver, .. } | DriverOutcome::Skipped { driver, .. } => {
                driver
            }
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, DriverOutcome::Skipped { .. })
    }
}

/// Number and share of segments a driver was fastest in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderShare {
    pub driver: String,
    pub segments: usize,
    /// Share of all segments, 0-100
    pub percent: f64,
}

/// Attribution for every segment plus what happened to each driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributionReport {
    /// One entry per segment, in segment order
    pub attributions: Vec<SegmentAttribution>,
    /// One entry per driver, in processing order
    pub outcomes: Vec<DriverOutcome>,
}

impl AttributionReport {
    /// Segments led per driver, most segments first.
    ///
    /// Drivers who led nothing are omitted. Equal counts keep the order in
    /// which drivers first lead a segment along the track.
    pub fn leader_shares(&self) -> Vec<LeaderShare> {
        let total = self.attributions.len();
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for driver in self
            .attributions
            .iter()
            .filter_map(|a| a.fastest_driver.as_deref())
        {
            let count = counts.entry(driver).or_insert(0);
            if *count == 0 {
                order.push(driver);
            }
            *count += 1;
        }

        let mut shares: Vec<LeaderShare> = order
            .into_iter()
            .map(|driver| {
                let segments = counts[driver];
                LeaderShare {
                    driver: driver.to_string(),
                    segments,
                    percent: segments as f64 / total as f64 * 100.0,
                }
            })
            .collect();
        shares.sort_by(|a, b| b.segments.cmp(&a.segments));
        shares
    }

    /// Segments no driver was attributed to.
    pub fn unattributed_count(&self) -> usize {
        self.attributions
            .iter()
            .filter(|a| a.fastest_driver.is_none())
            .count()
    }

    /// Lowest positive and highest attributed speed, for colour scaling.
    pub fn speed_range(&self) -> Option<(f64, f64)> {
        let speeds = self
            .attributions
            .iter()
            .map(|a| a.fastest_speed)
            .filter(|s| *s > 0.0);
        speeds.fold(None, |range, s| match range {
            None => Some((s, s)),
            Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &DriverOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }
}

/// Attribute every segment to the fastest driver at its midpoint.
///
/// Drivers are processed in slice order. Drivers without usable samples are
/// reported as skipped and never change an attribution.
pub fn attribute_segments(
    segments: &[TrackSegment],
    observations: &[DriverObservation],
    config: &AttributionConfig,
) -> AttributionReport {
    let midpoints: Vec<TrackPoint> = segments.iter().map(|s| s.midpoint()).collect();

    // Per-driver lookups are independent; the merge below stays sequential
    #[cfg(feature = "parallel")]
    let driver_speeds: Vec<Result<Vec<f64>, SkipReason>> = observations
        .par_iter()
        .map(|obs| speeds_at_midpoints(&obs.samples, &midpoints, config.search))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let driver_speeds: Vec<Result<Vec<f64>, SkipReason>> = observations
        .iter()
        .map(|obs| speeds_at_midpoints(&obs.samples, &midpoints, config.search))
        .collect();

    let mut attributions = vec![SegmentAttribution::default(); segments.len()];
    let mut processed: Vec<(usize, &str)> = Vec::new();
    let mut outcomes: Vec<DriverOutcome> = Vec::with_capacity(observations.len());

    for (obs, speeds) in observations.iter().zip(driver_speeds) {
        match speeds {
            Ok(speeds) => {
                for (attribution, speed) in attributions.iter_mut().zip(speeds) {
                    if speed > attribution.fastest_speed {
                        attribution.fastest_speed = speed;
                        attribution.fastest_driver = Some(obs.driver.clone());
                    }
                }
                processed.push((outcomes.len(), &obs.driver));
                outcomes.push(DriverOutcome::Processed {
                    driver: obs.driver.clone(),
                    segments_led: 0,
                });
            }
            Err(reason) => {
                log::warn!("[Attribution] Skipping {}: {}", obs.driver, reason);
                outcomes.push(DriverOutcome::Skipped {
                    driver: obs.driver.clone(),
                    reason,
                });
            }
        }
    }

    // Leads are only final once every driver has been merged
    for (slot, driver) in processed {
        let led = attributions
            .iter()
            .filter(|a| a.fastest_driver.as_deref() == Some(driver))
            .count();
        if let DriverOutcome::Processed { segments_led, .. } = &mut outcomes[slot] {
            *segments_led = led;
        }
    }

    let report = AttributionReport {
        attributions,
        outcomes,
    };

    log::info!(
        "[Attribution] {} segments, {} drivers processed, {} skipped, {} unattributed",
        segments.len(),
        report.outcomes.len() - report.skipped().count(),
        report.skipped().count(),
        report.unattributed_count()
    );

    report
}

/// Speed of the sample nearest each midpoint for one driver.
fn speeds_at_midpoints(
    samples: &[TelemetrySample],
    midpoints: &[TrackPoint],
    search: NearestSearch,
) -> Result<Vec<f64>, SkipReason> {
    if samples.is_empty() {
        return Err(SkipReason::NoTelemetry);
    }
    if !samples.iter().any(|s| s.x.is_finite() && s.y.is_finite()) {
        return Err(SkipReason::NoPositionData);
    }

    let speeds = match search {
        NearestSearch::Linear => midpoints
            .iter()
            .filter_map(|mid| nearest_linear(samples, mid).map(|i| samples[i].speed))
            .collect(),
        NearestSearch::RTree => {
            let tree = build_rtree(samples);
            midpoints
                .iter()
                .filter_map(|mid| nearest_sample(&tree, [mid.x, mid.y]).map(|i| samples[i].speed))
                .collect()
        }
    };
    Ok(speeds)
}

/// First sample index at the minimum squared distance to `target`.
fn nearest_linear(samples: &[TelemetrySample], target: &TrackPoint) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, sample) in samples.iter().enumerate() {
        if !(sample.x.is_finite() && sample.y.is_finite()) {
            continue;
        }
        let d2 = distance_sq(&sample.position(), target);
        match best {
            Some((_, best_d2)) if d2 >= best_d2 => {}
            _ => best = Some((i, d2)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_linear_prefers_first_on_tie() {
        let samples = vec![
            TelemetrySample::at(-1.0, 0.0, 100.0),
            TelemetrySample::at(1.0, 0.0, 200.0),
        ];
        assert_eq!(nearest_linear(&samples, &TrackPoint::new(0.0, 0.0)), Some(0));
    }

    #[test]
    fn test_nearest_rtree_prefers_first_on_tie() {
        let samples = vec![
            TelemetrySample::at(5.0, 5.0, 90.0),
            TelemetrySample::at(1.0, 0.0, 100.0),
            TelemetrySample::at(-1.0, 0.0, 200.0),
        ];
        let tree = build_rtree(&samples);
        assert_eq!(nearest_sample(&tree, [0.0, 0.0]), Some(1));
    }

    #[test]
    fn test_nan_positions_are_ignored() {
        let samples = vec![
            TelemetrySample::at(f64::NAN, 0.0, 300.0),
            TelemetrySample::at(3.0, 0.0, 150.0),
        ];
        assert_eq!(nearest_linear(&samples, &TrackPoint::new(0.0, 0.0)), Some(1));
        let tree = build_rtree(&samples);
        assert_eq!(nearest_sample(&tree, [0.0, 0.0]), Some(1));
    }

    #[test]
    fn test_no_position_data_skips_driver() {
        let samples = vec![TelemetrySample::at(f64::NAN, f64::NAN, 300.0)];
        let midpoints = [TrackPoint::new(0.0, 0.0)];
        let result = speeds_at_midpoints(&samples, &midpoints, NearestSearch::Linear);
        assert_eq!(result, Err(SkipReason::NoPositionData));
    }
}
