//! Who was fastest where: the full track breakdown over a session.
//!
//! Steps:
//! 1. Pick the track layout (circuit centerline, else fastest lap trace)
//! 2. Split it into near-equal-length segments
//! 3. Gather each driver's fastest-lap telemetry, recording skipped drivers
//! 4. Attribute every segment to the fastest driver at its midpoint

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo_utils::direction_at;
use crate::segments::{
    AttributionConfig, AttributionReport, DriverOutcome, SegmentConfig, SegmentRow, SkipReason,
    TrackSegment, attribute_segments, segment_rows, segment_track,
};
use crate::session::{
    CenterlineSource, LapSelector, TelemetryProvider, driver_lap_telemetry, track_centerline,
};
use crate::{Bounds, DriverObservation, TrackPoint};

/// Centerline points to look ahead when taking the direction of travel.
const DIRECTION_LOOKAHEAD: usize = 5;

/// Result of a track breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackBreakdown {
    pub centerline_source: CenterlineSource,
    pub centerline: Vec<TrackPoint>,
    pub segments: Vec<TrackSegment>,
    pub report: AttributionReport,
}

impl TrackBreakdown {
    /// Rows for tabular export, one per segment.
    pub fn rows(&self) -> Vec<SegmentRow> {
        segment_rows(&self.segments, &self.report.attributions)
    }

    /// Plot extent of the track layout.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.centerline)
    }

    /// Layout bounds grown by `margin` meters on every side.
    pub fn plot_extent(&self, margin: f64) -> Option<Bounds> {
        self.bounds().map(|b| b.padded(margin))
    }

    /// Start of the layout and the unit direction of travel there.
    ///
    /// `None` when the layout does not move away from its first point.
    pub fn race_direction(&self) -> Option<(TrackPoint, TrackPoint)> {
        let start = *self.centerline.first()?;
        let lookahead = DIRECTION_LOOKAHEAD.min(self.centerline.len() - 1);
        direction_at(&self.centerline, 0, lookahead).map(|dir| (start, dir))
    }
}

/// Run the full breakdown against a session.
///
/// Drivers without a usable fastest lap are skipped and listed in
/// `report.outcomes`. Fails only when no track layout is available or the
/// layout is degenerate.
pub fn track_breakdown<P: TelemetryProvider + ?Sized>(
    provider: &P,
    segment_config: &SegmentConfig,
    attribution_config: &AttributionConfig,
) -> Result<TrackBreakdown> {
    let (centerline, centerline_source) = track_centerline(provider)?;
    let segments = segment_track(&centerline, segment_config)?;
    log::info!("[Breakdown] Divided track into {} segments", segments.len());

    let drivers = provider.drivers();
    log::info!("[Breakdown] Found {} drivers in the session", drivers.len());

    let mut observations = Vec::with_capacity(drivers.len());
    let mut load_failures = Vec::new();
    for driver in &drivers {
        match driver_lap_telemetry(provider, driver, LapSelector::Fastest) {
            Ok(samples) => {
                observations.push(DriverObservation::new(driver.clone(), samples.to_vec()));
            }
            Err(e) => {
                log::warn!("[Breakdown] Skipping {}: {}", driver, e);
                load_failures.push(DriverOutcome::Skipped {
                    driver: driver.clone(),
                    reason: SkipReason::from_error(&e),
                });
            }
        }
    }

    let mut report = attribute_segments(&segments, &observations, attribution_config);

    // Keep outcomes in results order regardless of where a driver dropped out
    report.outcomes.extend(load_failures);
    let position: HashMap<&str, usize> = drivers
        .iter()
        .enumerate()
        .map(|(i, d)| (d.as_str(), i))
        .collect();
    report
        .outcomes
        .sort_by_key(|o| position.get(o.driver()).copied().unwrap_or(usize::MAX));

    Ok(TrackBreakdown {
        centerline_source,
        centerline,
        segments,
        report,
    })
}
