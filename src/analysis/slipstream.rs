//! Slipstream detection over a straight section.
//!
//! A driver is considered to benefit from a draft when, within the section,
//! the gap to the car ahead drops below a distance threshold while the
//! speed rises above a speed threshold.

use serde::{Deserialize, Serialize};

use crate::error::{InsightsError, Result};
use crate::segments::SkipReason;
use crate::session::{CircuitInfo, LapSelector, TelemetryProvider, driver_lap_telemetry};
use crate::TelemetrySample;

/// Thresholds for slipstream detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlipstreamThresholds {
    /// Gap to the car ahead must drop below this (meters). Default: 50.0
    pub max_gap_m: f64,
    /// Top speed must exceed this (km/h). Default: 300.0
    pub min_speed_kph: f64,
}

impl Default for SlipstreamThresholds {
    fn default() -> Self {
        Self {
            max_gap_m: 50.0,
            min_speed_kph: 300.0,
        }
    }
}

/// Result of slipstream analysis for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlipstreamResult {
    pub detected: bool,
    /// Smallest gap to the car ahead, if any sample carried one
    pub min_gap: Option<f64>,
    /// Highest speed in the section
    pub max_speed: Option<f64>,
}

/// A stretch of track between two corners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSection {
    pub start_corner: String,
    pub end_corner: String,
}

impl TrackSection {
    pub fn new(start_corner: impl Into<String>, end_corner: impl Into<String>) -> Self {
        Self {
            start_corner: start_corner.into(),
            end_corner: end_corner.into(),
        }
    }
}

impl std::fmt::Display for TrackSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start_corner, self.end_corner)
    }
}

/// Outcome of analysing one driver over one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    Analysed {
        driver: String,
        section: TrackSection,
        result: SlipstreamResult,
    },
    /// Driver had no usable lap
    DriverSkipped { driver: String, reason: SkipReason },
    /// A corner name did not exist or the section held no samples
    SectionSkipped {
        driver: String,
        section: TrackSection,
        reason: String,
    },
}

/// Telemetry samples between two corners, inclusive of both distances.
///
/// Fails with [`InsightsError::CornerNotFound`] if either corner is unknown.
pub fn straight_section(
    telemetry: &[TelemetrySample],
    start_corner: &str,
    end_corner: &str,
    circuit: &CircuitInfo,
) -> Result<Vec<TelemetrySample>> {
    let start = circuit
        .corner(start_corner)
        .ok_or_else(|| InsightsError::CornerNotFound(start_corner.to_string()))?;
    let end = circuit
        .corner(end_corner)
        .ok_or_else(|| InsightsError::CornerNotFound(end_corner.to_string()))?;

    Ok(telemetry
        .iter()
        .filter(|s| s.distance >= start.distance && s.distance <= end.distance)
        .copied()
        .collect())
}

/// Classify a section for slipstream.
///
/// Missing or NaN gaps are ignored. With no gap or no speed data nothing is
/// detected.
pub fn analyze_slipstream(
    section: &[TelemetrySample],
    thresholds: &SlipstreamThresholds,
) -> SlipstreamResult {
    let min_gap = section
        .iter()
        .filter_map(|s| s.distance_to_car_ahead)
        .filter(|g| !g.is_nan())
        .reduce(f64::min);
    let max_speed = section
        .iter()
        .map(|s| s.speed)
        .filter(|v| !v.is_nan())
        .reduce(f64::max);

    let detected = match (min_gap, max_speed) {
        (Some(gap), Some(speed)) => gap < thresholds.max_gap_m && speed > thresholds.min_speed_kph,
        _ => false,
    };

    SlipstreamResult {
        detected,
        min_gap,
        max_speed,
    }
}

/// Analyse each driver's fastest lap over each section.
///
/// Missing drivers and sections are logged and reported, never fatal. Fails
/// only when the session carries no circuit information at all.
pub fn slipstream_survey<P: TelemetryProvider + ?Sized>(
    provider: &P,
    drivers: &[String],
    sections: &[TrackSection],
    thresholds: &SlipstreamThresholds,
) -> Result<Vec<SectionOutcome>> {
    let circuit = provider
        .circuit_info()
        .ok_or(InsightsError::CircuitInfoUnavailable)?;

    let mut outcomes = Vec::with_capacity(drivers.len() * sections.len());

    for driver in drivers {
        log::info!("[Slipstream] Analyzing {}", driver);
        let telemetry = match driver_lap_telemetry(provider, driver, LapSelector::Fastest) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("[Slipstream] No telemetry data found for {}: {}", driver, e);
                outcomes.push(SectionOutcome::DriverSkipped {
                    driver: driver.clone(),
                    reason: SkipReason::from_error(&e),
                });
                continue;
            }
        };

        for section in sections {
            let section_samples =
                straight_section(telemetry, &section.start_corner, &section.end_corner, circuit);
            let samples = match section_samples {
                Ok(samples) if samples.is_empty() => {
                    log::warn!(
                        "[Slipstream] No telemetry data for {} between {}",
                        driver,
                        section
                    );
                    outcomes.push(SectionOutcome::SectionSkipped {
                        driver: driver.clone(),
                        section: section.clone(),
                        reason: "no samples in section".to_string(),
                    });
                    continue;
                }
                Ok(samples) => samples,
                Err(e) => {
                    log::warn!("[Slipstream] {} ({})", e, section);
                    outcomes.push(SectionOutcome::SectionSkipped {
                        driver: driver.clone(),
                        section: section.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let result = analyze_slipstream(&samples, thresholds);
            log::debug!(
                "[Slipstream] {} {}: min gap {:?}, max speed {:?}, detected {}",
                driver,
                section,
                result.min_gap,
                result.max_speed,
                result.detected
            );
            outcomes.push(SectionOutcome::Analysed {
                driver: driver.clone(),
                section: section.clone(),
                result,
            });
        }
    }

    Ok(outcomes)
}
