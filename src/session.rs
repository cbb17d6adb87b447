//! Session context: laps, telemetry and circuit information.
//!
//! A [`Session`] is loaded once from an exported JSON file and passed
//! explicitly to every analysis that needs telemetry. Analyses accept any
//! [`TelemetryProvider`], so tests can supply small hand-built sessions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InsightsError, OptionExt, Result};
use crate::{TelemetrySample, TrackPoint};

/// Minimum points a centerline needs to be usable.
const MIN_CENTERLINE_POINTS: usize = 2;

/// Event metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionInfo {
    pub event_name: String,
    pub year: i32,
    /// Session kind, e.g. "Q", "SQ", "R"
    pub session: String,
}

impl fmt::Display for SessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.event_name, self.year, self.session)
    }
}

/// A single lap with its telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lap {
    pub driver: String,
    pub lap_number: u32,
    /// Lap time in seconds; `None` for untimed laps (in/out laps, deleted laps)
    #[serde(default)]
    pub lap_time: Option<f64>,
    #[serde(default)]
    pub team: Option<String>,
    /// Time from lap start to the end of sector 1 (seconds)
    #[serde(default)]
    pub sector1_time: Option<f64>,
    /// Time from lap start to the end of sector 2 (seconds)
    #[serde(default)]
    pub sector2_time: Option<f64>,
    #[serde(default)]
    pub telemetry: Vec<TelemetrySample>,
}

impl Lap {
    pub fn has_telemetry(&self) -> bool {
        !self.telemetry.is_empty()
    }

    /// Position trace of the lap, skipping non-finite samples.
    pub fn position_trace(&self) -> Vec<TrackPoint> {
        self.telemetry
            .iter()
            .map(TelemetrySample::position)
            .filter(TrackPoint::is_finite)
            .collect()
    }
}

/// A numbered corner of the circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    pub number: u32,
    /// Suffix for split corners such as "13A"
    #[serde(default)]
    pub letter: String,
    /// Distance from the start line (meters)
    pub distance: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Corner {
    /// Display label, e.g. "Turn 13" or "Turn 13A".
    pub fn label(&self) -> String {
        format!("Turn {}{}", self.number, self.letter)
    }

    /// Match "Turn 13", "turn 13a", "13" or "13A".
    pub fn matches(&self, name: &str) -> bool {
        let trimmed = name.trim();
        let short = trimmed
            .strip_prefix("Turn")
            .or_else(|| trimmed.strip_prefix("turn"))
            .or_else(|| trimmed.strip_prefix("TURN"))
            .unwrap_or(trimmed)
            .trim();
        let own = format!("{}{}", self.number, self.letter);
        short.eq_ignore_ascii_case(&own)
    }
}

/// Circuit layout information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitInfo {
    /// Ordered centerline points
    pub centerline: Vec<TrackPoint>,
    pub corners: Vec<Corner>,
}

impl CircuitInfo {
    /// Find a corner by label (see [`Corner::matches`]).
    pub fn corner(&self, name: &str) -> Option<&Corner> {
        self.corners.iter().find(|c| c.matches(name))
    }
}

/// Which lap of a driver to analyse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LapSelector {
    /// Minimum lap time among the driver's timed laps
    #[default]
    Fastest,
    /// A specific lap number
    Number(u32),
    /// Counting back from the last recorded lap: 1 = last, 2 = second last
    FromEnd(usize),
}

impl fmt::Display for LapSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LapSelector::Fastest => f.write_str("fastest"),
            LapSelector::Number(n) => write!(f, "{}", n),
            LapSelector::FromEnd(k) => write!(f, "-{}", k),
        }
    }
}

impl std::str::FromStr for LapSelector {
    type Err = String;

    /// Parse "fastest", "12" (lap number) or "-2" (second last lap).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("fastest") {
            return Ok(LapSelector::Fastest);
        }
        if let Some(back) = s.strip_prefix('-') {
            return match back.parse::<usize>() {
                Ok(k) if k > 0 => Ok(LapSelector::FromEnd(k)),
                _ => Err(format!("invalid lap offset '{}'", s)),
            };
        }
        s.parse::<u32>()
            .map(LapSelector::Number)
            .map_err(|_| format!("invalid lap selector '{}'", s))
    }
}

/// Access to session data.
pub trait TelemetryProvider {
    /// Driver abbreviations in results order.
    fn drivers(&self) -> Vec<String>;

    /// All laps of a driver, in the order they were driven.
    fn laps_for(&self, driver: &str) -> Vec<&Lap>;

    /// Circuit information, if the export carries it.
    fn circuit_info(&self) -> Option<&CircuitInfo>;

    /// Fastest timed lap across all drivers.
    fn fastest_lap(&self) -> Option<&Lap> {
        self.drivers()
            .iter()
            .flat_map(|d| self.laps_for(d))
            .filter(|lap| lap.lap_time.is_some_and(f64::is_finite))
            .fold(None, |best: Option<&Lap>, lap| match best {
                Some(b) if b.lap_time <= lap.lap_time => Some(b),
                _ => Some(lap),
            })
    }
}

/// A loaded session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub info: SessionInfo,
    /// Driver abbreviations in results order
    pub drivers: Vec<String>,
    pub laps: Vec<Lap>,
    pub circuit: Option<CircuitInfo>,
}

impl Session {
    /// Parse a session from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut session: Session = serde_json::from_str(json)?;
        if session.drivers.is_empty() {
            // Fall back to first appearance order in the lap list
            for lap in &session.laps {
                if !session.drivers.contains(&lap.driver) {
                    session.drivers.push(lap.driver.clone());
                }
            }
        }
        Ok(session)
    }

    /// Load a session export from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let session = Self::from_json_str(&content)?;
        log::info!(
            "[Session] Loaded {} ({} drivers, {} laps) from {}",
            session.info,
            session.drivers.len(),
            session.laps.len(),
            path.display()
        );
        Ok(session)
    }
}

impl TelemetryProvider for Session {
    fn drivers(&self) -> Vec<String> {
        self.drivers.clone()
    }

    fn laps_for(&self, driver: &str) -> Vec<&Lap> {
        self.laps.iter().filter(|lap| lap.driver == driver).collect()
    }

    fn circuit_info(&self) -> Option<&CircuitInfo> {
        self.circuit.as_ref()
    }
}

/// Select one lap of a driver.
pub fn select_lap<'a, P: TelemetryProvider + ?Sized>(
    provider: &'a P,
    driver: &str,
    selector: LapSelector,
) -> Result<&'a Lap> {
    let laps = provider.laps_for(driver);
    if laps.is_empty() {
        return Err(InsightsError::NoLaps {
            driver: driver.to_string(),
        });
    }

    let lap = match selector {
        LapSelector::Fastest => laps
            .iter()
            .filter(|lap| lap.lap_time.is_some_and(f64::is_finite))
            .fold(None, |best: Option<&&Lap>, lap| match best {
                Some(b) if b.lap_time <= lap.lap_time => Some(b),
                _ => Some(lap),
            })
            .copied(),
        LapSelector::Number(n) => laps.iter().find(|lap| lap.lap_number == n).copied(),
        LapSelector::FromEnd(k) => laps
            .len()
            .checked_sub(k)
            .and_then(|i| laps.get(i))
            .copied(),
    };

    lap.ok_or_else(|| InsightsError::LapNotFound {
        driver: driver.to_string(),
        selector: selector.to_string(),
    })
}

/// Telemetry of a driver's lap.
///
/// Fails with a missing-data error when the driver has no laps, the lap does
/// not exist, or the lap carries no telemetry.
pub fn driver_lap_telemetry<'a, P: TelemetryProvider + ?Sized>(
    provider: &'a P,
    driver: &str,
    selector: LapSelector,
) -> Result<&'a [TelemetrySample]> {
    let lap = select_lap(provider, driver, selector)?;
    lap.has_telemetry()
        .then_some(lap.telemetry.as_slice())
        .ok_or_no_telemetry(driver)
}

/// Where the track centerline came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CenterlineSource {
    /// Circuit layout from the session export
    Circuit,
    /// Position trace of the session's fastest lap
    FastestLap { driver: String, lap_number: u32 },
}

/// Circuit centerline, falling back to the fastest lap's position trace.
pub fn track_centerline<P: TelemetryProvider + ?Sized>(
    provider: &P,
) -> Result<(Vec<TrackPoint>, CenterlineSource)> {
    if let Some(circuit) = provider.circuit_info() {
        if circuit.centerline.len() >= MIN_CENTERLINE_POINTS {
            log::info!("[Session] Using circuit info for track layout");
            return Ok((circuit.centerline.clone(), CenterlineSource::Circuit));
        }
    }

    log::warn!("[Session] Circuit info not available, using fastest lap for track layout");
    let lap = provider
        .fastest_lap()
        .ok_or(InsightsError::CenterlineUnavailable)?;
    let trace = lap.position_trace();
    if trace.len() < MIN_CENTERLINE_POINTS {
        return Err(InsightsError::CenterlineUnavailable);
    }
    Ok((
        trace,
        CenterlineSource::FastestLap {
            driver: lap.driver.clone(),
            lap_number: lap.lap_number,
        },
    ))
}
