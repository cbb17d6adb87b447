//! Synthetic session generator for testing and benchmarking.
//!
//! Builds a closed circuit, a speed profile with slow corners and fast
//! straights, and per-driver laps whose pace is known up front. The known
//! pace order is the ground truth for attribution tests.
//!
//! Feature-gated behind `synthetic`.
//!
//! # Example
//!
//! ```rust
//! use f1_insights::synthetic::SyntheticScenario;
//!
//! let dataset = SyntheticScenario::with_driver_count(4).generate();
//! assert_eq!(dataset.session.drivers.len(), 4);
//! assert_eq!(dataset.expected_fastest_driver(), Some("VER"));
//! ```

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo_utils::{cumulative_distances, polyline_length};
use crate::session::{CircuitInfo, Corner, Lap, Session, SessionInfo};
use crate::{TelemetrySample, TrackPoint};

// ============================================================================
// Types
// ============================================================================

/// Shape and speed profile of the generated circuit.
#[derive(Debug, Clone)]
pub struct CircuitConfig {
    /// Lap length in meters.
    pub length_meters: f64,
    /// Number of corners (speed minima) around the lap.
    pub corner_count: usize,
    /// Telemetry sample spacing along the lap in meters.
    pub sample_spacing: f64,
    /// Top speed on straights (km/h).
    pub top_speed: f64,
    /// Apex speed in corners (km/h).
    pub apex_speed: f64,
}

/// Scenario configuration for generating a synthetic session.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    pub circuit: CircuitConfig,
    /// Number of drivers. Driver 0 is the fastest, pace drops with index.
    pub driver_count: usize,
    /// Timed laps per driver.
    pub laps_per_driver: usize,
    /// Position noise standard deviation in meters.
    pub position_noise_sigma: f64,
    /// Attach circuit info (centerline and corners) to the session.
    pub include_circuit_info: bool,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

/// Metadata about a generated dataset.
#[derive(Debug, Clone)]
pub struct DatasetMetadata {
    pub total_laps: usize,
    pub total_samples: usize,
    /// Length of the generated centerline in meters.
    pub lap_length: f64,
}

/// A synthetic session with ground truth.
pub struct SyntheticDataset {
    pub session: Session,
    /// Noise-free circuit centerline.
    pub centerline: Vec<TrackPoint>,
    /// `(driver, pace factor)` fastest first. Speeds are the profile speed
    /// times the pace factor.
    pub pace: Vec<(String, f64)>,
    pub metadata: DatasetMetadata,
}

impl SyntheticDataset {
    /// The driver with the highest pace factor.
    pub fn expected_fastest_driver(&self) -> Option<&str> {
        self.pace.first().map(|(d, _)| d.as_str())
    }
}

/// Abbreviations handed out to generated drivers, in order.
const DRIVER_CODES: [&str; 20] = [
    "VER", "NOR", "LEC", "PIA", "SAI", "HAM", "RUS", "PER", "ALO", "STR", "GAS", "OCO", "ALB",
    "TSU", "HUL", "MAG", "BOT", "ZHO", "RIC", "SAR",
];

fn driver_code(index: usize) -> String {
    DRIVER_CODES
        .get(index)
        .map(|c| c.to_string())
        .unwrap_or_else(|| format!("D{:02}", index + 1))
}

/// Pace lost per position in the driver order.
const PACE_STEP: f64 = 0.01;

/// Lap-to-lap pace variation, kept below `PACE_STEP` so the order holds.
const LAP_JITTER: f64 = 0.002;

/// Points used to trace the raw circuit shape before resampling.
const SHAPE_RESOLUTION: usize = 720;

// ============================================================================
// Circuit Generation
// ============================================================================

/// Closed circuit outline scaled to the requested length.
///
/// The outline is a circle with a few random harmonics. The last point
/// repeats the first.
fn generate_centerline(config: &CircuitConfig, rng: &mut StdRng) -> Vec<TrackPoint> {
    let harmonics: Vec<(f64, f64, f64)> = (2..5)
        .map(|k| {
            let amplitude = rng.gen_range(0.03..0.12);
            let phase = rng.gen_range(0.0..(2.0 * PI));
            (k as f64, amplitude, phase)
        })
        .collect();

    let raw: Vec<TrackPoint> = (0..=SHAPE_RESOLUTION)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / SHAPE_RESOLUTION as f64;
            let r = 1.0
                + harmonics
                    .iter()
                    .map(|(k, a, p)| a * (k * theta + p).sin())
                    .sum::<f64>();
            TrackPoint::new(r * theta.cos(), r * theta.sin())
        })
        .collect();

    let scale = config.length_meters / polyline_length(&raw);
    let scaled: Vec<TrackPoint> = raw
        .iter()
        .map(|p| TrackPoint::new(p.x * scale, p.y * scale))
        .collect();

    resample(&scaled, config.sample_spacing)
}

/// Resample a polyline at a fixed spacing, keeping both endpoints.
fn resample(points: &[TrackPoint], spacing: f64) -> Vec<TrackPoint> {
    let cumulative = cumulative_distances(points);
    let total = cumulative.last().copied().unwrap_or(0.0);
    if points.len() < 2 || spacing <= 0.0 || total <= 0.0 {
        return points.to_vec();
    }

    let steps = (total / spacing).ceil() as usize;
    let mut out = Vec::with_capacity(steps + 1);
    let mut seg = 0;
    for step in 0..steps {
        let target = step as f64 * spacing;
        while seg + 2 < cumulative.len() && cumulative[seg + 1] < target {
            seg += 1;
        }
        let span = cumulative[seg + 1] - cumulative[seg];
        let t = if span > 0.0 {
            (target - cumulative[seg]) / span
        } else {
            0.0
        };
        let (a, b) = (points[seg], points[seg + 1]);
        out.push(TrackPoint::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)));
    }
    if let Some(last) = points.last() {
        out.push(*last);
    }
    out
}

/// Profile speed at a lap distance: apex speed at each corner, top speed
/// halfway between corners.
fn profile_speed(config: &CircuitConfig, distance: f64, lap_length: f64) -> f64 {
    let corners = config.corner_count.max(1) as f64;
    let phase = 2.0 * PI * corners * distance / lap_length;
    let blend = (1.0 + phase.cos()) / 2.0;
    config.apex_speed + (config.top_speed - config.apex_speed) * blend
}

/// Corner markers at the speed minima of the profile.
fn generate_corners(
    config: &CircuitConfig,
    centerline: &[TrackPoint],
    cumulative: &[f64],
    lap_length: f64,
) -> Vec<Corner> {
    let spacing = lap_length / config.corner_count.max(1) as f64;
    (0..config.corner_count)
        .map(|j| {
            let distance = (j as f64 + 0.5) * spacing;
            let idx = cumulative.partition_point(|&d| d < distance);
            let p = centerline[idx.min(centerline.len() - 1)];
            Corner {
                number: j as u32 + 1,
                letter: String::new(),
                distance,
                x: p.x,
                y: p.y,
            }
        })
        .collect()
}

/// Gaussian noise pair via Box-Muller.
fn gaussian_pair(rng: &mut StdRng) -> (f64, f64) {
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.r#gen();
    let radius = (-2.0 * u1.ln()).sqrt();
    (
        radius * (2.0 * PI * u2).cos(),
        radius * (2.0 * PI * u2).sin(),
    )
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl SyntheticScenario {
    /// Generate a complete synthetic session from this scenario.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let centerline = generate_centerline(&self.circuit, &mut rng);
        let cumulative = cumulative_distances(&centerline);
        let lap_length = cumulative.last().copied().unwrap_or(0.0);
        let corners = generate_corners(&self.circuit, &centerline, &cumulative, lap_length);

        let pace: Vec<(String, f64)> = (0..self.driver_count)
            .map(|i| (driver_code(i), 1.0 - PACE_STEP * i as f64))
            .collect();

        let mut laps = Vec::with_capacity(self.driver_count * self.laps_per_driver);
        for (driver, factor) in &pace {
            let mut session_time = 0.0;
            for lap_number in 1..=self.laps_per_driver {
                let lap_factor = factor * (1.0 - rng.gen_range(0.0..LAP_JITTER));
                let lap = self.generate_lap(
                    driver,
                    lap_number as u32,
                    lap_factor,
                    session_time,
                    &centerline,
                    &cumulative,
                    &mut rng,
                );
                session_time += lap.lap_time.unwrap_or(0.0);
                laps.push(lap);
            }
        }

        let total_samples = laps.iter().map(|l| l.telemetry.len()).sum();
        let total_laps = laps.len();

        let circuit = self.include_circuit_info.then(|| CircuitInfo {
            centerline: centerline.clone(),
            corners,
        });

        SyntheticDataset {
            session: Session {
                info: SessionInfo {
                    event_name: "Synthetic Grand Prix".to_string(),
                    year: 2024,
                    session: "Q".to_string(),
                },
                drivers: pace.iter().map(|(d, _)| d.clone()).collect(),
                laps,
                circuit,
            },
            centerline,
            pace,
            metadata: DatasetMetadata {
                total_laps,
                total_samples,
                lap_length,
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_lap(
        &self,
        driver: &str,
        lap_number: u32,
        pace_factor: f64,
        start_time: f64,
        centerline: &[TrackPoint],
        cumulative: &[f64],
        rng: &mut StdRng,
    ) -> Lap {
        let lap_length = cumulative.last().copied().unwrap_or(0.0);
        let mut telemetry = Vec::with_capacity(centerline.len());
        let mut time = start_time;
        let mut sector_times = [None, None];
        let base_gap: f64 = rng.gen_range(10.0..200.0);

        for (i, (p, &distance)) in centerline.iter().zip(cumulative).enumerate() {
            let speed = profile_speed(&self.circuit, distance, lap_length) * pace_factor;
            if i > 0 {
                let step = distance - cumulative[i - 1];
                let prev_speed =
                    profile_speed(&self.circuit, cumulative[i - 1], lap_length) * pace_factor;
                // km/h to m/s on the mean speed over the step
                time += step / ((speed + prev_speed) / 2.0 / 3.6);
            }

            for (k, slot) in sector_times.iter_mut().enumerate() {
                if slot.is_none() && distance >= lap_length * (k + 1) as f64 / 3.0 {
                    *slot = Some(time - start_time);
                }
            }

            let (nx, ny) = if self.position_noise_sigma > 0.0 {
                let (zx, zy) = gaussian_pair(rng);
                (zx * self.position_noise_sigma, zy * self.position_noise_sigma)
            } else {
                (0.0, 0.0)
            };

            let gap = base_gap * (1.0 + 0.5 * (distance / lap_length * 2.0 * PI).sin());
            telemetry.push(TelemetrySample {
                distance,
                time,
                x: p.x + nx,
                y: p.y + ny,
                speed,
                distance_to_car_ahead: Some(gap),
            });
        }

        Lap {
            driver: driver.to_string(),
            lap_number,
            lap_time: Some(time - start_time),
            team: None,
            sector1_time: sector_times[0],
            sector2_time: sector_times[1],
            telemetry,
        }
    }

    // ========================================================================
    // Preset Scenarios
    // ========================================================================

    /// A 5 km circuit with 16 corners, 10 m telemetry spacing.
    pub fn standard_circuit() -> CircuitConfig {
        CircuitConfig {
            length_meters: 5_000.0,
            corner_count: 16,
            sample_spacing: 10.0,
            top_speed: 330.0,
            apex_speed: 90.0,
        }
    }

    /// Full qualifying grid: 20 drivers, 3 laps each, 1 m position noise.
    pub fn qualifying() -> Self {
        Self {
            circuit: Self::standard_circuit(),
            driver_count: 20,
            laps_per_driver: 3,
            position_noise_sigma: 1.0,
            include_circuit_info: true,
            seed: 42,
        }
    }

    /// Noise-free session with `n` drivers and a single lap each.
    pub fn with_driver_count(n: usize) -> Self {
        Self {
            circuit: Self::standard_circuit(),
            driver_count: n,
            laps_per_driver: 1,
            position_noise_sigma: 0.0,
            include_circuit_info: true,
            seed: 7,
        }
    }

    /// Long circuit with dense telemetry for benchmarking.
    pub fn dense_telemetry() -> Self {
        Self {
            circuit: CircuitConfig {
                length_meters: 7_000.0,
                corner_count: 19,
                sample_spacing: 2.0,
                top_speed: 340.0,
                apex_speed: 80.0,
            },
            driver_count: 20,
            laps_per_driver: 1,
            position_noise_sigma: 0.5,
            include_circuit_info: true,
            seed: 1234,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
