//! Time deltas between laps along the lap distance.
//!
//! Each lap's elapsed time is interpolated over a common, evenly spaced
//! distance grid, then compared against a reference lap. Positive deltas mean
//! the driver is behind the reference at that point.

use serde::{Deserialize, Serialize};

use crate::error::{InsightsError, OptionExt, Result};
use crate::DriverObservation;

/// Configuration for delta computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaConfig {
    /// Number of evenly spaced distance samples. Default: 1000
    pub samples: usize,
}

impl Default for DeltaConfig {
    fn default() -> Self {
        Self { samples: 1000 }
    }
}

/// `n` evenly spaced values from `start` to `end`, both inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Piecewise linear interpolation with linear extrapolation at both ends.
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterpolator {
    /// Build from paired samples. Pairs are sorted by `x`; non-finite pairs
    /// are dropped. At least two pairs must remain.
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(InsightsError::InvalidParameter(format!(
                "interpolation inputs differ in length ({} vs {})",
                xs.len(),
                ys.len()
            )));
        }

        let mut pairs: Vec<(f64, f64)> = xs
            .iter()
            .zip(ys)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(x, y)| (*x, *y))
            .collect();
        if pairs.len() < 2 {
            return Err(InsightsError::InsufficientPoints {
                context: "interpolation input".to_string(),
                point_count: pairs.len(),
                minimum_required: 2,
            });
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (xs, ys) = pairs.into_iter().unzip();
        Ok(Self { xs, ys })
    }

    /// Interpolated value at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        // Index of the interval [lo, lo + 1] used for x
        let lo = match self.xs.partition_point(|&v| v <= x) {
            0 => 0,
            p if p >= n => n - 2,
            p => p - 1,
        };
        let (x0, x1) = (self.xs[lo], self.xs[lo + 1]);
        let (y0, y1) = (self.ys[lo], self.ys[lo + 1]);
        if x1 == x0 {
            return y0;
        }
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }

    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

/// Deltas of several drivers against a reference lap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaTrace {
    pub reference: String,
    /// Shared distance grid (meters)
    pub distance: Vec<f64>,
    /// `(driver, delta seconds per grid point)` in input order
    pub deltas: Vec<(String, Vec<f64>)>,
}

/// Elapsed lap time over distance, starting at 0.
fn time_interpolator(obs: &DriverObservation) -> Result<LinearInterpolator> {
    let samples = &obs.samples;
    let start = samples
        .first()
        .ok_or_insufficient_points(&format!("{} lap telemetry", obs.driver), 0, 2)?
        .time;
    let distances: Vec<f64> = samples.iter().map(|s| s.distance).collect();
    let times: Vec<f64> = samples.iter().map(|s| s.time - start).collect();
    LinearInterpolator::new(&distances, &times)
}

/// Interpolate every lap onto a common distance grid and subtract the
/// reference lap's elapsed time.
///
/// The grid spans 0 to the longest distance found in any lap.
pub fn delta_to_reference(
    reference: &DriverObservation,
    others: &[DriverObservation],
    config: &DeltaConfig,
) -> Result<DeltaTrace> {
    if config.samples < 2 {
        return Err(InsightsError::InvalidParameter(format!(
            "delta needs at least 2 distance samples, got {}",
            config.samples
        )));
    }

    let max_distance = std::iter::once(reference)
        .chain(others)
        .flat_map(|obs| obs.samples.iter().map(|s| s.distance))
        .filter(|d| d.is_finite())
        .fold(0.0_f64, f64::max);
    let distance = linspace(0.0, max_distance, config.samples);

    let reference_times = time_interpolator(reference)?.eval_many(&distance);

    let mut deltas = Vec::with_capacity(others.len());
    for obs in others {
        let times = time_interpolator(obs)?.eval_many(&distance);
        let delta = times
            .iter()
            .zip(&reference_times)
            .map(|(t, r)| t - r)
            .collect();
        deltas.push((obs.driver.clone(), delta));
    }

    Ok(DeltaTrace {
        reference: reference.driver.clone(),
        distance,
        deltas,
    })
}

/// Lap time difference of one driver relative to the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapTimeGap {
    pub driver: String,
    pub lap_time: f64,
    /// Positive when slower than the reference (seconds)
    pub gap: f64,
}

/// Lap time differences against a reference lap time.
pub fn lap_time_gaps(reference_time: f64, laps: &[(String, f64)]) -> Vec<LapTimeGap> {
    laps.iter()
        .map(|(driver, lap_time)| LapTimeGap {
            driver: driver.clone(),
            lap_time: *lap_time,
            gap: lap_time - reference_time,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints() {
        let xs = linspace(0.0, 10.0, 5);
        assert_eq!(xs, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    }

    #[test]
    fn test_interpolator_extrapolates_both_ends() {
        let interp = LinearInterpolator::new(&[0.0, 10.0, 20.0], &[0.0, 1.0, 3.0]).unwrap();
        assert_eq!(interp.eval(5.0), 0.5);
        assert_eq!(interp.eval(15.0), 2.0);
        assert_eq!(interp.eval(-10.0), -1.0);
        assert_eq!(interp.eval(30.0), 5.0);
    }

    #[test]
    fn test_interpolator_sorts_input() {
        let interp = LinearInterpolator::new(&[20.0, 0.0, 10.0], &[2.0, 0.0, 1.0]).unwrap();
        assert_eq!(interp.eval(10.0), 1.0);
    }
}
