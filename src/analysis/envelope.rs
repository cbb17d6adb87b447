//! Speed envelope across drivers by lap distance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::trace::rolling_mean;
use crate::error::{InsightsError, Result};
use crate::DriverObservation;

/// Configuration for the speed envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Distance bucket width (meters). Default: 10.0
    pub resolution_m: f64,
    /// Rolling mean window applied to min, max and median. 0 or 1 disables.
    /// Default: 5
    pub smoothing_window: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            resolution_m: 10.0,
            smoothing_window: 5,
        }
    }
}

/// Speed statistics for one distance bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopePoint {
    /// Bucket start distance (meters)
    pub distance: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub median_speed: f64,
    /// Number of speed readings in the bucket
    pub count: usize,
}

/// Min, max and median speed over all drivers per distance bucket.
///
/// Each lap is probed every `resolution_m` meters; the sample nearest the
/// probe distance contributes its speed to the bucket containing that
/// sample's own distance.
pub fn speed_envelope(
    traces: &[DriverObservation],
    config: &EnvelopeConfig,
) -> Result<Vec<EnvelopePoint>> {
    let resolution = config.resolution_m;
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(InsightsError::InvalidParameter(format!(
            "envelope resolution must be positive, got {}",
            resolution
        )));
    }

    let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();

    for trace in traces {
        let samples: Vec<_> = trace
            .samples
            .iter()
            .filter(|s| s.distance.is_finite() && s.speed.is_finite())
            .collect();
        if samples.is_empty() {
            log::warn!("[Envelope] No telemetry for {}", trace.driver);
            continue;
        }

        let max_distance = samples.iter().map(|s| s.distance).fold(f64::MIN, f64::max);
        // Probes stop short of the whole-meter lap length
        let probes = (max_distance.trunc() / resolution).ceil().max(0.0) as i64;

        for step in 0..probes {
            let probe = step as f64 * resolution;
            let nearest = samples
                .iter()
                .copied()
                .reduce(|best, s| {
                    if (s.distance - probe).abs() < (best.distance - probe).abs() {
                        s
                    } else {
                        best
                    }
                });
            if let Some(sample) = nearest {
                let bucket = (sample.distance / resolution).floor() as i64;
                buckets.entry(bucket).or_default().push(sample.speed);
            }
        }
    }

    let mut distance = Vec::with_capacity(buckets.len());
    let mut mins = Vec::with_capacity(buckets.len());
    let mut maxs = Vec::with_capacity(buckets.len());
    let mut medians = Vec::with_capacity(buckets.len());
    let mut counts = Vec::with_capacity(buckets.len());

    for (bucket, mut speeds) in buckets {
        speeds.sort_by(f64::total_cmp);
        distance.push(bucket as f64 * resolution);
        mins.push(speeds[0]);
        maxs.push(speeds[speeds.len() - 1]);
        medians.push(median_sorted(&speeds));
        counts.push(speeds.len());
    }

    let mins = rolling_mean(&mins, config.smoothing_window);
    let maxs = rolling_mean(&maxs, config.smoothing_window);
    let medians = rolling_mean(&medians, config.smoothing_window);

    Ok((0..distance.len())
        .map(|i| EnvelopePoint {
            distance: distance[i],
            min_speed: mins[i],
            max_speed: maxs[i],
            median_speed: medians[i],
            count: counts[i],
        })
        .collect())
}

fn median_sorted(values: &[f64]) -> f64 {
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
