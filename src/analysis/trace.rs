//! Speed trace smoothing and sector boundaries.

use serde::{Deserialize, Serialize};

use crate::TelemetrySample;
use crate::error::InsightsError;
use crate::segments::SkipReason;
use crate::session::{Lap, LapSelector, TelemetryProvider, select_lap};

/// Centered rolling mean.
///
/// The window covers `window / 2` samples before and `window - 1 - window / 2`
/// after each position. A window containing NaN has no mean. Positions
/// without a mean take the next one (backward fill), then any still missing
/// at the end take the previous one (forward fill).
/// Inputs shorter than the window, or windows of 0 or 1, are returned as is.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || values.len() < window {
        return values.to_vec();
    }

    let before = window / 2;
    let n = values.len();

    // Each window is summed from its own slice so a bad sample only
    // affects the windows that contain it
    let mut out = vec![f64::NAN; n];
    for (start, slice) in values.windows(window).enumerate() {
        out[start + before] = slice.iter().sum::<f64>() / window as f64;
    }

    let mut next = f64::NAN;
    for value in out.iter_mut().rev() {
        if value.is_nan() {
            *value = next;
        } else {
            next = *value;
        }
    }
    let mut previous = f64::NAN;
    for value in out.iter_mut() {
        if value.is_nan() {
            *value = previous;
        } else {
            previous = *value;
        }
    }
    out
}

/// `(distance, smoothed speed)` pairs of a lap's telemetry.
pub fn smoothed_speed_trace(samples: &[TelemetrySample], window: usize) -> Vec<(f64, f64)> {
    let speeds: Vec<f64> = samples.iter().map(|s| s.speed).collect();
    let smoothed = rolling_mean(&speeds, window);
    samples
        .iter()
        .zip(smoothed)
        .map(|(s, v)| (s.distance, v))
        .collect()
}

/// Distances of the sector 1/2 and sector 2/3 boundaries on a lap.
///
/// Sector end times are measured from the lap start; each is mapped to the
/// distance of the sample nearest in (lap-relative) time. Returns `None` when
/// the lap lacks sector times or telemetry.
pub fn sector_distances(lap: &Lap) -> Option<[f64; 2]> {
    let s1 = lap.sector1_time?;
    let s2 = lap.sector2_time?;
    let start = lap.telemetry.first()?.time;

    let distance_at = |t: f64| -> Option<f64> {
        let mut best: Option<(f64, f64)> = None;
        for sample in &lap.telemetry {
            let dt = (sample.time - start - t).abs();
            match best {
                Some((best_dt, _)) if dt >= best_dt => {}
                _ => best = Some((dt, sample.distance)),
            }
        }
        best.map(|(_, d)| d)
    };

    Some([distance_at(s1)?, distance_at(s2)?])
}

/// Smoothed speed trace of one driver's lap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTrace {
    pub driver: String,
    pub lap_number: u32,
    /// `(distance, smoothed speed)` pairs
    pub trace: Vec<(f64, f64)>,
    /// Sector 1/2 and 2/3 boundary distances, when the lap has sector times
    pub sectors: Option<[f64; 2]>,
}

impl SpeedTrace {
    pub fn top_speed(&self) -> Option<f64> {
        self.trace.iter().map(|(_, v)| *v).reduce(f64::max)
    }
}

/// Speed traces of several drivers on the same kind of lap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedComparison {
    /// In the order the drivers were requested
    pub traces: Vec<SpeedTrace>,
    /// Drivers whose lap could not be loaded
    pub skipped: Vec<(String, SkipReason)>,
}

/// Smoothed speed traces for each driver.
///
/// A driver without a matching lap, or whose lap has no telemetry, is
/// logged and recorded in `skipped`; the remaining drivers are still traced.
pub fn speed_traces<P: TelemetryProvider + ?Sized>(
    provider: &P,
    drivers: &[String],
    selector: LapSelector,
    window: usize,
) -> SpeedComparison {
    let mut comparison = SpeedComparison::default();

    for driver in drivers {
        let lap = match select_lap(provider, driver, selector) {
            Ok(lap) if lap.has_telemetry() => lap,
            Ok(_) => {
                let error = InsightsError::NoTelemetry {
                    driver: driver.clone(),
                };
                log::warn!("[Speed] Skipping {}: {}", driver, error);
                comparison
                    .skipped
                    .push((driver.clone(), SkipReason::NoTelemetry));
                continue;
            }
            Err(e) => {
                log::warn!("[Speed] Skipping {}: {}", driver, e);
                comparison
                    .skipped
                    .push((driver.clone(), SkipReason::from_error(&e)));
                continue;
            }
        };

        comparison.traces.push(SpeedTrace {
            driver: driver.clone(),
            lap_number: lap.lap_number,
            trace: smoothed_speed_trace(&lap.telemetry, window),
            sectors: sector_distances(lap),
        });
    }

    log::info!(
        "[Speed] Traced {} drivers, skipped {}",
        comparison.traces.len(),
        comparison.skipped.len()
    );
    comparison
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_mean_odd_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let smoothed = rolling_mean(&values, 5);
        assert_eq!(smoothed, vec![3.0, 3.0, 3.0, 4.0, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_rolling_mean_even_window() {
        // Window of 4 covers two samples before and one after
        let values = [0.0, 4.0, 8.0, 12.0, 16.0];
        let smoothed = rolling_mean(&values, 4);
        assert_eq!(smoothed, vec![6.0, 6.0, 6.0, 10.0, 10.0]);
    }

    #[test]
    fn test_rolling_mean_short_input_unchanged() {
        let values = [1.0, 9.0];
        assert_eq!(rolling_mean(&values, 5), values.to_vec());
        assert_eq!(rolling_mean(&values, 1), values.to_vec());
    }

    #[test]
    fn test_rolling_mean_recovers_after_nan() {
        let mut values = [100.0; 20];
        values[3] = f64::NAN;
        let smoothed = rolling_mean(&values, 5);
        assert_eq!(smoothed.len(), 20);
        // Windows over the gap are filled from the first clean window
        assert!(smoothed.iter().all(|v| *v == 100.0), "{:?}", smoothed);
    }

    #[test]
    fn test_rolling_mean_all_nan_stays_nan() {
        let values = [f64::NAN; 6];
        assert!(rolling_mean(&values, 3).iter().all(|v| v.is_nan()));
    }
}
