//! Unified error type for the crate.
//!
//! Errors fall into two families:
//! - **Degenerate input**: precondition violations on geometry or parameters.
//!   These fail fast; no meaningful output can be produced.
//! - **Missing data**: a driver, lap, corner or centerline is not available.
//!   Callers processing many drivers log these and continue.

use thiserror::Error;

/// Errors produced by telemetry analysis.
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("{context} has {point_count} points, at least {minimum_required} required")]
    InsufficientPoints {
        context: String,
        point_count: usize,
        minimum_required: usize,
    },

    #[error("target segment count must be positive, got {0}")]
    InvalidSegmentCount(usize),

    #[error("non-finite coordinate at point index {index}")]
    NonFiniteCoordinate { index: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no laps recorded for driver {driver}")]
    NoLaps { driver: String },

    #[error("lap {selector} not found for driver {driver}")]
    LapNotFound { driver: String, selector: String },

    #[error("no telemetry available for driver {driver}")]
    NoTelemetry { driver: String },

    #[error("corner '{0}' not found on circuit")]
    CornerNotFound(String),

    #[error("session carries no circuit information")]
    CircuitInfoUnavailable,

    #[error("no circuit centerline or lap position trace available")]
    CenterlineUnavailable,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl InsightsError {
    /// Data for a driver, lap, corner or track is absent. Non-fatal for batch runs.
    pub fn is_missing_data(&self) -> bool {
        matches!(
            self,
            InsightsError::NoLaps { .. }
                | InsightsError::LapNotFound { .. }
                | InsightsError::NoTelemetry { .. }
                | InsightsError::CornerNotFound(_)
                | InsightsError::CircuitInfoUnavailable
                | InsightsError::CenterlineUnavailable
        )
    }

    /// A precondition on the input geometry or parameters was violated.
    pub fn is_degenerate_input(&self) -> bool {
        matches!(
            self,
            InsightsError::InsufficientPoints { .. }
                | InsightsError::InvalidSegmentCount(_)
                | InsightsError::NonFiniteCoordinate { .. }
                | InsightsError::InvalidParameter(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;

/// Conversions from `Option` into crate errors.
pub trait OptionExt<T> {
    fn ok_or_insufficient_points(
        self,
        context: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T>;

    fn ok_or_no_telemetry(self, driver: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_points(
        self,
        context: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T> {
        self.ok_or_else(|| InsightsError::InsufficientPoints {
            context: context.to_string(),
            point_count,
            minimum_required,
        })
    }

    fn ok_or_no_telemetry(self, driver: &str) -> Result<T> {
        self.ok_or_else(|| InsightsError::NoTelemetry {
            driver: driver.to_string(),
        })
    }
}
