//! Telemetry analyses around the track breakdown.
//!
//! - `slipstream` - straight-section extraction and draft detection
//! - `trace` - speed trace smoothing and sector boundaries
//! - `delta` - interpolated time deltas between laps
//! - `envelope` - min/median/max speed over all drivers by distance

pub mod delta;
pub mod envelope;
pub mod slipstream;
pub mod trace;

pub use delta::{
    DeltaConfig, DeltaTrace, LapTimeGap, LinearInterpolator, delta_to_reference, lap_time_gaps,
    linspace,
};
pub use envelope::{EnvelopeConfig, EnvelopePoint, speed_envelope};
pub use slipstream::{
    SectionOutcome, SlipstreamResult, SlipstreamThresholds, TrackSection, analyze_slipstream,
    slipstream_survey, straight_section,
};
pub use trace::{
    SpeedComparison, SpeedTrace, rolling_mean, sector_distances, smoothed_speed_trace,
    speed_traces,
};
