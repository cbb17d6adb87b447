//! Analysis configuration bundle.
//!
//! Each analysis owns its own config struct with documented defaults;
//! [`AnalysisConfig`] groups them so a whole run can be described in one
//! JSON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::analysis::{DeltaConfig, EnvelopeConfig, SlipstreamThresholds};
use crate::segments::{AttributionConfig, SegmentConfig};

/// All tunables of an analysis run.
///
/// Missing fields in a JSON file fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub segments: SegmentConfig,
    pub attribution: AttributionConfig,
    pub slipstream: SlipstreamThresholds,
    pub delta: DeltaConfig,
    pub envelope: EnvelopeConfig,
}

impl AnalysisConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
