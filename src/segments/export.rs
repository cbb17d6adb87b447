//! Tabular export of segment attribution.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{SegmentAttribution, TrackSegment};
use crate::Result;

/// One exported row per segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRow {
    pub segment_id: usize,
    pub midpoint_x: f64,
    pub midpoint_y: f64,
    /// Empty cell when the segment was not attributed
    pub fastest_driver: Option<String>,
    pub fastest_speed: f64,
}

/// Flatten segments and their attribution into rows.
///
/// Segments without an attribution entry export as unattributed.
pub fn segment_rows(
    segments: &[TrackSegment],
    attributions: &[SegmentAttribution],
) -> Vec<SegmentRow> {
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let mid = segment.midpoint();
            let attribution = attributions.get(i);
            SegmentRow {
                segment_id: segment.index,
                midpoint_x: mid.x,
                midpoint_y: mid.y,
                fastest_driver: attribution.and_then(|a| a.fastest_driver.clone()),
                fastest_speed: attribution.map_or(0.0, |a| a.fastest_speed),
            }
        })
        .collect()
}

/// Write rows as CSV with a header line.
pub fn write_segments_csv<W: Write>(writer: W, rows: &[SegmentRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write rows to a CSV file, creating parent directories as needed.
pub fn export_segments_csv(path: &Path, rows: &[SegmentRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_segments_csv(file, rows)?;
    log::info!("[Export] Wrote {} segments to {}", rows.len(), path.display());
    Ok(())
}
