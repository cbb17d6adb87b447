//! R-tree indexed telemetry samples for nearest-sample queries.

use crate::TelemetrySample;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// A telemetry sample position with its index in the lap
#[derive(Debug, Clone, Copy)]
pub struct IndexedSample {
    pub idx: usize,
    pub x: f64,
    pub y: f64,
}

impl RTreeObject for IndexedSample {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedSample {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Build R-tree from the finite sample positions of a lap.
pub fn build_rtree(samples: &[TelemetrySample]) -> RTree<IndexedSample> {
    let indexed: Vec<IndexedSample> = samples
        .iter()
        .enumerate()
        .filter(|(_, s)| s.x.is_finite() && s.y.is_finite())
        .map(|(i, s)| IndexedSample {
            idx: i,
            x: s.x,
            y: s.y,
        })
        .collect();
    RTree::bulk_load(indexed)
}

/// Nearest sample to `query`, ties resolved to the lowest sample index.
///
/// The iterator yields candidates in ascending distance, so scanning stops at
/// the first candidate farther than the best one.
pub(crate) fn nearest_sample(tree: &RTree<IndexedSample>, query: [f64; 2]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (candidate, d2) in tree.nearest_neighbor_iter_with_distance_2(&query) {
        match best {
            None => best = Some((candidate.idx, d2)),
            Some((_, best_d2)) if d2 > best_d2 => break,
            Some((idx, best_d2)) => {
                if candidate.idx < idx {
                    best = Some((candidate.idx, best_d2));
                }
            }
        }
    }
    best.map(|(idx, _)| idx)
}
