//! Benchmarks for segmentation and attribution.
//!
//! Run with: `cargo bench --bench segmentation --features synthetic`
//!
//! Uses synthetic sessions so timings are reproducible across machines.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use f1_insights::synthetic::SyntheticScenario;
use f1_insights::{
    AttributionConfig, DriverObservation, LapSelector, NearestSearch, SegmentConfig,
    TelemetryProvider, attribute_segments, driver_lap_telemetry, segment_track, track_breakdown,
};

// ============================================================================
// 1. Segmentation
// ============================================================================

fn bench_segment_track(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_track");
    let dataset = SyntheticScenario::dense_telemetry().generate();

    for target in [20, 80, 320] {
        let config = SegmentConfig {
            target_segments: target,
        };
        group.bench_with_input(BenchmarkId::new("segments", target), &config, |b, config| {
            b.iter(|| segment_track(black_box(&dataset.centerline), config));
        });
    }

    group.finish();
}

// ============================================================================
// 2. Attribution: linear scan vs R-tree
// ============================================================================

fn bench_attribution_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("attribution_search");
    group.sample_size(20);

    let dataset = SyntheticScenario::dense_telemetry().generate();
    let session = &dataset.session;
    let segments = segment_track(&dataset.centerline, &SegmentConfig::default()).unwrap();
    let observations: Vec<DriverObservation> = session
        .drivers()
        .iter()
        .filter_map(|d| {
            driver_lap_telemetry(session, d, LapSelector::Fastest)
                .ok()
                .map(|samples| DriverObservation::new(d.clone(), samples.to_vec()))
        })
        .collect();

    for search in [NearestSearch::Linear, NearestSearch::RTree] {
        let config = AttributionConfig { search };
        group.bench_with_input(BenchmarkId::new("search", search), &config, |b, config| {
            b.iter(|| attribute_segments(&segments, black_box(&observations), config));
        });
    }

    group.finish();
}

// ============================================================================
// 3. Full breakdown by grid size
// ============================================================================

fn bench_breakdown_grid_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("breakdown_grid_size");
    group.sample_size(10);

    for drivers in [2, 10, 20] {
        let mut scenario = SyntheticScenario::qualifying();
        scenario.driver_count = drivers;
        let dataset = scenario.generate();

        group.bench_with_input(BenchmarkId::new("drivers", drivers), &drivers, |b, _| {
            b.iter(|| {
                track_breakdown(
                    &dataset.session,
                    &SegmentConfig::default(),
                    &AttributionConfig::default(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_segment_track,
    bench_attribution_search,
    bench_breakdown_grid_size,
);
criterion_main!(benches);
