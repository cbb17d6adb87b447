//! Tests for fastest-driver attribution

use f1_insights::segments::{
    AttributionConfig, DriverOutcome, NearestSearch, SegmentConfig, SkipReason, TrackSegment,
    attribute_segments, segment_track,
};
use f1_insights::{DriverObservation, TelemetrySample, TrackPoint};

fn straight_segments(n_points: usize, spacing: f64, target: usize) -> Vec<TrackSegment> {
    let track: Vec<TrackPoint> = (0..n_points)
        .map(|i| TrackPoint::new(i as f64 * spacing, 0.0))
        .collect();
    segment_track(&track, &SegmentConfig { target_segments: target }).unwrap()
}

fn with_search(search: NearestSearch) -> AttributionConfig {
    AttributionConfig { search }
}

/// Driver samples on the x axis: `(x, speed)` pairs.
fn driver(name: &str, samples: &[(f64, f64)]) -> DriverObservation {
    DriverObservation::new(
        name,
        samples
            .iter()
            .map(|&(x, speed)| TelemetrySample::at(x, 0.0, speed))
            .collect(),
    )
}

#[test]
fn test_each_segment_goes_to_local_fastest() {
    let segments = straight_segments(5, 10.0, 2);
    let a = driver("A", &[(10.0, 200.0), (30.0, 0.0)]);
    let b = driver("B", &[(10.0, 0.0), (30.0, 250.0)]);

    let report = attribute_segments(&segments, &[a, b], &AttributionConfig::default());

    assert_eq!(report.attributions[0].fastest_driver.as_deref(), Some("A"));
    assert_eq!(report.attributions[0].fastest_speed, 200.0);
    assert_eq!(report.attributions[1].fastest_driver.as_deref(), Some("B"));
    assert_eq!(report.attributions[1].fastest_speed, 250.0);
}

#[test]
fn test_equal_speed_goes_to_first_driver() {
    let segments = straight_segments(5, 10.0, 2);
    let a = driver("A", &[(10.0, 280.0), (30.0, 150.0)]);
    let b = driver("B", &[(10.0, 280.0), (30.0, 150.0)]);

    let config = AttributionConfig::default();
    let report = attribute_segments(&segments, &[a.clone(), b.clone()], &config);
    assert_eq!(report.attributions[0].fastest_driver.as_deref(), Some("A"));
    assert_eq!(report.attributions[1].fastest_driver.as_deref(), Some("A"));

    // Reversing the order reverses the winner
    let report = attribute_segments(&segments, &[b, a], &config);
    assert_eq!(report.attributions[0].fastest_driver.as_deref(), Some("B"));
}

#[test]
fn test_zero_speed_leaves_segment_unattributed() {
    let segments = straight_segments(5, 10.0, 2);
    // Samples equidistant from both midpoints
    let a = driver("A", &[(20.0, 0.0)]);
    let b = driver("B", &[(20.0, 0.0)]);

    let report = attribute_segments(&segments, &[a, b], &AttributionConfig::default());
    assert!(report.attributions.iter().all(|a| a.fastest_driver.is_none()));
    assert!(report.attributions.iter().all(|a| a.fastest_speed == 0.0));
    assert_eq!(report.unattributed_count(), 2);
    assert_eq!(report.speed_range(), None);
    assert!(report.leader_shares().is_empty());
}

#[test]
fn test_no_drivers_gives_full_unattributed_report() {
    let segments = straight_segments(11, 10.0, 5);
    let report = attribute_segments(&segments, &[], &AttributionConfig::default());
    assert_eq!(report.attributions.len(), 5);
    assert_eq!(report.unattributed_count(), 5);
    assert!(report.outcomes.is_empty());
}

#[test]
fn test_nearest_sample_decides_speed() {
    let segments = straight_segments(5, 10.0, 2);
    // B is faster overall but its sample near the first midpoint is slow
    let a = driver("A", &[(9.0, 210.0)]);
    let b = driver("B", &[(12.0, 190.0), (19.0, 330.0), (30.0, 330.0)]);

    let report = attribute_segments(&segments, &[a, b], &AttributionConfig::default());
    assert_eq!(report.attributions[0].fastest_driver.as_deref(), Some("A"));
    assert_eq!(report.attributions[1].fastest_driver.as_deref(), Some("B"));
}

#[test]
fn test_linear_and_rtree_agree() {
    let track: Vec<TrackPoint> = (0..300)
        .map(|i| {
            let t = i as f64 / 300.0 * std::f64::consts::TAU;
            TrackPoint::new(t.cos() * 500.0, t.sin() * 300.0)
        })
        .collect();
    let segments = segment_track(&track, &SegmentConfig { target_segments: 40 }).unwrap();

    let observations: Vec<DriverObservation> = (0..6)
        .map(|d| {
            let samples = (0..450)
                .map(|i| {
                    let t = i as f64 / 450.0 * std::f64::consts::TAU;
                    let wobble = ((i * (d + 3)) % 7) as f64 - 3.0;
                    TelemetrySample::at(
                        t.cos() * (500.0 + wobble),
                        t.sin() * (300.0 - wobble),
                        150.0 + ((i * 13 + d * 29) % 180) as f64,
                    )
                })
                .collect();
            DriverObservation::new(format!("D{}", d), samples)
        })
        .collect();

    let linear =
        attribute_segments(&segments, &observations, &with_search(NearestSearch::Linear));
    let rtree = attribute_segments(&segments, &observations, &with_search(NearestSearch::RTree));
    assert_eq!(linear, rtree);
}

#[test]
fn test_attribution_is_deterministic() {
    let segments = straight_segments(101, 2.0, 25);
    let observations: Vec<DriverObservation> = (0..8)
        .map(|d| {
            let samples: Vec<(f64, f64)> = (0..120)
                .map(|i| (i as f64 * 1.7, 100.0 + ((i * 7 + d * 11) % 50) as f64))
                .collect();
            driver(&format!("D{}", d), &samples)
        })
        .collect();

    let first = attribute_segments(&segments, &observations, &AttributionConfig::default());
    for _ in 0..5 {
        let again = attribute_segments(&segments, &observations, &AttributionConfig::default());
        assert_eq!(first, again);
    }
}

#[test]
fn test_driver_without_samples_is_skipped() {
    let segments = straight_segments(5, 10.0, 2);
    let a = driver("A", &[(10.0, 200.0), (30.0, 220.0)]);
    let empty = DriverObservation::new("B", Vec::new());
    let no_position =
        DriverObservation::new("C", vec![TelemetrySample::at(f64::NAN, f64::NAN, 400.0)]);

    let observations = [a, empty, no_position];
    let report = attribute_segments(&segments, &observations, &AttributionConfig::default());

    assert!(report
        .attributions
        .iter()
        .all(|a| a.fastest_driver.as_deref() == Some("A")));
    assert_eq!(
        report.outcomes,
        vec![
            DriverOutcome::Processed {
                driver: "A".to_string(),
                segments_led: 2
            },
            DriverOutcome::Skipped {
                driver: "B".to_string(),
                reason: SkipReason::NoTelemetry
            },
            DriverOutcome::Skipped {
                driver: "C".to_string(),
                reason: SkipReason::NoPositionData
            },
        ]
    );
    assert_eq!(report.skipped().count(), 2);
}

#[test]
fn test_leader_shares_sorted_by_count() {
    let segments = straight_segments(9, 10.0, 4);
    // Midpoints sit at x = 10, 30, 50, 70
    let a = driver("A", &[(10.0, 300.0), (30.0, 100.0), (50.0, 100.0), (70.0, 100.0)]);
    let b = driver("B", &[(10.0, 100.0), (30.0, 310.0), (50.0, 320.0), (70.0, 330.0)]);

    let report = attribute_segments(&segments, &[a, b], &AttributionConfig::default());
    let shares = report.leader_shares();

    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].driver, "B");
    assert_eq!(shares[0].segments, 3);
    assert_eq!(shares[0].percent, 75.0);
    assert_eq!(shares[1].driver, "A");
    assert_eq!(shares[1].segments, 1);
    assert_eq!(report.speed_range(), Some((300.0, 330.0)));
}

#[test]
fn test_search_strategy_parsing() {
    assert_eq!("linear".parse::<NearestSearch>(), Ok(NearestSearch::Linear));
    assert_eq!("RTree".parse::<NearestSearch>(), Ok(NearestSearch::RTree));
    assert_eq!("r-tree".parse::<NearestSearch>(), Ok(NearestSearch::RTree));
    assert!("kd".parse::<NearestSearch>().is_err());
    assert_eq!(NearestSearch::default(), NearestSearch::RTree);
}
