//! Tests for track segmentation

use f1_insights::segments::{SegmentConfig, reconstruct_polyline, segment_track};
use f1_insights::{InsightsError, TrackPoint};
use proptest::prelude::*;

fn config(n: usize) -> SegmentConfig {
    SegmentConfig { target_segments: n }
}

fn straight(n: usize, spacing: f64) -> Vec<TrackPoint> {
    (0..n)
        .map(|i| TrackPoint::new(i as f64 * spacing, 0.0))
        .collect()
}

#[test]
fn test_two_segments_on_straight_line() {
    let track = straight(5, 10.0);
    let segments = segment_track(&track, &config(2)).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(
        segments[0].points,
        vec![
            TrackPoint::new(0.0, 0.0),
            TrackPoint::new(10.0, 0.0),
            TrackPoint::new(20.0, 0.0)
        ]
    );
    assert_eq!(
        segments[1].points,
        vec![
            TrackPoint::new(20.0, 0.0),
            TrackPoint::new(30.0, 0.0),
            TrackPoint::new(40.0, 0.0)
        ]
    );
    assert_eq!(segments[0].length, 20.0);
    assert_eq!(segments[1].length, 20.0);
    assert_eq!(segments[0].midpoint(), TrackPoint::new(10.0, 0.0));
    assert_eq!(segments[1].midpoint(), TrackPoint::new(30.0, 0.0));
}

#[test]
fn test_cut_point_is_shared() {
    let track = straight(11, 3.0);
    let segments = segment_track(&track, &config(4)).unwrap();
    for pair in segments.windows(2) {
        assert_eq!(pair[0].points.last(), pair[1].points.first());
    }
}

#[test]
fn test_reconstruction_on_curved_track() {
    let track: Vec<TrackPoint> = (0..200)
        .map(|i| {
            let t = i as f64 * 0.05;
            TrackPoint::new(t.cos() * 100.0, (2.0 * t).sin() * 60.0)
        })
        .collect();
    let segments = segment_track(&track, &config(80)).unwrap();
    assert!(segments.len() <= 80);
    assert_eq!(reconstruct_polyline(&segments), track);
}

#[test]
fn test_more_segments_than_points() {
    // Each segment needs two points, so 4 points give at most 3 segments
    let track = straight(4, 10.0);
    let segments = segment_track(&track, &config(80)).unwrap();
    assert_eq!(segments.len(), 3);
    assert_eq!(reconstruct_polyline(&segments), track);
}

#[test]
fn test_uneven_spacing_cuts_at_samples() {
    let track = vec![
        TrackPoint::new(0.0, 0.0),
        TrackPoint::new(1.0, 0.0),
        TrackPoint::new(25.0, 0.0),
        TrackPoint::new(26.0, 0.0),
        TrackPoint::new(40.0, 0.0),
    ];
    let segments = segment_track(&track, &config(2)).unwrap();

    // Target length is 20; the first cut happens at the sample past it
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].end_index, 2);
    assert_eq!(segments[0].length, 25.0);
    assert_eq!(segments[1].length, 15.0);
}

#[test]
fn test_zero_length_steps_never_exceed_target() {
    // Repeated samples make every step after the first cut zero length
    let mut track = straight(3, 10.0);
    track.extend(std::iter::repeat(TrackPoint::new(20.0, 0.0)).take(5));
    let segments = segment_track(&track, &config(2)).unwrap();
    assert!(segments.len() <= 2);
    assert_eq!(reconstruct_polyline(&segments), track);
}

#[test]
fn test_all_points_identical() {
    let track = vec![TrackPoint::new(5.0, 5.0); 6];
    let segments = segment_track(&track, &config(3)).unwrap();
    assert!(!segments.is_empty());
    assert!(segments.len() <= 3);
    assert_eq!(reconstruct_polyline(&segments), track);
}

#[test]
fn test_segment_indices_and_distances() {
    let track = straight(21, 5.0);
    let segments = segment_track(&track, &config(5)).unwrap();
    assert_eq!(segments.len(), 5);
    for (i, segment) in segments.iter().enumerate() {
        assert_eq!(segment.index, i);
        assert_eq!(segment.start_distance, i as f64 * 20.0);
        assert_eq!(segment.points.len(), 5);
    }
}

// ============================================================================
// Degenerate input
// ============================================================================

#[test]
fn test_empty_track_fails() {
    let result = segment_track(&[], &config(10));
    assert!(matches!(
        result,
        Err(InsightsError::InsufficientPoints { point_count: 0, .. })
    ));
}

#[test]
fn test_single_point_fails() {
    let result = segment_track(&[TrackPoint::new(1.0, 2.0)], &config(10));
    let err = result.unwrap_err();
    assert!(err.is_degenerate_input());
    assert!(err.to_string().contains("track centerline"));
}

#[test]
fn test_zero_target_fails() {
    let result = segment_track(&straight(5, 1.0), &config(0));
    assert!(matches!(result, Err(InsightsError::InvalidSegmentCount(0))));
}

#[test]
fn test_non_finite_point_fails() {
    let mut track = straight(5, 1.0);
    track[3].y = f64::NAN;
    let result = segment_track(&track, &config(2));
    assert!(matches!(
        result,
        Err(InsightsError::NonFiniteCoordinate { index: 3 })
    ));
}

// ============================================================================
// Properties
// ============================================================================

fn arb_track() -> impl Strategy<Value = Vec<TrackPoint>> {
    prop::collection::vec((-1000.0f64..1000.0, -1000.0f64..1000.0), 2..150)
        .prop_map(|pts| pts.into_iter().map(TrackPoint::from).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_segments_reconstruct_track(track in arb_track(), n in 1usize..120) {
        let segments = segment_track(&track, &config(n)).unwrap();
        prop_assert_eq!(reconstruct_polyline(&segments), track);
    }

    #[test]
    fn prop_segment_count_is_bounded(track in arb_track(), n in 1usize..120) {
        let segments = segment_track(&track, &config(n)).unwrap();
        prop_assert!(!segments.is_empty());
        prop_assert!(segments.len() <= n);
        prop_assert!(segments.len() <= track.len() - 1);
    }

    #[test]
    fn prop_midpoint_belongs_to_own_segment(track in arb_track(), n in 1usize..120) {
        let segments = segment_track(&track, &config(n)).unwrap();
        for segment in &segments {
            prop_assert!(segment.points.len() >= 2);
            let mid = segment.start_index + segment.midpoint_index();
            prop_assert!(mid >= segment.start_index && mid <= segment.end_index);
            prop_assert_eq!(segment.midpoint(), track[mid]);
        }
    }
}
