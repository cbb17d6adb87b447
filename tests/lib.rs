//! Tests for lib.rs core types

use f1_insights::{Bounds, DriverObservation, TelemetrySample, TrackPoint};

#[test]
fn test_track_point_finite() {
    assert!(TrackPoint::new(1.0, -2.0).is_finite());
    assert!(!TrackPoint::new(f64::NAN, 0.0).is_finite());
    assert!(!TrackPoint::new(0.0, f64::INFINITY).is_finite());
    assert_eq!(TrackPoint::from((3.0, 4.0)), TrackPoint::new(3.0, 4.0));
}

#[test]
fn test_sample_position() {
    let sample = TelemetrySample::at(12.0, -3.0, 250.0);
    assert_eq!(sample.position(), TrackPoint::new(12.0, -3.0));
    assert_eq!(sample.distance, 0.0);
    assert_eq!(sample.distance_to_car_ahead, None);
}

#[test]
fn test_sample_json_field_names() {
    let json = r#"{"x": 1.0, "y": 2.0, "speed": 300.5, "distanceToCarAhead": 12.5}"#;
    let sample: TelemetrySample = serde_json::from_str(json).unwrap();
    assert_eq!(sample.speed, 300.5);
    assert_eq!(sample.distance_to_car_ahead, Some(12.5));
    assert_eq!(sample.time, 0.0);

    let out = serde_json::to_string(&TelemetrySample::at(0.0, 0.0, 100.0)).unwrap();
    assert!(!out.contains("distanceToCarAhead"));
}

#[test]
fn test_driver_observation() {
    let obs = DriverObservation::new("VER", Vec::new());
    assert_eq!(obs.driver, "VER");
    assert!(obs.is_empty());
}

#[test]
fn test_bounds_from_points() {
    let bounds = Bounds::from_points(&[
        TrackPoint::new(5.0, 1.0),
        TrackPoint::new(-5.0, 3.0),
        TrackPoint::new(0.0, -1.0),
    ])
    .unwrap();
    assert_eq!(bounds.min_x, -5.0);
    assert_eq!(bounds.max_x, 5.0);
    assert_eq!(bounds.min_y, -1.0);
    assert_eq!(bounds.max_y, 3.0);
    assert_eq!(bounds.center(), TrackPoint::new(0.0, 1.0));
}
