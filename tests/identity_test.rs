//! Exact global-id assertions.
//!
//! These live in their own test binary: the global id sequence is
//! process-wide, so any other test promoting objects in parallel would
//! shift the expected values.

use ndarray::array;
use pointtrack_rs::tracker::{MeanEuclideanDistance, reset_global_object_counter};
use pointtrack_rs::{Detection, Tracker, TrackerConfig};

#[test]
fn global_ids_span_tracker_instances() {
    reset_global_object_counter();

    let config = TrackerConfig {
        hit_counter_max: 5,
        initialization_delay: Some(2),
        ..TrackerConfig::default()
    };
    let mut tracker = Tracker::new(Box::new(MeanEuclideanDistance), config.clone()).unwrap();

    let detection = || Detection::new(array![[10.0, 20.0]]).unwrap();
    assert!(tracker.update(vec![detection()]).unwrap().is_empty());
    assert!(tracker.update(vec![detection()]).unwrap().is_empty());

    let active = tracker.update(vec![detection()]).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, Some(1));
    assert_eq!(active[0].global_id, Some(1));
    assert_eq!(active[0].age, 3);
    assert_eq!(tracker.total_object_count(), 1);

    // A second tracker restarts its own ids but continues the global sequence.
    let mut other = Tracker::new(Box::new(MeanEuclideanDistance), config).unwrap();
    for _ in 0..2 {
        assert!(other.update(vec![detection()]).unwrap().is_empty());
    }
    let active = other.update(vec![detection()]).unwrap();
    assert_eq!(active[0].id, Some(1));
    assert_eq!(active[0].global_id, Some(2));
}
