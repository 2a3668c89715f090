//! Built-in distance functions.
//!
//! Any distance starts from the same label gate: entries stay at `+inf`
//! unless the candidate and the object carry equal labels (including both
//! being unlabelled), so mismatched classes can never be paired.

use ndarray::Array2;

use crate::tracker::matching::{Candidate, Distance};
use crate::tracker::tracked_object::TrackedObject;

fn label_gated<F>(
    objects: &[&TrackedObject],
    candidates: &[Candidate<'_>],
    mut pair_distance: F,
) -> Array2<f64>
where
    F: FnMut(&TrackedObject, &Candidate<'_>) -> f64,
{
    let mut distances =
        Array2::from_elem((objects.len(), candidates.len()), f64::INFINITY);
    for (col, candidate) in candidates.iter().enumerate() {
        for (row, &object) in objects.iter().enumerate() {
            if object.label.as_deref() == candidate.label() {
                distances[[row, col]] = pair_distance(object, candidate);
            }
        }
    }
    distances
}

/// Mean Euclidean distance between corresponding points.
///
/// Candidates whose point count or dimension differs from the object's are
/// hard non-matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanEuclideanDistance;

impl Distance for MeanEuclideanDistance {
    fn get_distances(
        &self,
        objects: &[&TrackedObject],
        candidates: &[Candidate<'_>],
    ) -> Array2<f64> {
        let estimates: Vec<Array2<f64>> =
            objects.iter().map(|object| object.estimate()).collect();

        let mut distances =
            Array2::from_elem((objects.len(), candidates.len()), f64::INFINITY);
        for (col, candidate) in candidates.iter().enumerate() {
            let points = candidate.points();
            for (row, object) in objects.iter().enumerate() {
                if object.label.as_deref() != candidate.label() {
                    continue;
                }
                let estimate = &estimates[row];
                if estimate.dim() != points.dim() {
                    continue;
                }
                let total: f64 = points
                    .rows()
                    .into_iter()
                    .zip(estimate.rows())
                    .map(|(a, b)| {
                        a.iter()
                            .zip(b.iter())
                            .map(|(x, y)| (x - y) * (x - y))
                            .sum::<f64>()
                            .sqrt()
                    })
                    .sum();
                distances[[row, col]] = total / points.nrows() as f64;
            }
        }
        distances
    }
}

/// IoU distance (`1 - IoU`) over axis-aligned boxes given as two corner
/// points, i.e. `2 x 2` point matrices.
#[derive(Debug, Clone, Copy, Default)]
pub struct IouDistance;

fn box_iou(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    let (ax1, ax2) = (a[[0, 0]].min(a[[1, 0]]), a[[0, 0]].max(a[[1, 0]]));
    let (ay1, ay2) = (a[[0, 1]].min(a[[1, 1]]), a[[0, 1]].max(a[[1, 1]]));
    let (bx1, bx2) = (b[[0, 0]].min(b[[1, 0]]), b[[0, 0]].max(b[[1, 0]]));
    let (by1, by2) = (b[[0, 1]].min(b[[1, 1]]), b[[0, 1]].max(b[[1, 1]]));

    let inter_width = (ax2.min(bx2) - ax1.max(bx1)).max(0.0);
    let inter_height = (ay2.min(by2) - ay1.max(by1)).max(0.0);
    let inter_area = inter_width * inter_height;

    let union_area =
        (ax2 - ax1) * (ay2 - ay1) + (bx2 - bx1) * (by2 - by1) - inter_area;

    if union_area > 0.0 {
        inter_area / union_area
    } else {
        0.0
    }
}

impl Distance for IouDistance {
    fn get_distances(
        &self,
        objects: &[&TrackedObject],
        candidates: &[Candidate<'_>],
    ) -> Array2<f64> {
        let estimates: Vec<Array2<f64>> =
            objects.iter().map(|object| object.estimate()).collect();

        let mut distances =
            Array2::from_elem((objects.len(), candidates.len()), f64::INFINITY);
        for (col, candidate) in candidates.iter().enumerate() {
            let points = candidate.points();
            if points.dim() != (2, 2) {
                continue;
            }
            for (row, object) in objects.iter().enumerate() {
                if object.label.as_deref() != candidate.label() {
                    continue;
                }
                let estimate = &estimates[row];
                if estimate.dim() != (2, 2) {
                    continue;
                }
                distances[[row, col]] = 1.0 - box_iou(&points, estimate);
            }
        }
        distances
    }
}

/// Adapter lifting a per-pair closure into a [`Distance`], with the usual
/// label gate applied first.
pub struct ScalarDistance<F>(pub F);

impl<F> Distance for ScalarDistance<F>
where
    F: Fn(&TrackedObject, &Candidate<'_>) -> f64 + Send,
{
    fn get_distances(
        &self,
        objects: &[&TrackedObject],
        candidates: &[Candidate<'_>],
    ) -> Array2<f64> {
        label_gated(objects, candidates, &self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::detection::Detection;
    use crate::tracker::filter_factory::KalmanFilterFactory;
    use crate::tracker::identity::IdentityFactory;
    use crate::tracker::point_tracker::TrackerConfig;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn object_at(points: Array2<f64>, label: Option<&str>) -> TrackedObject {
        let mut detection = Detection::new(points).unwrap();
        if let Some(label) = label {
            detection = detection.with_label(label);
        }
        let config = TrackerConfig::default();
        TrackedObject::new(
            detection,
            &config,
            0,
            &KalmanFilterFactory::default(),
            &IdentityFactory::default(),
            None,
        )
    }

    #[test]
    fn mean_euclidean_averages_per_point_norms() {
        let object = object_at(array![[0.0, 0.0], [0.0, 0.0]], None);
        let detection = Detection::new(array![[3.0, 4.0], [0.0, 0.0]]).unwrap();
        let objects = [&object];
        let candidates = [Candidate::Detection(&detection)];

        let distances = MeanEuclideanDistance.get_distances(&objects, &candidates);
        assert_abs_diff_eq!(distances[[0, 0]], 2.5, epsilon = 1e-12);
    }

    #[test]
    fn label_mismatch_is_a_hard_non_match() {
        let object = object_at(array![[0.0, 0.0]], Some("car"));
        let detection = Detection::new(array![[0.0, 0.0]]).unwrap().with_label("bike");
        let objects = [&object];
        let candidates = [Candidate::Detection(&detection)];

        let distances = MeanEuclideanDistance.get_distances(&objects, &candidates);
        assert!(distances[[0, 0]].is_infinite());
    }

    #[test]
    fn shape_mismatch_is_a_hard_non_match() {
        let object = object_at(array![[0.0, 0.0], [1.0, 1.0]], None);
        let detection = Detection::new(array![[0.0, 0.0]]).unwrap();
        let objects = [&object];
        let candidates = [Candidate::Detection(&detection)];

        let distances = MeanEuclideanDistance.get_distances(&objects, &candidates);
        assert!(distances[[0, 0]].is_infinite());
    }

    #[test]
    fn iou_distance_over_corner_boxes() {
        let object = object_at(array![[0.0, 0.0], [10.0, 10.0]], None);
        let same = Detection::new(array![[0.0, 0.0], [10.0, 10.0]]).unwrap();
        let disjoint = Detection::new(array![[100.0, 100.0], [110.0, 110.0]]).unwrap();
        let objects = [&object];
        let candidates = [Candidate::Detection(&same), Candidate::Detection(&disjoint)];

        let distances = IouDistance.get_distances(&objects, &candidates);
        assert_abs_diff_eq!(distances[[0, 0]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(distances[[0, 1]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn box_iou_matches_hand_computation() {
        let a = array![[0.0, 0.0], [10.0, 10.0]];
        let b = array![[5.0, 5.0], [15.0, 15.0]];
        // intersection 25, union 175
        assert_abs_diff_eq!(box_iou(&a, &b), 25.0 / 175.0, epsilon = 1e-12);
    }
}
