//! Coordinate transforms between the camera-relative and absolute frames.

use ndarray::{Array1, Array2};

/// Conversion between camera-relative and absolute coordinates.
///
/// Implementations are produced by an external motion estimator; the tracker
/// only calls the two conversions. Both take and return `N x D` point
/// matrices and are expected to be inverses of each other up to numerical
/// tolerance.
pub trait CoordinateTransformation: Send + Sync {
    /// Map camera-relative points into the absolute frame.
    fn rel_to_abs(&self, points: &Array2<f64>) -> Array2<f64>;

    /// Map absolute points back into the current camera frame.
    fn abs_to_rel(&self, points: &Array2<f64>) -> Array2<f64>;
}

/// Pure-translation camera motion.
///
/// `movement_vector` is the camera displacement expressed in point
/// coordinates: absolute = relative + movement.
#[derive(Debug, Clone)]
pub struct TranslationTransformation {
    pub movement_vector: Array1<f64>,
}

impl TranslationTransformation {
    pub fn new(movement_vector: Array1<f64>) -> Self {
        Self { movement_vector }
    }
}

impl CoordinateTransformation for TranslationTransformation {
    fn rel_to_abs(&self, points: &Array2<f64>) -> Array2<f64> {
        points + &self.movement_vector
    }

    fn abs_to_rel(&self, points: &Array2<f64>) -> Array2<f64> {
        points - &self.movement_vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn translation_round_trip() {
        let transform = TranslationTransformation::new(array![3.5, -2.0]);
        let points = array![[1.0, 2.0], [-4.0, 0.5]];

        let round_trip = transform.abs_to_rel(&transform.rel_to_abs(&points));
        for (a, b) in round_trip.iter().zip(points.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn translation_moves_into_absolute_frame() {
        let transform = TranslationTransformation::new(array![-1.0, -1.0]);
        let absolute = transform.rel_to_abs(&array![[2.0, 2.0]]);
        assert_eq!(absolute, array![[1.0, 1.0]]);
    }
}
