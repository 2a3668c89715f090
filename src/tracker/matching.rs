//! Distance contract and greedy one-to-one matching.

use ndarray::{Array1, Array2};

use crate::tracker::detection::Detection;
use crate::tracker::error::TrackingError;
use crate::tracker::tracked_object::TrackedObject;

/// One column of a cost matrix: either an incoming detection or, during
/// re-identification, another tracked object.
///
/// The matching algorithm is identical for both; only the post-match action
/// differs (hit versus merge), which the pipeline dispatches on.
#[derive(Clone, Copy)]
pub enum Candidate<'a> {
    Detection(&'a Detection),
    Object(&'a TrackedObject),
}

impl Candidate<'_> {
    pub fn label(&self) -> Option<&str> {
        match self {
            Candidate::Detection(detection) => detection.label.as_deref(),
            Candidate::Object(object) => object.label.as_deref(),
        }
    }

    /// The candidate's points in the camera-relative frame: detection points
    /// as supplied, or the object's current estimate.
    pub fn points(&self) -> Array2<f64> {
        match self {
            Candidate::Detection(detection) => detection.points().clone(),
            Candidate::Object(object) => object.estimate(),
        }
    }

    pub fn embedding(&self) -> Option<&Array1<f64>> {
        match self {
            Candidate::Detection(detection) => detection.embedding.as_ref(),
            Candidate::Object(object) => object.embedding.as_ref(),
        }
    }
}

/// Computes the cost of pairing each tracked object with each candidate.
///
/// The returned matrix has shape `|objects| x |candidates|`. `+inf` marks a
/// hard non-match (e.g. a label mismatch); NaN is forbidden and aborts the
/// frame update.
pub trait Distance: Send {
    fn get_distances(
        &self,
        objects: &[&TrackedObject],
        candidates: &[Candidate<'_>],
    ) -> Array2<f64>;
}

/// Outcome of one matching stage.
///
/// `matches` holds `(object, candidate)` index pairs in the order they were
/// picked; the unmatched lists cover the remaining rows and columns.
#[derive(Debug, Clone, Default)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_objects: Vec<usize>,
    pub unmatched_candidates: Vec<usize>,
}

/// Greedy one-to-one assignment below a strict threshold.
///
/// Repeatedly takes the smallest remaining entry (row-major order breaks
/// ties) while it is strictly below `threshold`, then retires its row and
/// column. `+inf` entries can never match; any NaN is a caller bug and is
/// reported as an error.
pub fn greedy_assignment(
    cost_matrix: &Array2<f64>,
    threshold: f64,
) -> Result<AssignmentResult, TrackingError> {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return Ok(AssignmentResult {
            matches: vec![],
            unmatched_objects: (0..num_rows).collect(),
            unmatched_candidates: (0..num_cols).collect(),
        });
    }

    if cost_matrix.iter().any(|value| value.is_nan()) {
        return Err(TrackingError::NanDistance);
    }

    let mut remaining = cost_matrix.clone();
    let mut matches = vec![];

    loop {
        let mut best = threshold;
        let mut best_pair = None;
        for row in 0..num_rows {
            for col in 0..num_cols {
                if remaining[[row, col]] < best {
                    best = remaining[[row, col]];
                    best_pair = Some((row, col));
                }
            }
        }
        let Some((row, col)) = best_pair else { break };

        matches.push((row, col));
        for c in 0..num_cols {
            remaining[[row, c]] = threshold + 1.0;
        }
        for r in 0..num_rows {
            remaining[[r, col]] = threshold + 1.0;
        }
    }

    let mut row_taken = vec![false; num_rows];
    let mut col_taken = vec![false; num_cols];
    for &(row, col) in &matches {
        row_taken[row] = true;
        col_taken[col] = true;
    }

    Ok(AssignmentResult {
        matches,
        unmatched_objects: (0..num_rows).filter(|&r| !row_taken[r]).collect(),
        unmatched_candidates: (0..num_cols).filter(|&c| !col_taken[c]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn picks_minima_in_ascending_order() {
        let cost = array![[0.5, 0.9, 0.8], [0.9, 0.3, 0.7], [0.8, 0.7, 0.4]];
        let result = greedy_assignment(&cost, 1.0).unwrap();
        assert_eq!(result.matches, vec![(1, 1), (2, 2), (0, 0)]);
        assert!(result.unmatched_objects.is_empty());
        assert!(result.unmatched_candidates.is_empty());
    }

    #[test]
    fn matches_follow_pick_order_not_row_order() {
        let cost = array![[0.5, 2.0, 3.0], [2.5, 0.8, 2.0], [3.0, 3.0, 0.3]];
        let result = greedy_assignment(&cost, 1.5).unwrap();
        assert_eq!(result.matches, vec![(2, 2), (0, 0), (1, 1)]);
    }

    #[test]
    fn threshold_is_strict() {
        let cost = array![[0.5]];
        let result = greedy_assignment(&cost, 0.5).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_objects, vec![0]);
        assert_eq!(result.unmatched_candidates, vec![0]);

        let result = greedy_assignment(&cost, 0.5 + 1e-9).unwrap();
        assert_eq!(result.matches, vec![(0, 0)]);
    }

    #[test]
    fn infinities_never_match() {
        let inf = f64::INFINITY;
        let cost = array![[0.2, inf, inf], [inf, 0.3, inf], [inf, inf, 0.1]];
        let result = greedy_assignment(&cost, 1e9).unwrap();
        assert_eq!(result.matches, vec![(2, 2), (0, 0), (1, 1)]);
    }

    #[test]
    fn nan_is_rejected() {
        let cost = array![[0.2, f64::NAN]];
        assert_eq!(
            greedy_assignment(&cost, 1.0).unwrap_err(),
            TrackingError::NanDistance
        );
    }

    #[test]
    fn handles_non_square_matrices() {
        let cost = array![[0.1, 0.2, 0.3]];
        let result = greedy_assignment(&cost, 1.0).unwrap();
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_candidates, vec![1, 2]);

        let cost = array![[0.4], [0.1]];
        let result = greedy_assignment(&cost, 1.0).unwrap();
        assert_eq!(result.matches, vec![(1, 0)]);
        assert_eq!(result.unmatched_objects, vec![0]);
    }

    #[test]
    fn empty_matrices_yield_no_matches() {
        let cost = Array2::<f64>::zeros((0, 3));
        let result = greedy_assignment(&cost, 1.0).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_candidates, vec![0, 1, 2]);
    }
}
