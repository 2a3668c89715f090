//! Error types for tracker construction and frame updates.

use thiserror::Error;

/// Errors surfaced by detection validation, tracker configuration and the
/// association stage.
///
/// Filter singularity is deliberately absent: a non-invertible innovation
/// covariance skips the filter update instead of failing the frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    /// Points must form an `N x D` matrix with `N >= 1` and `D` in `{2, 3}`.
    #[error("invalid points shape {rows}x{cols}: expected N >= 1 points of dimension 2 or 3")]
    InvalidPointsShape { rows: usize, cols: usize },

    /// Detection points contained NaN or infinite coordinates.
    #[error("detection points contain non-finite coordinates")]
    NonFinitePoints,

    /// Per-point scores must have one entry per point.
    #[error("scores length {got} does not match point count {expected}")]
    ScoresLengthMismatch { expected: usize, got: usize },

    /// `initialization_delay` must lie in `[0, hit_counter_max)`.
    #[error("initialization_delay {delay} outside [0, {hit_counter_max})")]
    InvalidInitializationDelay { delay: i64, hit_counter_max: i64 },

    /// A distance function returned NaN; the frame update is aborted.
    #[error("distance matrix contains NaN entries")]
    NanDistance,
}
