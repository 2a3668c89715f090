//! Detection input for the tracker.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use ndarray::{Array1, Array2};

use crate::tracker::error::TrackingError;

/// One detected object for one frame: a set of points plus optional
/// metadata produced by an external detector.
///
/// Points are validated at construction: the matrix must be `N x D` with
/// `N >= 1`, `D` in `{2, 3}` and every coordinate finite. `abs_points`
/// starts as a copy of `points` and is rewritten by the tracker when a
/// coordinate transform is supplied with the frame.
#[derive(Clone)]
pub struct Detection {
    points: Array2<f64>,
    pub(crate) abs_points: Array2<f64>,
    scores: Option<Array1<f64>>,
    /// Optional class label; objects only match detections with an equal label.
    pub label: Option<String>,
    /// Optional appearance vector consumed by ReID distance functions.
    pub embedding: Option<Array1<f64>>,
    /// Opaque caller payload carried along with the detection.
    pub data: Option<Arc<dyn Any + Send + Sync>>,
    /// Object age at the time this detection was stored as a past detection.
    pub age: Option<u64>,
}

impl Detection {
    /// Create a detection from an `N x D` points matrix.
    pub fn new(points: Array2<f64>) -> Result<Self, TrackingError> {
        let (rows, cols) = points.dim();
        if rows < 1 || !(cols == 2 || cols == 3) {
            return Err(TrackingError::InvalidPointsShape { rows, cols });
        }
        if points.iter().any(|value| !value.is_finite()) {
            return Err(TrackingError::NonFinitePoints);
        }
        let abs_points = points.clone();
        Ok(Self {
            points,
            abs_points,
            scores: None,
            label: None,
            embedding: None,
            data: None,
            age: None,
        })
    }

    /// Attach per-point confidence scores; the length must equal the point count.
    pub fn with_scores(mut self, scores: Array1<f64>) -> Result<Self, TrackingError> {
        if scores.len() != self.num_points() {
            return Err(TrackingError::ScoresLengthMismatch {
                expected: self.num_points(),
                got: scores.len(),
            });
        }
        self.scores = Some(scores);
        Ok(self)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_embedding(mut self, embedding: Array1<f64>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_data(mut self, data: Arc<dyn Any + Send + Sync>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn num_points(&self) -> usize {
        self.points.nrows()
    }

    pub fn dim_points(&self) -> usize {
        self.points.ncols()
    }

    /// The points as supplied by the detector (camera-relative).
    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }

    /// The points in the absolute frame; identical to [`points`](Self::points)
    /// until a coordinate transform is applied.
    pub fn abs_points(&self) -> &Array2<f64> {
        &self.abs_points
    }

    pub fn scores(&self) -> Option<&Array1<f64>> {
        self.scores.as_ref()
    }
}

impl fmt::Debug for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detection")
            .field("points", &self.points)
            .field("scores", &self.scores)
            .field("label", &self.label)
            .field("age", &self.age)
            .field("has_embedding", &self.embedding.is_some())
            .field("has_data", &self.data.is_some())
            .finish()
    }
}
