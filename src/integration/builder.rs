//! Builder for assembling Detection objects from loose values.

use std::any::Any;
use std::sync::Arc;

use ndarray::{Array1, Array2};

use crate::tracker::{Detection, TrackingError};

/// Builder for creating `Detection` objects point by point.
///
/// Collects 2D or 3D points plus the optional metadata and validates the
/// whole detection once at [`build`](Self::build).
#[derive(Default)]
pub struct DetectionBuilder {
    points: Vec<Vec<f64>>,
    scores: Option<Vec<f64>>,
    label: Option<String>,
    embedding: Option<Vec<f64>>,
    data: Option<Arc<dyn Any + Send + Sync>>,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a 2D point.
    pub fn point2(mut self, x: f64, y: f64) -> Self {
        self.points.push(vec![x, y]);
        self
    }

    /// Append a 3D point.
    pub fn point3(mut self, x: f64, y: f64, z: f64) -> Self {
        self.points.push(vec![x, y, z]);
        self
    }

    /// Set per-point confidence scores.
    pub fn scores(mut self, scores: Vec<f64>) -> Self {
        self.scores = Some(scores);
        self
    }

    /// Set the class label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the appearance embedding.
    pub fn embedding(mut self, embedding: Vec<f64>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Attach an opaque payload.
    pub fn data(mut self, data: Arc<dyn Any + Send + Sync>) -> Self {
        self.data = Some(data);
        self
    }

    /// Build the final `Detection`, validating shape and scores.
    pub fn build(self) -> Result<Detection, TrackingError> {
        let rows = self.points.len();
        let cols = self.points.first().map_or(0, Vec::len);
        if let Some(bad) = self.points.iter().find(|point| point.len() != cols) {
            return Err(TrackingError::InvalidPointsShape {
                rows,
                cols: bad.len(),
            });
        }

        let flat: Vec<f64> = self.points.into_iter().flatten().collect();
        let points = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|_| TrackingError::InvalidPointsShape { rows, cols })?;

        let mut detection = Detection::new(points)?;
        if let Some(scores) = self.scores {
            detection = detection.with_scores(Array1::from_vec(scores))?;
        }
        if let Some(label) = self.label {
            detection = detection.with_label(label);
        }
        if let Some(embedding) = self.embedding {
            detection = detection.with_embedding(Array1::from_vec(embedding));
        }
        if let Some(data) = self.data {
            detection = detection.with_data(data);
        }
        Ok(detection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_scored_labelled_detection() {
        let detection = DetectionBuilder::new()
            .point2(10.0, 20.0)
            .point2(30.0, 40.0)
            .scores(vec![0.9, 0.8])
            .label("person")
            .build()
            .unwrap();

        assert_eq!(detection.num_points(), 2);
        assert_eq!(detection.dim_points(), 2);
        assert_eq!(detection.label.as_deref(), Some("person"));
    }

    #[test]
    fn rejects_mixed_dimensions() {
        let error = DetectionBuilder::new()
            .point2(1.0, 2.0)
            .point3(1.0, 2.0, 3.0)
            .build()
            .unwrap_err();
        assert_eq!(error, TrackingError::InvalidPointsShape { rows: 2, cols: 3 });
    }

    #[test]
    fn rejects_empty_builders() {
        let error = DetectionBuilder::new().build().unwrap_err();
        assert_eq!(error, TrackingError::InvalidPointsShape { rows: 0, cols: 0 });
    }
}
