//! TrackingPipeline for combining detection with tracking.

use thiserror::Error;

use crate::tracker::{TrackedObject, Tracker, TrackingError};

use super::DetectionSource;

/// Failure of one pipeline frame: either the source or the tracker.
#[derive(Debug, Error)]
pub enum PipelineError<E: std::error::Error> {
    #[error("detection source failed: {0}")]
    Source(E),
    #[error(transparent)]
    Tracking(#[from] TrackingError),
}

/// Bundles a detection source with a tracker for end-to-end per-frame use.
pub struct TrackingPipeline<D: DetectionSource> {
    source: D,
    tracker: Tracker,
}

impl<D: DetectionSource> TrackingPipeline<D>
where
    D::Error: std::error::Error,
{
    /// Create a new tracking pipeline from a source and a configured tracker.
    pub fn new(source: D, tracker: Tracker) -> Self {
        Self { source, tracker }
    }

    /// Create a new tracking pipeline with the default tracker.
    pub fn with_default_tracker(source: D) -> Self {
        Self::new(source, Tracker::with_defaults())
    }

    /// Process a single frame and return the active tracked objects.
    pub fn process_frame(
        &mut self,
        frame: &D::Frame,
    ) -> Result<Vec<&TrackedObject>, PipelineError<D::Error>> {
        let detections = self.source.detect(frame).map_err(PipelineError::Source)?;
        Ok(self.tracker.update(detections)?)
    }

    /// Get a reference to the underlying detection source.
    pub fn source(&self) -> &D {
        &self.source
    }

    /// Get a mutable reference to the underlying detection source.
    pub fn source_mut(&mut self) -> &mut D {
        &mut self.source
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut Tracker {
        &mut self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Detection, TrackerConfig, MeanEuclideanDistance};
    use ndarray::array;

    struct ReplaySource {
        detections: Vec<Detection>,
    }

    impl DetectionSource for ReplaySource {
        type Frame = u32;
        type Error = std::convert::Infallible;

        fn detect(&mut self, _frame: &u32) -> Result<Vec<Detection>, Self::Error> {
            Ok(self.detections.clone())
        }
    }

    #[test]
    fn pipeline_tracks_a_replayed_detection() {
        let source = ReplaySource {
            detections: vec![Detection::new(array![[10.0, 20.0]]).unwrap()],
        };
        let config = TrackerConfig {
            initialization_delay: Some(0),
            ..TrackerConfig::default()
        };
        let tracker = Tracker::new(Box::new(MeanEuclideanDistance), config).unwrap();
        let mut pipeline = TrackingPipeline::new(source, tracker);

        assert!(pipeline.process_frame(&1).unwrap().is_empty());
        let active = pipeline.process_frame(&2).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, Some(1));
    }
}
