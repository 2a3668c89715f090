//! Trait for per-frame detection producers.

use crate::tracker::Detection;

/// Produces the detections for one frame of input.
///
/// Implement this trait to connect any detection model or sensor to the
/// tracker. The frame type is up to the implementation: an image buffer, a
/// point cloud, a row of recorded data.
///
/// # Example
///
/// ```ignore
/// use pointtrack_rs::{Detection, DetectionSource};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Frame = Vec<u8>;
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Self::Frame) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Input handed to the source once per frame.
    type Frame;

    /// Error type for detection failures.
    type Error;

    /// Produce the detections found in `frame`.
    fn detect(&mut self, frame: &Self::Frame) -> Result<Vec<Detection>, Self::Error>;
}

/// Helper trait for converting model-specific outputs to `Detection`.
pub trait IntoDetections {
    /// Convert the output into a vector of detections.
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}
