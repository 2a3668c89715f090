//! Multi-object tracking for point-set detections.
//!
//! Detections are `N x D` point matrices (2D or 3D) with optional scores,
//! labels and appearance embeddings. The tracker associates them with
//! tracked objects frame by frame, smooths each object through a
//! constant-velocity Kalman filter, and manages birth, initialization,
//! death and optional appearance-based re-identification of identities.
//!
//! ```no_run
//! use ndarray::array;
//! use pointtrack_rs::{Detection, Tracker};
//!
//! let mut tracker = Tracker::with_defaults();
//! let detections = vec![Detection::new(array![[10.0, 20.0]]).unwrap()];
//! let active = tracker.update(detections).unwrap();
//! for object in active {
//!     println!("object {:?} at {}", object.id, object.estimate());
//! }
//! ```

pub mod integration;
pub mod tracker;

pub use integration::{DetectionBuilder, DetectionSource, TrackingPipeline};
pub use tracker::{Detection, Tracker, TrackerConfig, TrackedObject, TrackingError};
