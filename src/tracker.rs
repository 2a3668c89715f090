mod coord_transform;
mod detection;
mod distances;
mod error;
mod filter_factory;
mod identity;
mod kalman_filter;
mod matching;
mod point_tracker;
mod tracked_object;

pub use coord_transform::{CoordinateTransformation, TranslationTransformation};
pub use detection::Detection;
pub use distances::{IouDistance, MeanEuclideanDistance, ScalarDistance};
pub use error::TrackingError;
pub use filter_factory::{FilterFactory, KalmanFilterFactory, NoFilterFactory};
pub use identity::{IdentityFactory, reset_global_object_counter};
pub use kalman_filter::{Filter, LinearKalmanFilter, NoFilter};
pub use matching::{AssignmentResult, Candidate, Distance, greedy_assignment};
pub use point_tracker::{Tracker, TrackerConfig};
pub use tracked_object::TrackedObject;
