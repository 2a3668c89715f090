//! Integration module for connecting detection producers with the tracker.
//!
//! This module provides traits and utilities for feeding any per-frame
//! detection source (a neural detector, a sensor driver, recorded data)
//! into the tracking pipeline.

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::{PipelineError, TrackingPipeline};
