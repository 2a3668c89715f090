//! Main tracker pipeline: one `update` call per frame.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::tracker::coord_transform::CoordinateTransformation;
use crate::tracker::detection::Detection;
use crate::tracker::distances::MeanEuclideanDistance;
use crate::tracker::error::TrackingError;
use crate::tracker::filter_factory::{FilterFactory, KalmanFilterFactory};
use crate::tracker::identity::IdentityFactory;
use crate::tracker::matching::{greedy_assignment, Candidate, Distance};
use crate::tracker::tracked_object::TrackedObject;

/// Configuration for the tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Match cutoff for the primary distance; strictly-below matches only.
    pub distance_threshold: f64,
    /// Upper clamp for hit counter credits.
    pub hit_counter_max: i64,
    /// Hit count an object must climb past to be promoted; defaults to
    /// `hit_counter_max / 2` and must lie in `[0, hit_counter_max)`.
    pub initialization_delay: Option<i64>,
    /// Upper clamp for per-point counters.
    pub pointwise_hit_counter_max: i64,
    /// Score below which a detection point is considered absent.
    pub detection_threshold: f64,
    /// Capacity of each object's past-detections FIFO.
    pub past_detections_length: usize,
    /// Match cutoff for the ReID distance.
    pub reid_distance_threshold: f64,
    /// Frames a dead object stays eligible for re-identification;
    /// `None` disables ReID entirely.
    pub reid_hit_counter_max: Option<i64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 1.0,
            hit_counter_max: 15,
            initialization_delay: None,
            pointwise_hit_counter_max: 4,
            detection_threshold: 0.0,
            past_detections_length: 4,
            reid_distance_threshold: 0.0,
            reid_hit_counter_max: None,
        }
    }
}

/// Multi-object tracker over point-set detections.
///
/// Not safe for concurrent updates: one instance is driven from one thread,
/// while independent instances may run in parallel and still draw unique
/// global ids.
pub struct Tracker {
    objects: Vec<TrackedObject>,
    distance_function: Box<dyn Distance>,
    reid_distance_function: Option<Box<dyn Distance>>,
    filter_factory: Box<dyn FilterFactory>,
    config: TrackerConfig,
    initialization_delay: i64,
    identity: IdentityFactory,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("objects", &self.objects)
            .field("config", &self.config)
            .field("initialization_delay", &self.initialization_delay)
            .finish()
    }
}

struct StageOutcome {
    matched_objects: Vec<usize>,
    unmatched_objects: Vec<usize>,
    unmatched_detections: Vec<usize>,
}

impl Tracker {
    pub fn new(
        distance_function: Box<dyn Distance>,
        config: TrackerConfig,
    ) -> Result<Self, TrackingError> {
        let initialization_delay = config
            .initialization_delay
            .unwrap_or(config.hit_counter_max / 2);
        if initialization_delay < 0 || initialization_delay >= config.hit_counter_max {
            return Err(TrackingError::InvalidInitializationDelay {
                delay: initialization_delay,
                hit_counter_max: config.hit_counter_max,
            });
        }
        Ok(Self {
            objects: Vec::new(),
            distance_function,
            reid_distance_function: None,
            filter_factory: Box::new(KalmanFilterFactory::default()),
            config,
            initialization_delay,
            identity: IdentityFactory::default(),
        })
    }

    /// Mean-Euclidean distance with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(Box::new(MeanEuclideanDistance), TrackerConfig::default())
            .expect("default configuration is valid")
    }

    /// Replace the filter factory used for newly spawned objects.
    pub fn with_filter_factory(mut self, filter_factory: Box<dyn FilterFactory>) -> Self {
        self.filter_factory = filter_factory;
        self
    }

    /// Install a ReID distance, enabling the re-identification stage.
    pub fn with_reid_distance(mut self, reid_distance_function: Box<dyn Distance>) -> Self {
        self.reid_distance_function = Some(reid_distance_function);
        self
    }

    /// Every object the tracker currently holds, including initializing and
    /// ReID-eligible ones, in insertion order.
    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    /// Number of permanent ids this tracker has issued.
    pub fn total_object_count(&self) -> u64 {
        self.identity.object_count()
    }

    /// Process one frame with `period = 1` and no coordinate transform.
    pub fn update(
        &mut self,
        detections: Vec<Detection>,
    ) -> Result<Vec<&TrackedObject>, TrackingError> {
        self.update_with(detections, 1, None)
    }

    /// Process one frame.
    ///
    /// `period` is the number of source frames between processed frames;
    /// hit-counter credits scale with it. Returns the active objects:
    /// initialized and not past their death counter, in insertion order.
    pub fn update_with(
        &mut self,
        detections: Vec<Detection>,
        period: u32,
        coordinate_transform: Option<Arc<dyn CoordinateTransformation>>,
    ) -> Result<Vec<&TrackedObject>, TrackingError> {
        let period = i64::from(period.max(1));
        let mut detections: Vec<Option<Detection>> =
            detections.into_iter().map(Some).collect();

        // 1. move the detections into the absolute frame
        if let Some(transform) = &coordinate_transform {
            for detection in detections.iter_mut().flatten() {
                detection.abs_points = transform.rel_to_abs(&detection.abs_points);
            }
        }

        // 2. drop dead objects, partitioning the survivors before their
        //    counters are spent on this frame's predict
        match self.config.reid_hit_counter_max {
            None => self.objects.retain(|object| object.hit_counter >= 0),
            Some(_) => self
                .objects
                .retain(|object| object.reid_hit_counter.is_none_or(|count| count >= 0)),
        }

        let mut initialized = Vec::new();
        let mut initializing = Vec::new();
        let mut dead_for_reid = Vec::new();
        for (index, object) in self.objects.iter().enumerate() {
            if object.hit_counter < 0 {
                dead_for_reid.push(index);
            } else if object.is_initializing {
                initializing.push(index);
            } else {
                initialized.push(index);
            }
        }

        // 3. advance every survivor one frame
        for object in &mut self.objects {
            object.tracker_step();
            object.set_coordinate_transform(coordinate_transform.clone());
        }

        // 4. match initialized objects against the incoming detections
        let all_detections: Vec<usize> = (0..detections.len()).collect();
        let first = self.match_detections(&initialized, &all_detections, &mut detections, period)?;

        // 5. match initializing objects against the leftovers
        let second = self.match_detections(
            &initializing,
            &first.unmatched_detections,
            &mut detections,
            period,
        )?;

        // 6. re-identify: lost identities may continue through freshly
        //    matched initializing objects
        self.run_reid(&second.matched_objects, &first.unmatched_objects, &dead_for_reid)?;

        // 7. spawn new initializing objects from the remaining detections
        for slot in detections.iter_mut() {
            let Some(detection) = slot.take() else { continue };
            if detection.abs_points().iter().any(|value| !value.is_finite()) {
                warn!("skipping detection with non-finite transformed points");
                continue;
            }
            self.objects.push(TrackedObject::new(
                detection,
                &self.config,
                self.initialization_delay,
                self.filter_factory.as_ref(),
                &self.identity,
                coordinate_transform.clone(),
            ));
        }

        // 8. active set: initialized and not yet dead
        Ok(self
            .objects
            .iter()
            .filter(|object| !object.is_initializing && object.hit_counter >= 0)
            .collect())
    }

    /// One association stage: distances, greedy assignment, hits.
    ///
    /// Index lists refer to `self.objects` and the detection slots; matched
    /// detections are consumed from their slots.
    fn match_detections(
        &mut self,
        object_indices: &[usize],
        detection_indices: &[usize],
        detections: &mut [Option<Detection>],
        period: i64,
    ) -> Result<StageOutcome, TrackingError> {
        if object_indices.is_empty() || detection_indices.is_empty() {
            return Ok(StageOutcome {
                matched_objects: vec![],
                unmatched_objects: object_indices.to_vec(),
                unmatched_detections: detection_indices.to_vec(),
            });
        }

        let cost = {
            let detection_slots: &[Option<Detection>] = detections;
            let object_refs: Vec<&TrackedObject> = object_indices
                .iter()
                .map(|&index| &self.objects[index])
                .collect();
            let candidate_refs: Vec<Candidate<'_>> = detection_indices
                .iter()
                .map(|&index| {
                    Candidate::Detection(
                        detection_slots[index]
                            .as_ref()
                            .expect("detection slot consumed before matching"),
                    )
                })
                .collect();
            self.distance_function.get_distances(&object_refs, &candidate_refs)
        };

        for (row, &object_index) in object_indices.iter().enumerate() {
            let row_min = cost.row(row).iter().copied().fold(f64::INFINITY, f64::min);
            self.objects[object_index].current_min_distance =
                row_min.is_finite().then_some(row_min);
        }

        let assignment = greedy_assignment(&cost, self.config.distance_threshold)?;

        let mut matched_objects = Vec::with_capacity(assignment.matches.len());
        for &(row, col) in &assignment.matches {
            let object_index = object_indices[row];
            let detection_index = detection_indices[col];
            let detection = detections[detection_index]
                .take()
                .expect("matched detection consumed twice");
            self.objects[object_index].last_distance = Some(cost[[row, col]]);
            self.objects[object_index].hit(detection, period, &self.identity);
            matched_objects.push(object_index);
        }

        Ok(StageOutcome {
            matched_objects,
            unmatched_objects: assignment
                .unmatched_objects
                .iter()
                .map(|&row| object_indices[row])
                .collect(),
            unmatched_detections: assignment
                .unmatched_candidates
                .iter()
                .map(|&col| detection_indices[col])
                .collect(),
        })
    }

    /// ReID stage: matched initializing objects (rows) against unmatched
    /// initialized objects plus dead-but-ReID-eligible ones (columns). A
    /// match merges the old identity into the new object and removes the
    /// absorbed one.
    fn run_reid(
        &mut self,
        matched_initializing: &[usize],
        unmatched_initialized: &[usize],
        dead_for_reid: &[usize],
    ) -> Result<(), TrackingError> {
        let Some(reid_distance) = &self.reid_distance_function else {
            return Ok(());
        };

        let mut candidate_indices = unmatched_initialized.to_vec();
        candidate_indices.extend_from_slice(dead_for_reid);
        if matched_initializing.is_empty() || candidate_indices.is_empty() {
            return Ok(());
        }

        let cost = {
            let object_refs: Vec<&TrackedObject> = matched_initializing
                .iter()
                .map(|&index| &self.objects[index])
                .collect();
            let candidate_refs: Vec<Candidate<'_>> = candidate_indices
                .iter()
                .map(|&index| Candidate::Object(&self.objects[index]))
                .collect();
            reid_distance.get_distances(&object_refs, &candidate_refs)
        };

        let assignment = greedy_assignment(&cost, self.config.reid_distance_threshold)?;
        if assignment.matches.is_empty() {
            return Ok(());
        }

        let mut slots: Vec<Option<TrackedObject>> =
            self.objects.drain(..).map(Some).collect();
        for &(row, col) in &assignment.matches {
            let absorbed = slots[candidate_indices[col]]
                .take()
                .expect("ReID candidate absorbed twice");
            let keeper = slots[matched_initializing[row]]
                .as_mut()
                .expect("ReID target was absorbed");
            debug!(id = ?absorbed.id, "re-identified lost object");
            keeper.merge(absorbed);
        }
        self.objects = slots.into_iter().flatten().collect();

        Ok(())
    }
}
