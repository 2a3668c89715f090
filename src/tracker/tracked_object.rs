//! A single tracked identity and its per-frame bookkeeping.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use ndarray::{Array1, Array2};

use crate::tracker::coord_transform::CoordinateTransformation;
use crate::tracker::detection::Detection;
use crate::tracker::filter_factory::FilterFactory;
use crate::tracker::identity::IdentityFactory;
use crate::tracker::kalman_filter::Filter;
use crate::tracker::point_tracker::TrackerConfig;

/// A long-lived identity maintained across frames.
///
/// Objects start initializing and only expose a permanent `id`/`global_id`
/// pair once their hit counter has climbed past the initialization delay.
/// The filter state lives in the absolute frame; the relative view is
/// recovered through the coordinate transform supplied with each frame.
pub struct TrackedObject {
    /// Permanent per-tracker id; set exactly once, at promotion.
    pub id: Option<u64>,
    /// Process-wide id assigned together with `id`.
    pub global_id: Option<u64>,
    /// Id used while the object is still initializing.
    pub initializing_id: Option<u64>,
    pub is_initializing: bool,
    /// Frames this object has existed, counting the spawn frame.
    pub age: u64,
    pub hit_counter: i64,
    /// Remaining ReID lifetime once `hit_counter` has gone negative.
    pub reid_hit_counter: Option<i64>,
    pub num_points: usize,
    pub dim_points: usize,
    /// Label mirrored from the spawning detection; fixed for life.
    pub label: Option<String>,
    /// Latest appearance vector seen in a matched detection.
    pub embedding: Option<Array1<f64>>,
    /// Distance of the match that produced the last hit.
    pub last_distance: Option<f64>,
    /// Smallest candidate distance seen in the most recent matching stage.
    pub current_min_distance: Option<f64>,
    /// The most recent matched (or spawning) detection.
    pub last_detection: Detection,
    /// Bounded FIFO of matched detections, oldest first.
    pub past_detections: VecDeque<Detection>,

    point_hit_counter: Vec<i64>,
    filter: Box<dyn Filter>,
    coordinate_transform: Option<Arc<dyn CoordinateTransformation>>,

    hit_counter_max: i64,
    initialization_delay: i64,
    pointwise_hit_counter_max: i64,
    detection_threshold: f64,
    past_detections_length: usize,
    reid_hit_counter_max: Option<i64>,
}

impl TrackedObject {
    pub(crate) fn new(
        detection: Detection,
        config: &TrackerConfig,
        initialization_delay: i64,
        filter_factory: &dyn FilterFactory,
        identity: &IdentityFactory,
        coordinate_transform: Option<Arc<dyn CoordinateTransformation>>,
    ) -> Self {
        let num_points = detection.num_points();
        let dim_points = detection.dim_points();
        let filter = filter_factory.create_filter(&detection);

        let point_hit_counter = match detection.scores() {
            None => vec![1; num_points],
            Some(scores) => scores
                .iter()
                .map(|&score| i64::from(score >= config.detection_threshold))
                .collect(),
        };

        Self {
            id: None,
            global_id: None,
            initializing_id: Some(identity.next_initializing_id()),
            is_initializing: true,
            age: 1,
            hit_counter: 1,
            reid_hit_counter: None,
            num_points,
            dim_points,
            label: detection.label.clone(),
            embedding: detection.embedding.clone(),
            last_distance: None,
            current_min_distance: None,
            past_detections: VecDeque::new(),
            point_hit_counter,
            filter,
            coordinate_transform,
            hit_counter_max: config.hit_counter_max,
            initialization_delay,
            pointwise_hit_counter_max: config.pointwise_hit_counter_max,
            detection_threshold: config.detection_threshold,
            past_detections_length: config.past_detections_length,
            reid_hit_counter_max: config.reid_hit_counter_max,
            last_detection: detection,
        }
    }

    /// Advance one frame without a match: spend counters, age, predict.
    pub(crate) fn tracker_step(&mut self) {
        self.hit_counter -= 1;
        if let Some(reid_max) = self.reid_hit_counter_max {
            if self.hit_counter < 0 {
                self.reid_hit_counter = Some(match self.reid_hit_counter {
                    None => reid_max,
                    Some(count) => count - 1,
                });
            }
        }
        self.age += 1;
        for counter in &mut self.point_hit_counter {
            *counter = (*counter - 1).max(0);
        }
        self.filter.predict();
    }

    /// Credit a matched detection: counters, promotion, filter correction,
    /// detection capture.
    pub(crate) fn hit(&mut self, mut detection: Detection, period: i64, identity: &IdentityFactory) {
        let live: Vec<bool> = match detection.scores() {
            None => vec![true; self.num_points],
            Some(scores) => scores
                .iter()
                .map(|&score| score >= self.detection_threshold)
                .collect(),
        };

        self.hit_counter = (self.hit_counter + 2 * period).min(self.hit_counter_max);
        if self.is_initializing && self.hit_counter > self.initialization_delay {
            self.promote(identity);
        }
        self.reid_hit_counter = None;

        for (counter, &alive) in self.point_hit_counter.iter_mut().zip(&live) {
            if alive {
                *counter += 2 * period;
            }
            *counter = (*counter).clamp(0, self.pointwise_hit_counter_max);
        }

        self.update_filter(&detection, &live);

        if detection.embedding.is_some() {
            self.embedding = detection.embedding.clone();
        }

        detection.age = Some(self.age);
        if self.past_detections_length > 0 {
            self.past_detections.push_back(detection.clone());
            if self.past_detections.len() > self.past_detections_length {
                self.past_detections.pop_front();
            }
        }
        self.last_detection = detection;
    }

    /// Feed the flattened absolute points into the filter. When some points
    /// are below the detection threshold, a reduced observation matrix and
    /// noise select the live coordinate rows only.
    fn update_filter(&mut self, detection: &Detection, live: &[bool]) {
        let measurement: Vec<f64> = detection.abs_points().iter().copied().collect();

        let live_rows: Vec<usize> = live
            .iter()
            .enumerate()
            .filter(|&(_, &alive)| alive)
            .flat_map(|(point, _)| {
                (point * self.dim_points)..((point + 1) * self.dim_points)
            })
            .collect();

        if live_rows.len() == measurement.len() {
            self.filter.update(&Array1::from_vec(measurement), None, None);
        } else if !live_rows.is_empty() {
            let dim_x = self.filter.state().len();
            let measurement_sub =
                Array1::from_iter(live_rows.iter().map(|&row| measurement[row]));
            let mut observation_sub = Array2::zeros((live_rows.len(), dim_x));
            for (sub, &row) in live_rows.iter().enumerate() {
                observation_sub[[sub, row]] = 1.0;
            }
            let noise_sub = self.filter.measurement_noise().map(|noise| {
                Array2::from_shape_fn((live_rows.len(), live_rows.len()), |(a, b)| {
                    noise[[live_rows[a], live_rows[b]]]
                })
            });
            self.filter
                .update(&measurement_sub, noise_sub.as_ref(), Some(&observation_sub));
        }
        // no live points: keep the predicted state
    }

    fn promote(&mut self, identity: &IdentityFactory) {
        let (id, global_id) = identity.next_ids();
        self.id = Some(id);
        self.global_id = Some(global_id);
        self.is_initializing = false;
        self.initializing_id = None;
    }

    /// Absorb a re-identified predecessor: take over its identity and, where
    /// this object has none yet, its appearance and history.
    pub(crate) fn merge(&mut self, absorbed: TrackedObject) {
        if absorbed.id.is_some() {
            self.id = absorbed.id;
            self.global_id = absorbed.global_id;
            self.is_initializing = false;
            self.initializing_id = None;
        }
        self.reid_hit_counter = None;
        if self.embedding.is_none() {
            self.embedding = absorbed.embedding;
        }
        if self.past_detections.is_empty() {
            self.past_detections = absorbed.past_detections;
        }
    }

    pub(crate) fn set_coordinate_transform(
        &mut self,
        transform: Option<Arc<dyn CoordinateTransformation>>,
    ) {
        if transform.is_some() {
            self.coordinate_transform = transform;
        }
    }

    fn absolute_positions(&self) -> Array2<f64> {
        let state = self.filter.state();
        Array2::from_shape_fn((self.num_points, self.dim_points), |(i, j)| {
            state[i * self.dim_points + j]
        })
    }

    /// Current position estimate as an `N x D` matrix.
    ///
    /// `absolute` selects the raw filter state; otherwise the points are
    /// projected back into the camera frame through the last coordinate
    /// transform seen (a no-op when none was ever supplied).
    pub fn get_estimate(&self, absolute: bool) -> Array2<f64> {
        let positions = self.absolute_positions();
        if absolute {
            return positions;
        }
        match &self.coordinate_transform {
            Some(transform) => transform.abs_to_rel(&positions),
            None => positions,
        }
    }

    /// Camera-relative estimate; shorthand for `get_estimate(false)`.
    pub fn estimate(&self) -> Array2<f64> {
        self.get_estimate(false)
    }

    /// Estimated per-point velocities as an `N x D` matrix.
    pub fn velocities(&self) -> Array2<f64> {
        let state = self.filter.state();
        let offset = self.num_points * self.dim_points;
        Array2::from_shape_fn((self.num_points, self.dim_points), |(i, j)| {
            state[offset + i * self.dim_points + j]
        })
    }

    /// Which points are currently considered reliable.
    pub fn live_points(&self) -> Vec<bool> {
        self.point_hit_counter.iter().map(|&count| count > 0).collect()
    }

    pub fn point_hit_counters(&self) -> &[i64] {
        &self.point_hit_counter
    }
}

impl fmt::Debug for TrackedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedObject")
            .field("id", &self.id)
            .field("global_id", &self.global_id)
            .field("initializing_id", &self.initializing_id)
            .field("is_initializing", &self.is_initializing)
            .field("age", &self.age)
            .field("hit_counter", &self.hit_counter)
            .field("reid_hit_counter", &self.reid_hit_counter)
            .field("label", &self.label)
            .field("estimate", &self.estimate())
            .finish()
    }
}
