//! Factories building a configured filter for each new tracked object.

use ndarray::Array2;

use crate::tracker::detection::Detection;
use crate::tracker::kalman_filter::{Filter, LinearKalmanFilter, NoFilter};

/// Builds the filter a tracked object carries for its whole life.
///
/// The state layout is fixed by the tracker: `N * D` positions followed by
/// `N * D` velocities, with the flattened absolute points of the spawning
/// detection as the initial position block.
pub trait FilterFactory: Send {
    fn create_filter(&self, detection: &Detection) -> Box<dyn Filter>;
}

/// Constant-velocity Kalman filter factory.
///
/// `process_variance` scales the whole process-noise block built from
/// `position_variance`, `velocity_variance` and the optional
/// position/velocity covariance. Measurement noise is isotropic and the
/// initial covariance is a scaled identity.
#[derive(Debug, Clone)]
pub struct KalmanFilterFactory {
    pub measurement_variance: f64,
    pub process_variance: f64,
    pub position_variance: f64,
    pub velocity_variance: f64,
    pub position_velocity_covariance: f64,
    pub initial_covariance: f64,
}

impl Default for KalmanFilterFactory {
    fn default() -> Self {
        Self {
            measurement_variance: 4.0,
            process_variance: 0.1,
            position_variance: 1.0,
            velocity_variance: 1.0,
            position_velocity_covariance: 0.0,
            initial_covariance: 10.0,
        }
    }
}

impl FilterFactory for KalmanFilterFactory {
    fn create_filter(&self, detection: &Detection) -> Box<dyn Filter> {
        let dim_z = detection.num_points() * detection.dim_points();
        let dim_x = 2 * dim_z;
        let mut kf = LinearKalmanFilter::new(dim_x, dim_z);

        // positions <- positions + velocities
        for i in 0..dim_z {
            kf.f[[i, dim_z + i]] = 1.0;
        }

        for i in 0..dim_z {
            kf.q[[i, i]] = self.process_variance * self.position_variance;
            kf.q[[dim_z + i, dim_z + i]] = self.process_variance * self.velocity_variance;
            kf.q[[i, dim_z + i]] = self.process_variance * self.position_velocity_covariance;
            kf.q[[dim_z + i, i]] = self.process_variance * self.position_velocity_covariance;
        }

        kf.r = Array2::eye(dim_z) * self.measurement_variance;
        kf.p = Array2::eye(dim_x) * self.initial_covariance;

        for (i, value) in detection.abs_points().iter().enumerate() {
            kf.x[i] = *value;
        }

        Box::new(kf)
    }
}

/// Factory for the pass-through [`NoFilter`].
#[derive(Debug, Clone, Default)]
pub struct NoFilterFactory;

impl FilterFactory for NoFilterFactory {
    fn create_filter(&self, detection: &Detection) -> Box<dyn Filter> {
        let dim_z = detection.num_points() * detection.dim_points();
        let mut filter = NoFilter::new(2 * dim_z);
        let flattened = detection.abs_points().iter().copied().collect();
        filter.update(&flattened, None, None);
        Box::new(filter)
    }
}
