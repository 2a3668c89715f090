//! Linear Kalman filter using ndarray and a nalgebra-based inverse.

use ndarray::{Array1, Array2};

/// State filter attached to each tracked object.
///
/// The measurement is the flattened point set; overrides let a caller feed a
/// partial measurement by passing a reduced observation matrix and noise.
/// A no-op implementation exists for benchmarking; both satisfy the same
/// contract.
pub trait Filter: Send {
    /// Advance the state one step through the motion model.
    fn predict(&mut self);

    /// Correct the state with a measurement.
    ///
    /// `noise_override` and `observation_override` replace `R` and `H` for
    /// this call only, e.g. to select a subset of measurement rows.
    fn update(
        &mut self,
        measurement: &Array1<f64>,
        noise_override: Option<&Array2<f64>>,
        observation_override: Option<&Array2<f64>>,
    );

    /// The state vector: positions followed by velocities.
    fn state(&self) -> &Array1<f64>;

    /// The configured measurement noise, when the filter has one.
    fn measurement_noise(&self) -> Option<&Array2<f64>> {
        None
    }
}

/// Discrete-time linear Kalman filter with state size `dim_x` and
/// measurement size `dim_z`.
///
/// Freshly constructed filters have `f = I`, `h = [I | 0]` and zeroed
/// `q`, `r`, `p` and `x`; a filter factory overwrites the matrices with the
/// actual motion model before first use. Fields are public for exactly that
/// reason.
#[derive(Debug, Clone)]
pub struct LinearKalmanFilter {
    pub x: Array1<f64>,
    pub p: Array2<f64>,
    pub f: Array2<f64>,
    pub h: Array2<f64>,
    pub q: Array2<f64>,
    pub r: Array2<f64>,
}

impl LinearKalmanFilter {
    pub fn new(dim_x: usize, dim_z: usize) -> Self {
        let mut h = Array2::zeros((dim_z, dim_x));
        for i in 0..dim_z {
            h[[i, i]] = 1.0;
        }
        Self {
            x: Array1::zeros(dim_x),
            p: Array2::zeros((dim_x, dim_x)),
            f: Array2::eye(dim_x),
            h,
            q: Array2::zeros((dim_x, dim_x)),
            r: Array2::zeros((dim_z, dim_z)),
        }
    }

    pub fn dim_x(&self) -> usize {
        self.x.len()
    }

    pub fn dim_z(&self) -> usize {
        self.r.nrows()
    }
}

impl Filter for LinearKalmanFilter {
    fn predict(&mut self) {
        self.x = self.f.dot(&self.x);
        self.p = self.f.dot(&self.p).dot(&self.f.t()) + &self.q;
    }

    fn update(
        &mut self,
        measurement: &Array1<f64>,
        noise_override: Option<&Array2<f64>>,
        observation_override: Option<&Array2<f64>>,
    ) {
        let h = observation_override.unwrap_or(&self.h);
        let r = noise_override.unwrap_or(&self.r);

        let innovation = measurement - &h.dot(&self.x);
        let innovation_cov = h.dot(&self.p).dot(&h.t()) + r;

        // A singular innovation covariance skips the correction and keeps
        // the predicted state.
        let Some(innovation_cov_inv) = invert(&innovation_cov) else {
            return;
        };

        let gain = self.p.dot(&h.t()).dot(&innovation_cov_inv);
        let identity_minus_gain_h = Array2::eye(self.x.len()) - gain.dot(h);

        self.x = &self.x + &gain.dot(&innovation);
        self.p = identity_minus_gain_h.dot(&self.p);
    }

    fn state(&self) -> &Array1<f64> {
        &self.x
    }

    fn measurement_noise(&self) -> Option<&Array2<f64>> {
        Some(&self.r)
    }
}

/// Invert a square matrix, reporting singularity as `None`.
///
/// nalgebra's LU-based `try_inverse` handles any measurement dimension
/// without BLAS/LAPACK.
fn invert(matrix: &Array2<f64>) -> Option<Array2<f64>> {
    let n = matrix.nrows();
    let m = nalgebra::DMatrix::from_row_iterator(n, n, matrix.iter().copied());
    let inverse = m.try_inverse()?;
    Some(Array2::from_shape_fn((n, n), |(i, j)| inverse[(i, j)]))
}

/// Pass-through filter: no smoothing, no prediction.
///
/// `update` copies the measurement straight into the matching state rows,
/// which makes it a useful baseline when benchmarking the tracker without
/// filter cost.
#[derive(Debug, Clone)]
pub struct NoFilter {
    x: Array1<f64>,
}

impl NoFilter {
    pub fn new(dim_x: usize) -> Self {
        Self {
            x: Array1::zeros(dim_x),
        }
    }

    pub fn with_state(x: Array1<f64>) -> Self {
        Self { x }
    }
}

impl Filter for NoFilter {
    fn predict(&mut self) {}

    fn update(
        &mut self,
        measurement: &Array1<f64>,
        _noise_override: Option<&Array2<f64>>,
        observation_override: Option<&Array2<f64>>,
    ) {
        match observation_override {
            None => {
                for (i, value) in measurement.iter().enumerate() {
                    self.x[i] = *value;
                }
            }
            Some(h) => {
                for (row, value) in measurement.iter().enumerate() {
                    if let Some(col) = h.row(row).iter().position(|&entry| entry != 0.0) {
                        self.x[col] = *value;
                    }
                }
            }
        }
    }

    fn state(&self) -> &Array1<f64> {
        &self.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn new_filter_has_identity_transition_and_position_observation() {
        let kf = LinearKalmanFilter::new(4, 2);
        assert_eq!(kf.f, Array2::eye(4));
        assert_eq!(kf.h, array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]]);
        assert_eq!(kf.dim_x(), 4);
        assert_eq!(kf.dim_z(), 2);
    }

    #[test]
    fn predict_applies_constant_velocity() {
        let mut kf = LinearKalmanFilter::new(2, 1);
        kf.f = array![[1.0, 1.0], [0.0, 1.0]];
        kf.x = array![0.0, 2.0];

        kf.predict();
        assert_eq!(kf.x, array![2.0, 2.0]);
        kf.predict();
        assert_eq!(kf.x, array![4.0, 2.0]);
    }

    #[test]
    fn update_pulls_state_toward_measurement() {
        let mut kf = LinearKalmanFilter::new(2, 1);
        kf.p = Array2::eye(2);
        kf.r = array![[1.0]];

        kf.update(&array![2.0], None, None);
        assert!(kf.x[0] > 0.0 && kf.x[0] < 2.0);
    }

    #[test]
    fn singular_innovation_covariance_skips_update() {
        // P = 0 and R = 0 make S = 0, which must leave state untouched.
        let mut kf = LinearKalmanFilter::new(4, 2);
        kf.x = array![1.0, 2.0, 0.5, 0.5];
        let state_before = kf.x.clone();
        let cov_before = kf.p.clone();

        kf.update(&array![10.0, 10.0], None, None);

        assert_eq!(kf.x, state_before);
        assert_eq!(kf.p, cov_before);
    }

    #[test]
    fn reduced_observation_only_corrects_selected_rows() {
        let mut kf = LinearKalmanFilter::new(4, 2);
        kf.p = Array2::eye(4);

        // Only the second position row is observed.
        let h = array![[0.0, 1.0, 0.0, 0.0]];
        let r = array![[1.0]];
        kf.update(&array![4.0], Some(&r), Some(&h));

        assert_abs_diff_eq!(kf.x[0], 0.0, epsilon = 1e-12);
        assert!(kf.x[1] > 0.0);
    }

    #[test]
    fn no_filter_copies_measurement() {
        let mut filter = NoFilter::new(4);
        filter.update(&array![1.0, 2.0], None, None);
        assert_eq!(filter.state(), &array![1.0, 2.0, 0.0, 0.0]);

        let h = array![[0.0, 1.0, 0.0, 0.0]];
        filter.update(&array![9.0], None, Some(&h));
        assert_eq!(filter.state(), &array![1.0, 9.0, 0.0, 0.0]);
    }
}
