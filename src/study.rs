//! Stages of the mockup study, from ground truth sampling to likelihood profiles.
//!
//! Each stage is a plain function returning plain data so that figures and
//! array dumps can be produced from a [StudyReport] afterwards.

use crate::benchmark::MockupFunction;
use crate::config::StudyConfig;
use crate::errors::{MockupError, Result};

use gpsur_doe::Grid;
use gpsur_gp::metrics::{PredictScore, coverage, max_abs_error, rmse};
use gpsur_gp::{GpSurrogate, SqExpSurrogate, SquaredExponentialKernel, gp_nll};
use linfa::prelude::{Dataset, Fit};
use ndarray::{Array, Array1, Array2, Zip, array, s};

use log::{debug, info, warn};

/// Surrogate model of the study
pub type Surrogate = GpSurrogate<f64, SquaredExponentialKernel>;

/// Quantile of the standard normal distribution for 95% two-sided intervals
pub const Z95: f64 = 1.96;

/// Mockup function sampled on the full grid
#[derive(Clone, Debug)]
pub struct GroundTruth {
    /// Full (u, v) grid
    pub grid: Grid<f64>,
    /// `u` levels
    pub u: Array1<f64>,
    /// `v` levels
    pub v: Array1<f64>,
    /// Values `y[[i, j]] = f(u[j], v[i])` of shape (len(v), len(u))
    pub y: Array2<f64>,
}

/// Training data taken on a sub-grid of the ground truth
#[derive(Clone, Debug)]
pub struct TrainingSet {
    /// Training sub-grid
    pub grid: Grid<f64>,
    /// Inputs (n, 2) with rows `[u, v]`, `u` varying fastest
    pub x: Array2<f64>,
    /// Outputs (n,)
    pub y: Array1<f64>,
}

/// Surrogate predictions along the `v = v0` slice
#[derive(Clone, Debug)]
pub struct TestSlice {
    /// Slice position, one of the training `v` levels
    pub v0: f64,
    /// Test inputs (n, 2) with rows `[u, v0]`
    pub x: Array2<f64>,
    /// Mockup function values at test inputs
    pub reference: Array1<f64>,
    /// Surrogate mean
    pub mean: Array1<f64>,
    /// Surrogate latent standard deviation
    pub std: Array1<f64>,
    /// Training inputs lying on the slice
    pub train_x: Array2<f64>,
    /// Training outputs lying on the slice
    pub train_y: Array1<f64>,
    /// Half width of training error bars, `1.96 sigma`
    pub error_bar: f64,
}

/// Negative log likelihood evaluated over candidate values of one hyperparameter
#[derive(Clone, Debug)]
pub struct NllProfile {
    /// Candidate hyperparameter values
    pub values: Array1<f64>,
    /// Negative log likelihood at each value, NaN where it cannot be computed
    pub nll: Array1<f64>,
}

impl NllProfile {
    /// Candidate value with the smallest finite likelihood if any
    pub fn argmin(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .zip(self.nll.iter())
            .filter(|(_, nll)| nll.is_finite())
            .fold(None, |best, (&v, &nll)| match best {
                Some((_, b)) if b <= nll => best,
                _ => Some((v, nll)),
            })
    }
}

/// Outputs of all study stages with the surrogate quality summary
#[derive(Clone, Debug)]
pub struct StudyReport {
    /// Ground truth grid
    pub truth: GroundTruth,
    /// Training set
    pub train: TrainingSet,
    /// Fitted surrogate
    pub surrogate: Surrogate,
    /// Predictions along the test slice
    pub slice: TestSlice,
    /// Likelihood profile over the length scale
    pub length_scale_profile: NllProfile,
    /// Likelihood profile over the noise standard deviation
    pub noise_profile: NllProfile,
    /// Root mean square error on the test slice
    pub rmse: f64,
    /// Largest absolute error on the test slice
    pub max_abs_error: f64,
    /// Fraction of test references within the 95% interval
    pub coverage95: f64,
    /// Leave-one-out Q2 of the surrogate
    pub looq2: f64,
}

/// Samples the mockup function on the full `levels x levels` grid
pub fn ground_truth(f: &MockupFunction, cfg: &StudyConfig) -> Result<GroundTruth> {
    let xlimits = array![
        [cfg.u_bounds.0, cfg.u_bounds.1],
        [cfg.v_bounds.0, cfg.v_bounds.1]
    ];
    let grid = Grid::linspace(&xlimits, &[cfg.levels, cfg.levels]);
    let (u, v) = (grid.axes()[0].to_owned(), grid.axes()[1].to_owned());
    let (uu, vv) = grid
        .meshgrid()
        .ok_or_else(|| MockupError::InvalidConfigError("reference grid should be 2D".to_string()))?;
    let y = Zip::from(&uu).and(&vv).map_collect(|&u, &v| f.eval(u, v));
    Ok(GroundTruth { grid, u, v, y })
}

/// Keeps every `train_step`-th level of each input of the ground truth grid
pub fn training_set(f: &MockupFunction, truth: &GroundTruth, cfg: &StudyConfig) -> TrainingSet {
    let grid = truth.grid.every(cfg.train_step);
    let x = grid.points();
    let y = f.eval_rows(&x);
    TrainingSet { grid, x, y }
}

/// Fits the surrogate with estimated length scale and noise, and unit signal variance
pub fn fit_surrogate(train: &TrainingSet, cfg: &StudyConfig) -> Result<Surrogate> {
    let sur = SqExpSurrogate::params()
        .seed(cfg.seed)
        .fit(&Dataset::new(train.x.to_owned(), train.y.to_owned()))?;
    Ok(sur)
}

/// Predicts along `v = v0`, the `test_row`-th training level of `v`, at every `u` level
pub fn test_slice(
    f: &MockupFunction,
    truth: &GroundTruth,
    train: &TrainingSet,
    sur: &Surrogate,
    cfg: &StudyConfig,
) -> Result<TestSlice> {
    let v0 = train.grid.axes()[1][cfg.test_row];
    let x = Array2::from_shape_fn((truth.u.len(), 2), |(k, j)| if j == 0 { truth.u[k] } else { v0 });
    let reference = f.eval_rows(&x);
    let mean = sur.predict(&x)?;
    let std = sur.predict_std(&x)?;

    // training points are stored by v levels, u varying fastest
    let nu = train.grid.axes()[0].len();
    let rows = cfg.test_row * nu..(cfg.test_row + 1) * nu;
    let train_x = train.x.slice(s![rows.clone(), ..]).to_owned();
    let train_y = train.y.slice(s![rows]).to_owned();

    Ok(TestSlice {
        v0,
        x,
        reference,
        mean,
        std,
        train_x,
        train_y,
        error_bar: Z95 * sur.sigma(),
    })
}

fn profile_nll(hyp: &[f64], train: &TrainingSet, sigma: f64) -> f64 {
    gp_nll(hyp, &train.x, &train.y, sigma).unwrap_or_else(|err| {
        warn!("NLL undefined at hyperparameters {hyp:?} and sigma={sigma}: {err}");
        f64::NAN
    })
}

/// NLL over evenly spaced length scales with the given noise standard deviation
pub fn length_scale_profile(train: &TrainingSet, sigma: f64, cfg: &StudyConfig) -> NllProfile {
    let (lmin, lmax) = cfg.length_scale_range;
    let values = Array::linspace(lmin, lmax, cfg.length_scale_points);
    let nll = values.mapv(|l| profile_nll(&[l, cfg.scan_signal_variance], train, sigma));
    NllProfile { values, nll }
}

/// NLL over noise standard deviations from 1e-2 of the training outputs range
/// down to `noise_scan_end`, with fixed kernel hyperparameters
pub fn noise_profile(train: &TrainingSet, cfg: &StudyConfig) -> NllProfile {
    let (ymin, ymax) = train
        .y
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, up), &v| (lo.min(v), up.max(v)));
    let start = 1e-2 * (ymax - ymin);
    let values = Array::linspace(start, cfg.noise_scan_end, cfg.noise_scan_points);
    let nll = values.mapv(|sigma| profile_nll(&cfg.noise_scan_hyperparameters, train, sigma));
    NllProfile { values, nll }
}

/// Runs all study stages and logs a summary of the surrogate quality
pub fn run(cfg: &StudyConfig) -> Result<StudyReport> {
    cfg.check()?;
    let f = MockupFunction::new(cfg.r);

    let truth = ground_truth(&f, cfg)?;
    info!(
        "Ground truth sampled on {}x{} grid",
        truth.u.len(),
        truth.v.len()
    );

    let train = training_set(&f, &truth, cfg);
    info!("Training set of {} points", train.y.len());
    debug!("xtrain = {}", train.x);

    let surrogate = fit_surrogate(&train, cfg)?;
    info!("Surrogate: {surrogate}");

    let slice = test_slice(&f, &truth, &train, &surrogate, cfg)?;
    let rmse = rmse(&slice.reference, &slice.mean);
    let max_abs_error = max_abs_error(&slice.reference, &slice.mean);
    let coverage95 = coverage(&slice.reference, &slice.mean, &slice.std, Z95);
    let looq2 = surrogate.looq2_score()?;

    let length_scale_profile = length_scale_profile(&train, surrogate.sigma(), cfg);
    let noise_profile = noise_profile(&train, cfg);
    if let Some((l, nll)) = length_scale_profile.argmin() {
        info!("Length scale profile minimum nll={nll} at l={l}");
    }
    if let Some((sigma, nll)) = noise_profile.argmin() {
        info!("Noise profile minimum nll={nll} at sigma={sigma}");
    }

    info!(
        "Test slice v0={}: rmse={rmse:.3e}, max abs error={max_abs_error:.3e}, 95% coverage={coverage95:.2}, LOO Q2={looq2:.4}",
        slice.v0
    );

    Ok(StudyReport {
        truth,
        train,
        surrogate,
        slice,
        length_scale_profile,
        noise_profile,
        rmse,
        max_abs_error,
        coverage95,
        looq2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ground_truth_layout() {
        let cfg = StudyConfig::default();
        let f = MockupFunction::default();
        let truth = ground_truth(&f, &cfg).unwrap();
        assert_eq!((20, 20), truth.y.dim());
        assert_abs_diff_eq!(truth.u[0], 4.7);
        assert_abs_diff_eq!(truth.v[19], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(truth.y[[3, 7]], f.eval(truth.u[7], truth.v[3]));
    }

    #[test]
    fn test_training_set_ordering() {
        let cfg = StudyConfig::default();
        let f = MockupFunction::default();
        let truth = ground_truth(&f, &cfg).unwrap();
        let train = training_set(&f, &truth, &cfg);
        assert_eq!((16, 2), train.x.dim());
        // v outer, u inner
        assert_abs_diff_eq!(train.x.row(1)[0], truth.u[5]);
        assert_abs_diff_eq!(train.x.row(1)[1], truth.v[0]);
        assert_abs_diff_eq!(train.x.row(4)[0], truth.u[0]);
        assert_abs_diff_eq!(train.x.row(4)[1], truth.v[5]);
        assert_abs_diff_eq!(train.y[4], truth.y[[5, 0]]);
    }

    #[test]
    fn test_slice_on_training_level() {
        let cfg = StudyConfig::default();
        let f = MockupFunction::default();
        let truth = ground_truth(&f, &cfg).unwrap();
        let train = training_set(&f, &truth, &cfg);
        let sur = fit_surrogate(&train, &cfg).expect("GP fit error");
        let slice = test_slice(&f, &truth, &train, &sur, &cfg).unwrap();

        assert_abs_diff_eq!(slice.v0, truth.v[5], epsilon = 1e-12);
        assert_eq!(4, slice.train_x.nrows());
        assert!(slice.train_x.column(1).iter().all(|&v| v == slice.v0));
        let std = sur.predict_var(&slice.x).unwrap().mapv(f64::sqrt);
        assert_abs_diff_eq!(slice.std, std, epsilon = 1e-12);
        assert_abs_diff_eq!(slice.error_bar, Z95 * sur.sigma());
    }

    #[test]
    fn test_profiles() {
        let cfg = StudyConfig::default();
        let f = MockupFunction::default();
        let truth = ground_truth(&f, &cfg).unwrap();
        let train = training_set(&f, &truth, &cfg);

        let noise = noise_profile(&train, &cfg);
        assert_eq!(40, noise.values.len());
        assert_abs_diff_eq!(noise.values[39], 1e-3, epsilon = 1e-15);
        assert!(noise.nll.iter().all(|v| v.is_finite()));

        let lengths = length_scale_profile(&train, 1e-3, &cfg);
        assert_eq!(100, lengths.nll.len());
        assert_abs_diff_eq!(lengths.values[0], 1.);
        assert_abs_diff_eq!(lengths.values[99], 4., epsilon = 1e-12);
    }

    #[test]
    fn test_profile_argmin_skips_nan() {
        let profile = NllProfile {
            values: array![1., 2., 3.],
            nll: array![f64::NAN, 0.5, 0.7],
        };
        assert_eq!(Some((2., 0.5)), profile.argmin());
    }
}
