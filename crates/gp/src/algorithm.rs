use crate::errors::{GpError, Result};
use crate::hyperparameters::Hyperparameters;
use crate::kernels::{Kernel, SquaredExponentialKernel};
use crate::likelihood::{check_training_data, covariance_matrix, factorize};
use crate::optimization::{CobylaParams, into_f64, optimize_params, prepare_multistart};
use crate::parameters::{GpSurrogateParams, GpSurrogateValidParams, HyperTuning};
use crate::utils::{input_span, value_range};

use linfa::prelude::{DatasetBase, Fit, Float, PredictInplace};
use linfa_linalg::triangular::*;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, array};

use log::{debug, info};
use rayon::prelude::*;
use std::fmt;
use std::time::Instant;

/// Default number of multistart for hyperparameters optimization
pub const GP_OPTIM_N_START: usize = 10;
/// Minimum of function evaluations for COBYLA optimizer
pub const GP_COBYLA_MIN_EVAL: usize = 25;
/// Maximum of function evaluations for COBYLA optimizer
pub const GP_COBYLA_MAX_EVAL: usize = 1000;

/// A zero-mean Gaussian process surrogate of a scalar function observed
/// with gaussian measurement noise.
///
/// Observations are modeled as `y = Z(x) + e` where:
/// * `Z(x)` is a zero-mean gaussian process with covariance `s2 * kernel(x - x', l)`,
///   `s2` being the signal variance and `l` the length scales,
/// * `e ~ Normal(0, sigma^2)` the measurement noise.
///
/// Hyperparameters `l`, `s2` and `sigma` not given by the user are estimated by
/// minimizing the negative log likelihood of the training data, see [crate::nll].
///
/// # Example
///
/// ```no_run
/// use gpsur_gp::{GpSurrogate, SquaredExponentialKernel};
/// use linfa::prelude::*;
/// use ndarray::{Array, Array1, Array2, Axis, arr2};
///
/// fn xsinx(x: &Array2<f64>) -> Array1<f64> {
///     ((x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())).remove_axis(Axis(1))
/// }
///
/// let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
/// let yt = xsinx(&xt);
///
/// let sur = GpSurrogate::<f64, SquaredExponentialKernel>::params(SquaredExponentialKernel())
///     .sigma(1e-3)
///     .fit(&Dataset::new(xt, yt))
///     .expect("GP surrogate trained");
///
/// let xtest = Array::linspace(0f64, 25., 26).insert_axis(Axis(1));
/// let (mean, var) = sur.predict_valvar(&xtest).expect("GP prediction");
/// ```
#[derive(Clone, Debug)]
pub struct GpSurrogate<F: Float, K: Kernel<F>> {
    /// Kernel hyperparameters (given or estimated)
    hyperparameters: Hyperparameters<F>,
    /// Measurement noise standard deviation (given or estimated)
    sigma: F,
    /// Negative log likelihood at the retained hyperparameters
    nll: F,
    /// Cholesky factor of `K(xt, xt) + sigma^2 I`
    chol: Array2<F>,
    /// Weights `(K(xt, xt) + sigma^2 I)^-1 . yt`
    alpha: Array1<F>,
    /// Training dataset (input, output)
    pub(crate) training_data: (Array2<F>, Array1<F>),
    /// Parameters used to fit this model
    pub(crate) params: GpSurrogateValidParams<F, K>,
}

/// GP surrogate parameters with the squared exponential kernel
pub type SqExpSurrogate<F> = GpSurrogateParams<F, SquaredExponentialKernel>;

impl<F: Float> SqExpSurrogate<F> {
    /// Squared exponential GP surrogate parameters constructor
    pub fn params() -> GpSurrogateParams<F, SquaredExponentialKernel> {
        GpSurrogateParams::new(SquaredExponentialKernel())
    }
}

impl<F: Float, K: Kernel<F>> fmt::Display for GpSurrogate<F, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GpSurrogate(kernel={}, length_scales={}, signal_variance={}, sigma={}, nll={})",
            self.params.kernel,
            self.hyperparameters.length_scales,
            self.hyperparameters.signal_variance,
            self.sigma,
            self.nll,
        )
    }
}

impl<F: Float, K: Kernel<F>> GpSurrogate<F, K> {
    /// GP surrogate parameters constructor
    pub fn params<NewK: Kernel<F>>(kernel: NewK) -> GpSurrogateParams<F, NewK> {
        GpSurrogateParams::new(kernel)
    }

    /// Predict posterior mean at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n scalar output values as a vector (n,).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_input(x)?;
        Ok(self.cross_covariance(x).dot(&self.alpha))
    }

    /// Predict variance of the latent function (noise excluded) at n given `x` points
    /// of nx components specified as a (n, nx) matrix.
    /// Returns n variance values as (n,) column vector.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_input(x)?;
        let kstar = self.cross_covariance(x);
        self.latent_variance(&kstar)
    }

    /// Predict both mean and latent variance at n given `x` points of nx components
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array1<F>)> {
        self.check_input(x)?;
        let kstar = self.cross_covariance(x);
        let mean = kstar.dot(&self.alpha);
        let var = self.latent_variance(&kstar)?;
        Ok((mean, var))
    }

    /// Predict variance of a new noisy observation at n given `x` points,
    /// that is latent variance plus `sigma^2`.
    pub fn predict_noisy_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        let noise = self.sigma * self.sigma;
        Ok(self.predict_var(x)? + noise)
    }

    /// Predict latent standard deviation at n given `x` points
    pub fn predict_std(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        Ok(self.predict_var(x)?.mapv(|v| v.sqrt()))
    }

    /// Kernel hyperparameters
    pub fn hyperparameters(&self) -> &Hyperparameters<F> {
        &self.hyperparameters
    }

    /// Measurement noise standard deviation
    pub fn sigma(&self) -> F {
        self.sigma
    }

    /// Negative log likelihood of the training data at the retained hyperparameters
    pub fn nll(&self) -> F {
        self.nll
    }

    /// Training data (xt, yt)
    pub fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    /// Retrieve input and output dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.training_data.0.ncols(), 1)
    }

    fn check_input(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
        let nx = self.training_data.0.ncols();
        if x.ncols() != nx {
            return Err(GpError::InvalidValueError(format!(
                "prediction points should have {nx} components, got {}",
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Covariance (n, nt) between given points and training inputs
    fn cross_covariance(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        covariance_matrix(
            &self.params.kernel,
            &self.hyperparameters,
            x,
            &self.training_data.0,
        )
    }

    /// `s2 - ||L^-1 k*||^2` for each row of kstar, clamped at 0
    fn latent_variance(&self, kstar: &Array2<F>) -> Result<Array1<F>> {
        let v = self.chol.solve_triangular(&kstar.t(), UPLO::Lower)?;
        let s2 = self.hyperparameters.signal_variance;
        let var = v.mapv(|a| a * a).sum_axis(Axis(0)).mapv(|q| {
            // round-off may give tiny negative values near training points
            if q < s2 { s2 - q } else { F::zero() }
        });
        Ok(var)
    }
}

impl<F, D, K> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for GpSurrogate<F, K>
where
    F: Float,
    D: Data<Elem = F>,
    K: Kernel<F>,
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let values = self.predict(x).expect("GP Prediction");
        *y = values;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros((x.nrows(),))
    }
}

/// Values of a hyperparameter group, bounds are given when the group is estimated
#[derive(Debug)]
struct Group<F: Float> {
    values: Array1<F>,
    bounds: Option<Vec<(F, F)>>,
}

impl<F: Float> Group<F> {
    fn from_tuning(tuning: &HyperTuning<F>, auto: (F, (F, F))) -> Self {
        match tuning {
            HyperTuning::Fixed(values) => Group {
                values: values.to_owned(),
                bounds: None,
            },
            HyperTuning::Full { init, bounds } => {
                let bounds = if bounds.len() == 1 {
                    vec![bounds[0]; init.len()]
                } else {
                    bounds.to_vec()
                };
                Group {
                    values: init.to_owned(),
                    bounds: Some(bounds),
                }
            }
            HyperTuning::Auto => Group {
                values: array![auto.0],
                bounds: Some(vec![auto.1]),
            },
        }
    }
}

/// Hyperparameters search space, estimated values are laid out as
/// `[length scales, signal variance, noise]` skipping fixed groups.
#[derive(Debug)]
struct SearchSpace<F: Float> {
    length_scales: Group<F>,
    signal_variance: Group<F>,
    noise: Group<F>,
}

impl<F: Float> SearchSpace<F> {
    fn new<K: Kernel<F>>(
        params: &GpSurrogateValidParams<F, K>,
        x: &Array2<F>,
        y: &Array1<F>,
    ) -> Result<Self> {
        let or_one = |v: F| if v > F::zero() { v } else { F::one() };
        let span = or_one(input_span(x));
        let range = or_one(value_range(y));
        let y2 = or_one(y.mapv(|v| v * v).mean().unwrap_or_else(F::one));

        let length_scales = Group::from_tuning(
            &params.length_scales,
            (
                span * F::cast(0.5),
                (span * F::cast(1e-2), span * F::cast(1e2)),
            ),
        );
        let nl = length_scales.values.len();
        if nl != 1 && nl != x.ncols() {
            return Err(GpError::InvalidValueError(format!(
                "length scales count should be 1 or input dimension {}, got {nl}",
                x.ncols()
            )));
        }
        let signal_variance = Group::from_tuning(
            &params.signal_variance,
            (y2, (y2 * F::cast(1e-4), y2 * F::cast(1e4))),
        );
        let noise = Group::from_tuning(
            &params.noise,
            (range * F::cast(1e-2), (range * F::cast(1e-6), range)),
        );
        Ok(SearchSpace {
            length_scales,
            signal_variance,
            noise,
        })
    }

    fn groups(&self) -> [&Group<F>; 3] {
        [&self.length_scales, &self.signal_variance, &self.noise]
    }

    /// Initial guess and bounds of estimated components
    fn init_and_bounds(&self) -> (Array1<F>, Vec<(F, F)>) {
        let mut init = vec![];
        let mut bounds = vec![];
        for group in self.groups() {
            if let Some(b) = &group.bounds {
                init.extend(group.values.iter());
                bounds.extend(b.iter());
            }
        }
        (Array1::from_vec(init), bounds)
    }

    /// Hyperparameters and noise given log10 values of estimated components
    fn decode(&self, log_params: &[f64]) -> (Hyperparameters<F>, F) {
        let mut estimated = log_params.iter().map(|&v| F::cast(10f64.powf(v)));
        let [ls, s2, noise] = self.groups().map(|group| match group.bounds {
            Some(_) => group.values.mapv(|v| estimated.next().unwrap_or(v)),
            None => group.values.to_owned(),
        });
        (Hyperparameters::new(ls, s2[0]), noise[0])
    }
}

impl<F: Float, K: Kernel<F>, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, GpError>
    for GpSurrogateValidParams<F, K>
{
    type Object = GpSurrogate<F, K>;

    /// Fit GP hyperparameters using maximum likelihood
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();
        check_training_data(x, y)?;
        let (xt, yt) = (x.to_owned(), y.to_owned());

        let space = SearchSpace::new(self, &xt, &yt)?;
        let (init, bounds) = space.init_and_bounds();

        let (hyperparameters, sigma) = if init.is_empty() {
            // Easy path no optimization
            space.decode(&[])
        } else {
            let kernel = &self.kernel;
            let objfn = |log_params: &[f64]| -> f64 {
                // optimizer may return nan values
                if log_params.iter().any(|v| v.is_nan()) {
                    return f64::INFINITY;
                }
                let (hyp, sigma) = space.decode(log_params);
                match factorize(kernel, &hyp, &xt, &yt, sigma) {
                    Ok(fz) => into_f64(fz.nll),
                    Err(_) => f64::INFINITY,
                }
            };

            let (starts, bounds) = prepare_multistart(self.n_start, &init, &bounds, self.seed);
            debug!("Optimize with multistart log10 params = {starts:?} and bounds = {bounds:?}");
            let now = Instant::now();
            let (best_nll, best) = (0..starts.nrows())
                .into_par_iter()
                .map(|i| {
                    optimize_params(
                        objfn,
                        &starts.row(i).to_owned(),
                        &bounds,
                        CobylaParams {
                            maxeval: (10 * starts.ncols()).clamp(GP_COBYLA_MIN_EVAL, self.max_eval),
                            ..CobylaParams::default()
                        },
                    )
                })
                .reduce(
                    || (f64::INFINITY, starts.row(0).to_owned()),
                    |a, b| if b.0 < a.0 { b } else { a },
                );
            debug!(
                "elapsed optim = {:?}ms, best nll = {best_nll}",
                now.elapsed().as_millis()
            );
            let best = best
                .iter()
                .zip(&bounds)
                .map(|(&v, &(lo, up))| v.clamp(lo, up))
                .collect::<Vec<_>>();
            space.decode(&best)
        };

        let fz = factorize(&self.kernel, &hyperparameters, &xt, &yt, sigma)?;
        info!(
            "GP surrogate fitted with {} kernel: {hyperparameters}, sigma={sigma}, nll={}",
            self.kernel, fz.nll
        );
        Ok(GpSurrogate {
            hyperparameters,
            sigma,
            nll: fz.nll,
            chol: fz.chol,
            alpha: fz.alpha,
            training_data: (xt, yt),
            params: self.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{Matern32Kernel, Matern52Kernel};
    use crate::likelihood::nll;
    use approx::assert_abs_diff_eq;
    use gpsur_doe::{Lhs, SamplingMethod};
    use linfa::prelude::{Dataset, Predict};
    use ndarray::{Array, Zip, arr2};
    use ndarray_rand::rand::SeedableRng;
    use paste::paste;
    use rand_xoshiro::Xoshiro256Plus;

    fn xsinx(x: &Array2<f64>) -> Array1<f64> {
        ((x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())).remove_axis(Axis(1))
    }

    fn branin_like(x: &Array2<f64>) -> Array1<f64> {
        let mut y = Array1::zeros(x.nrows());
        Zip::from(&mut y).and(x.rows()).for_each(|y, x| {
            *y = (x[0] * 2.).sin() + 0.5 * (x[1] - 0.3).powi(2);
        });
        y
    }

    #[test]
    fn test_interpolation_with_tiny_noise() {
        let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
        let yt = xsinx(&xt);
        let sur = SqExpSurrogate::params()
            .signal_variance(HyperTuning::Auto)
            .sigma(1e-4)
            .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
            .expect("GP fit error");

        assert_abs_diff_eq!(sur.predict(&xt).unwrap(), yt, epsilon = 1e-2);
        // latent variance vanishes at training points
        let var = sur.predict_var(&xt).unwrap();
        assert_abs_diff_eq!(var, Array1::zeros(xt.nrows()), epsilon = 1e-4);
        assert_abs_diff_eq!(sur.sigma(), 1e-4);
        assert_eq!((1, 1), sur.dims());
    }

    #[test]
    fn test_variance_far_away_is_signal_variance() {
        let xt = arr2(&[[0.0], [0.5], [1.0]]);
        let yt = array![0.1, 0.3, -0.2];
        let sur = SqExpSurrogate::params()
            .hyperparameters(&Hyperparameters::isotropic(0.3, 2.))
            .sigma(1e-3)
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        let (mean, var) = sur.predict_valvar(&array![[100.]]).unwrap();
        assert_abs_diff_eq!(mean[0], 0., epsilon = 1e-10);
        assert_abs_diff_eq!(var[0], 2., epsilon = 1e-10);
        let noisy = sur.predict_noisy_var(&array![[100.]]).unwrap();
        assert_abs_diff_eq!(noisy[0], 2. + 1e-6, epsilon = 1e-10);
    }

    #[test]
    fn test_fixed_hyperparameters_no_optimization() {
        let xt = Array::linspace(0f64, 1., 6).insert_axis(Axis(1));
        let yt = xt.column(0).mapv(|v| v * v);
        let hyp = Hyperparameters::isotropic(0.5, 1.);
        let sur = SqExpSurrogate::params()
            .hyperparameters(&hyp)
            .sigma(0.01)
            .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
            .expect("GP fit error");
        assert_eq!(&hyp, sur.hyperparameters());
        let expected = nll(&SquaredExponentialKernel(), &hyp, &xt, &yt, 0.01).unwrap();
        assert_abs_diff_eq!(sur.nll(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sigma_within_bounds_and_nll_improved() {
        let rng = Xoshiro256Plus::seed_from_u64(0);
        let xt = Lhs::new(&array![[0., 2.], [0., 1.]])
            .with_rng(rng)
            .sample(20);
        let yt = branin_like(&xt);
        let sur = SqExpSurrogate::params()
            .noise(HyperTuning::full(1e-2, (1e-5, 1e-1)))
            .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
            .expect("GP fit error");

        assert!(sur.sigma() >= 1e-5 && sur.sigma() <= 1e-1);
        let span = input_span(&xt);
        let l = sur.hyperparameters().length_scales[0];
        assert!(l >= 1e-2 * span && l <= 1e2 * span);

        let init = Hyperparameters::isotropic(0.5 * span, 1.);
        let nll_init = nll(&SquaredExponentialKernel(), &init, &xt, &yt, 1e-2).unwrap();
        assert!(sur.nll() <= nll_init + 1e-8);
    }

    #[test]
    fn test_anisotropic_fit() {
        let rng = Xoshiro256Plus::seed_from_u64(42);
        let xt = Lhs::new(&array![[0., 2.], [0., 1.]])
            .with_rng(rng)
            .sample(15);
        let yt = branin_like(&xt);
        let sur = SqExpSurrogate::params()
            .length_scales(HyperTuning::Full {
                init: array![0.5, 0.5],
                bounds: array![(1e-2, 1e2)],
            })
            .sigma(1e-4)
            .n_start(3)
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        assert_eq!(2, sur.hyperparameters().length_scales.len());
    }

    #[test]
    fn test_reproducible_fit() {
        let xt = Array::linspace(0f64, 1., 8).insert_axis(Axis(1));
        let yt = xt.column(0).mapv(|v| (6. * v).sin());
        let fit = || {
            SqExpSurrogate::params()
                .seed(7)
                .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
                .expect("GP fit error")
        };
        let (a, b) = (fit(), fit());
        assert_abs_diff_eq!(a.nll(), b.nll(), epsilon = 1e-12);
        assert_abs_diff_eq!(a.sigma(), b.sigma(), epsilon = 1e-12);
    }

    #[test]
    fn test_predict_inplace() {
        let xt = arr2(&[[0.0], [1.0], [2.0]]);
        let yt = array![0., 1., 0.];
        let sur = SqExpSurrogate::params()
            .hyperparameters(&Hyperparameters::isotropic(1., 1.))
            .sigma(1e-3)
            .fit(&Dataset::new(xt.to_owned(), yt))
            .expect("GP fit error");
        let xtest = array![[0.5], [1.5]];
        assert_abs_diff_eq!(sur.predict(&xtest).unwrap(), Predict::predict(&sur, &xtest));
    }

    #[test]
    fn test_bad_inputs() {
        let xt = arr2(&[[0.0, 1.0], [1.0, 2.0]]);
        let params = SqExpSurrogate::params().sigma(1e-3);
        assert!(matches!(
            params.fit(&Dataset::new(xt.to_owned(), array![1., 2., 3.])),
            Err(GpError::InvalidValueError(_))
        ));
        let three = SqExpSurrogate::params().length_scales(HyperTuning::Fixed(array![1., 1., 1.]));
        assert!(matches!(
            three.fit(&Dataset::new(xt.to_owned(), array![1., 2.])),
            Err(GpError::InvalidValueError(_))
        ));
        let sur = params
            .fit(&Dataset::new(xt, array![1., 2.]))
            .expect("GP fit error");
        assert!(sur.predict(&array![[0.5]]).is_err());
        assert!(sur.predict_var(&array![[0.5, 1., 2.]]).is_err());
    }

    macro_rules! test_fit_kernel {
        ($kernel:ident) => {
            paste! {
                #[test]
                fn [<test_fit_ $kernel:snake>]() {
                    let xt = Array::linspace(0f64, 4., 9).insert_axis(Axis(1));
                    let yt = xt.column(0).mapv(|v| v.sin());
                    let sur = GpSurrogate::<f64, [<$kernel Kernel>]>::params([<$kernel Kernel>]())
                        .signal_variance(HyperTuning::Auto)
                        .sigma(1e-4)
                        .fit(&Dataset::new(xt, yt))
                        .expect("GP fit error");
                    let xtest = array![[1.25], [2.75]];
                    let expected = xtest.column(0).mapv(|v: f64| v.sin());
                    assert_abs_diff_eq!(sur.predict(&xtest).unwrap(), expected, epsilon = 1e-1);
                    assert!(format!("{sur}").contains(stringify!($kernel)));
                }
            }
        };
    }

    test_fit_kernel!(SquaredExponential);
    test_fit_kernel!(Matern32);
    test_fit_kernel!(Matern52);
}
