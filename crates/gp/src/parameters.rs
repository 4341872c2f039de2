use crate::errors::{GpError, Result};
use crate::hyperparameters::Hyperparameters;
use crate::kernels::Kernel;
use crate::{GP_COBYLA_MAX_EVAL, GP_COBYLA_MIN_EVAL, GP_OPTIM_N_START};
use linfa::{Float, ParamGuard};

use ndarray::{Array1, array};

/// Default seed of the multistart design used by hyperparameters optimization
pub const GP_OPTIM_SEED: u64 = 42;

/// How a group of hyperparameters (length scales, signal variance or noise) is set
#[derive(Clone, Debug, PartialEq, Default)]
pub enum HyperTuning<F: Float> {
    /// Constant value (i.e. given not estimated)
    Fixed(Array1<F>),
    /// Value optimized between given bounds (lower, upper) starting from the initial guess
    Full {
        /// Initial guess
        init: Array1<F>,
        /// Bounds, either one pair for all components or one pair per component
        bounds: Array1<(F, F)>,
    },
    /// Value optimized with initial guess and bounds derived from training data
    #[default]
    Auto,
}

impl<F: Float> HyperTuning<F> {
    /// Fixed scalar value
    pub fn fixed(value: F) -> Self {
        HyperTuning::Fixed(array![value])
    }

    /// Scalar value optimized within `bounds` from `init`
    pub fn full(init: F, bounds: (F, F)) -> Self {
        HyperTuning::Full {
            init: array![init],
            bounds: array![bounds],
        }
    }

    /// Whether the value is constant
    pub fn is_fixed(&self) -> bool {
        matches!(self, HyperTuning::Fixed(_))
    }

    fn check(&self, name: &str, max_len: Option<usize>, allow_zero: bool) -> Result<()> {
        let invalid = |msg: String| Err(GpError::InvalidValueError(format!("{name}: {msg}")));
        let valid_value = |v: F| v.is_finite() && (v > F::zero() || (allow_zero && v == F::zero()));
        match self {
            HyperTuning::Auto => Ok(()),
            HyperTuning::Fixed(values) | HyperTuning::Full { init: values, .. } => {
                if values.is_empty() {
                    return invalid("no value given".to_string());
                }
                if let Some(n) = max_len {
                    if values.len() > n {
                        return invalid(format!("expected at most {n} value, got {}", values.len()));
                    }
                }
                if let HyperTuning::Full { init, bounds } = self {
                    if bounds.len() != 1 && bounds.len() != init.len() {
                        return invalid(format!(
                            "bounds count should be 1 or {}, got {}",
                            init.len(),
                            bounds.len()
                        ));
                    }
                    // optimization runs in log10 space, bounds must be strictly positive
                    for &(lo, up) in bounds.iter() {
                        if !(lo > F::zero() && lo <= up && up.is_finite()) {
                            return invalid(format!("bad bounds ({lo}, {up})"));
                        }
                    }
                    if init.iter().any(|&v| !(v > F::zero() && v.is_finite())) {
                        return invalid(format!("initial guess should be positive, got {init}"));
                    }
                } else if values.iter().any(|&v| !valid_value(v)) {
                    return invalid(format!("bad fixed value {values}"));
                }
                Ok(())
            }
        }
    }
}

/// A set of validated GP surrogate parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GpSurrogateValidParams<F: Float, K: Kernel<F>> {
    /// Kernel giving the correlation between outputs at x and x'
    pub(crate) kernel: K,
    /// Length scales tuning
    pub(crate) length_scales: HyperTuning<F>,
    /// Signal variance tuning
    pub(crate) signal_variance: HyperTuning<F>,
    /// Measurement noise standard deviation tuning
    pub(crate) noise: HyperTuning<F>,
    /// Number of additional starting points of the likelihood optimization
    pub(crate) n_start: usize,
    /// Max number of likelihood evaluations during one optimization
    pub(crate) max_eval: usize,
    /// Seed of the multistart design
    pub(crate) seed: u64,
}

impl<F: Float, K: Kernel<F>> Default for GpSurrogateValidParams<F, K> {
    fn default() -> GpSurrogateValidParams<F, K> {
        GpSurrogateValidParams {
            kernel: K::default(),
            length_scales: HyperTuning::Auto,
            signal_variance: HyperTuning::fixed(F::one()),
            noise: HyperTuning::Auto,
            n_start: GP_OPTIM_N_START,
            max_eval: GP_COBYLA_MAX_EVAL,
            seed: GP_OPTIM_SEED,
        }
    }
}

impl<F: Float, K: Kernel<F>> GpSurrogateValidParams<F, K> {
    /// Get kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Get length scales tuning
    pub fn length_scales(&self) -> &HyperTuning<F> {
        &self.length_scales
    }

    /// Get signal variance tuning
    pub fn signal_variance(&self) -> &HyperTuning<F> {
        &self.signal_variance
    }

    /// Get noise standard deviation tuning
    pub fn noise(&self) -> &HyperTuning<F> {
        &self.noise
    }

    /// Get the number of additional optimization starting points
    pub fn n_start(&self) -> usize {
        self.n_start
    }

    /// Get the max number of likelihood evaluations during one optimization
    pub fn max_eval(&self) -> usize {
        self.max_eval
    }

    /// Get the multistart design seed
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[derive(Clone, Debug)]
/// The set of parameters that can be specified for the training of
/// a [GP surrogate](crate::GpSurrogate).
pub struct GpSurrogateParams<F: Float, K: Kernel<F>>(GpSurrogateValidParams<F, K>);

impl<F: Float, K: Kernel<F>> GpSurrogateParams<F, K> {
    /// A constructor for GP surrogate parameters given a kernel
    pub fn new(kernel: K) -> GpSurrogateParams<F, K> {
        Self(GpSurrogateValidParams {
            kernel,
            ..Default::default()
        })
    }

    /// Set kernel.
    pub fn kernel(mut self, kernel: K) -> Self {
        self.0.kernel = kernel;
        self
    }

    /// Set length scales tuning.
    ///
    /// Values count should be either 1 (isotropic) or the training input dimension.
    pub fn length_scales(mut self, tuning: HyperTuning<F>) -> Self {
        self.0.length_scales = tuning;
        self
    }

    /// Set signal variance tuning (scalar), fixed to 1 by default.
    pub fn signal_variance(mut self, tuning: HyperTuning<F>) -> Self {
        self.0.signal_variance = tuning;
        self
    }

    /// Set measurement noise standard deviation tuning (scalar).
    pub fn noise(mut self, tuning: HyperTuning<F>) -> Self {
        self.0.noise = tuning;
        self
    }

    /// Set a known measurement noise standard deviation, no longer estimated.
    pub fn sigma(mut self, sigma: F) -> Self {
        self.0.noise = HyperTuning::fixed(sigma);
        self
    }

    /// Fix kernel hyperparameters, only the noise may still be estimated.
    pub fn hyperparameters(mut self, hyp: &Hyperparameters<F>) -> Self {
        self.0.length_scales = HyperTuning::Fixed(hyp.length_scales.to_owned());
        self.0.signal_variance = HyperTuning::fixed(hyp.signal_variance);
        self
    }

    /// Set the number of additional starting points of the likelihood optimization
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.0.n_start = n_start;
        self
    }

    /// Set the max number of likelihood evaluations during one optimization.
    /// Given max_eval is raised to [crate::GP_COBYLA_MIN_EVAL] if lower.
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.0.max_eval = GP_COBYLA_MIN_EVAL.max(max_eval);
        self
    }

    /// Set the seed of the multistart design for reproducibility
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float, K: Kernel<F>> From<GpSurrogateValidParams<F, K>> for GpSurrogateParams<F, K> {
    fn from(valid: GpSurrogateValidParams<F, K>) -> Self {
        GpSurrogateParams(valid)
    }
}

impl<F: Float, K: Kernel<F>> ParamGuard for GpSurrogateParams<F, K> {
    type Checked = GpSurrogateValidParams<F, K>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        self.0.length_scales.check("length scales", None, false)?;
        self.0
            .signal_variance
            .check("signal variance", Some(1), false)?;
        self.0.noise.check("noise", Some(1), true)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
