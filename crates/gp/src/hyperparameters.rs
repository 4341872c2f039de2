use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array1, array};
use std::fmt;

/// Kernel hyperparameters of the GP covariance `k(x, x') = s2 * kernel(x - x', l)`
#[derive(Clone, Debug, PartialEq)]
pub struct Hyperparameters<F: Float> {
    /// Length scales `l`, one isotropic value or one per input component
    pub length_scales: Array1<F>,
    /// Signal variance `s2`, the prior variance of the process
    pub signal_variance: F,
}

impl<F: Float> Hyperparameters<F> {
    /// Constructor from length scales and signal variance
    pub fn new(length_scales: Array1<F>, signal_variance: F) -> Self {
        Hyperparameters {
            length_scales,
            signal_variance,
        }
    }

    /// Single length scale shared by all input components
    pub fn isotropic(length_scale: F, signal_variance: F) -> Self {
        Self::new(array![length_scale], signal_variance)
    }

    /// Constructor from a flat vector `[l_1, ..., l_k, s2]`:
    /// the last value is the signal variance, preceding ones are length scales.
    ///
    /// ```
    /// use gpsur_gp::Hyperparameters;
    ///
    /// let hyp = Hyperparameters::from_vec(&[2.08, 1.0]).unwrap();
    /// assert_eq!(hyp.length_scales[0], 2.08);
    /// assert_eq!(hyp.signal_variance, 1.0);
    /// ```
    pub fn from_vec(hyp: &[F]) -> Result<Self> {
        match hyp.split_last() {
            Some((&s2, ls)) if !ls.is_empty() => Ok(Self::new(Array1::from_vec(ls.to_vec()), s2)),
            _ => Err(GpError::InvalidValueError(format!(
                "hyperparameters vector should hold at least one length scale \
                    and the signal variance, got {} values",
                hyp.len()
            ))),
        }
    }

    /// Flat vector `[l_1, ..., l_k, s2]`, inverse of [Hyperparameters::from_vec]
    pub fn to_vec(&self) -> Vec<F> {
        let mut v = self.length_scales.to_vec();
        v.push(self.signal_variance);
        v
    }

    /// Checks values are strictly positive and finite, and that the length scales
    /// count is either 1 or `nx`, the input dimension.
    pub fn check(&self, nx: usize) -> Result<()> {
        let nl = self.length_scales.len();
        if nl != 1 && nl != nx {
            return Err(GpError::InvalidValueError(format!(
                "length scales count should be 1 or input dimension {nx}, got {nl}"
            )));
        }
        let positive = |v: F| v.is_finite() && v > F::zero();
        if !self.length_scales.iter().all(|&l| positive(l)) || !positive(self.signal_variance) {
            return Err(GpError::InvalidValueError(format!(
                "hyperparameters should be strictly positive and finite, got {self}"
            )));
        }
        Ok(())
    }
}

impl<F: Float> fmt::Display for Hyperparameters<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "(length_scales={}, signal_variance={})",
            self.length_scales, self.signal_variance
        )
    }
}
