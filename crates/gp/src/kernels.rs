//! Stationary kernels giving the correlation between GP values at x and x'.
//!
//! A kernel only depends on the difference `d = x - x'` scaled by length scales `l`,
//! either one isotropic value or one per input component. Kernels are normalized
//! (value 1 at d = 0), the prior amplitude is the signal variance applied by the caller.
//!
//! The following kernels are implemented:
//! * squared exponential,
//! * matern 3/2,
//! * matern 5/2.

use linfa::Float;
use ndarray::{Array1, ArrayBase, Axis, Data, Ix1, Ix2};
use std::fmt;

/// A trait for kernels used by the GP surrogate
pub trait Kernel<F: Float>: Clone + Copy + Default + fmt::Display + Send + Sync {
    /// Compute kernel values given differences `d` (n, nx) between pairs of points
    /// and `length_scales` of length 1 (isotropic) or nx.
    /// Returns n values.
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F>;
}

/// Squared distances `sum_j (d_j / l_j)^2` for each row of `d`
fn scaled_sq_distances<F: Float>(
    d: &ArrayBase<impl Data<Elem = F>, Ix2>,
    length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Array1<F> {
    if length_scales.len() == 1 {
        let l = length_scales[0];
        d.mapv(|v| (v / l) * (v / l)).sum_axis(Axis(1))
    } else {
        (d / length_scales).mapv(|v| v * v).sum_axis(Axis(1))
    }
}

/// Squared exponential kernel, the default one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SquaredExponentialKernel();

impl<F: Float> Kernel<F> for SquaredExponentialKernel {
    /// exp( - sum_j (d_j / l_j)^2 / 2 )
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        scaled_sq_distances(d, length_scales).mapv(|r2| F::exp(F::cast(-0.5) * r2))
    }
}

impl fmt::Display for SquaredExponentialKernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SquaredExponential")
    }
}

/// Matern 3/2 kernel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Matern32Kernel();

impl<F: Float> Kernel<F> for Matern32Kernel {
    /// (1 + sqrt(3) r) exp(-sqrt(3) r) with r = sqrt(sum_j (d_j / l_j)^2)
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        let sqrt3 = F::cast(3.).sqrt();
        scaled_sq_distances(d, length_scales).mapv(|r2| {
            let a = sqrt3 * r2.sqrt();
            (F::one() + a) * F::exp(-a)
        })
    }
}

impl fmt::Display for Matern32Kernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Matern32")
    }
}

/// Matern 5/2 kernel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Matern52Kernel();

impl<F: Float> Kernel<F> for Matern52Kernel {
    /// (1 + sqrt(5) r + 5 r^2 / 3) exp(-sqrt(5) r) with r = sqrt(sum_j (d_j / l_j)^2)
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        let sqrt5 = F::cast(5.).sqrt();
        scaled_sq_distances(d, length_scales).mapv(|r2| {
            let a = sqrt5 * r2.sqrt();
            (F::one() + a + F::cast(5. / 3.) * r2) * F::exp(-a)
        })
    }
}

impl fmt::Display for Matern52Kernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Matern52")
    }
}
