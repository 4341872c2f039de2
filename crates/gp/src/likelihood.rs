//! Covariance assembly and negative log likelihood of a zero-mean GP with
//! gaussian measurement noise.

use crate::errors::{GpError, Result};
use crate::hyperparameters::Hyperparameters;
use crate::kernels::{Kernel, SquaredExponentialKernel};
use crate::utils::pairwise_differences;

use linfa::Float;
use linfa_linalg::{cholesky::*, triangular::*};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};

/// Covariance matrix `s2 * kernel(xa_i - xb_j, l)` of shape (na, nb)
/// between points `xa` (na, nx) and `xb` (nb, nx).
///
/// *Panics* if xa and xb have not the same column numbers
pub fn covariance_matrix<F: Float, K: Kernel<F>>(
    kernel: &K,
    hyp: &Hyperparameters<F>,
    xa: &ArrayBase<impl Data<Elem = F>, Ix2>,
    xb: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array2<F> {
    let d = pairwise_differences(xa, xb);
    let k = kernel.value(&d, &hyp.length_scales) * hyp.signal_variance;
    k.into_shape((xa.nrows(), xb.nrows())).unwrap()
}

/// Cholesky factor and weights of `Ky = K(x, x) + sigma^2 I` for given training data
#[derive(Clone, Debug)]
pub(crate) struct Factorization<F: Float> {
    /// Lower triangular L with L.L^T = Ky
    pub chol: Array2<F>,
    /// Ky^-1 . y
    pub alpha: Array1<F>,
    /// Negative log likelihood without the n/2.ln(2.pi) constant
    pub nll: F,
}

pub(crate) fn check_training_data<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<()> {
    if x.nrows() == 0 {
        return Err(GpError::InvalidValueError(
            "training set should not be empty".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(GpError::InvalidValueError(format!(
            "training inputs ({} rows) and outputs ({} values) sizes differ",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}

pub(crate) fn factorize<F: Float, K: Kernel<F>>(
    kernel: &K,
    hyp: &Hyperparameters<F>,
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    sigma: F,
) -> Result<Factorization<F>> {
    let noise = sigma * sigma;
    let mut ky = covariance_matrix(kernel, hyp, x, x);
    ky.diag_mut().mapv_inplace(|v| v + noise);

    let chol = ky.cholesky().map_err(|e| {
        GpError::LikelihoodComputationError(format!(
            "covariance matrix not positive definite with {hyp} and sigma={sigma} ({e})"
        ))
    })?;
    let solve_err = |e: linfa_linalg::LinalgError| {
        GpError::LikelihoodComputationError(format!("cannot solve Ky.alpha = y ({e})"))
    };
    let z = chol
        .solve_triangular(&y.to_owned().insert_axis(Axis(1)), UPLO::Lower)
        .map_err(solve_err)?;
    let alpha = chol
        .t()
        .solve_triangular_into(z, UPLO::Upper)
        .map_err(solve_err)?
        .remove_axis(Axis(1));

    // ln(det Ky) / 2 is the sum of the log of the diagonal of its cholesky factor
    let half_logdet = chol.diag().mapv(|v| v.ln()).sum();
    let nll = F::cast(0.5) * y.dot(&alpha) + half_logdet;
    if !nll.is_finite() {
        return Err(GpError::LikelihoodComputationError(format!(
            "non finite likelihood with {hyp} and sigma={sigma}"
        )));
    }
    Ok(Factorization { chol, alpha, nll })
}

/// Negative log likelihood `-ln p(y | x) + C` of training data (x, y) under a zero-mean GP
/// with covariance `s2 * kernel(x - x', l)` and measurement noise standard deviation `sigma`.
///
/// `nll = 0.5 * y^T . Ky^-1 . y + 0.5 * ln(det Ky)` with `Ky = K(x, x) + sigma^2 I`,
/// the constant `n/2 * ln(2 pi)` is omitted.
pub fn nll<F: Float, K: Kernel<F>>(
    kernel: &K,
    hyp: &Hyperparameters<F>,
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    sigma: F,
) -> Result<F> {
    check_training_data(x, y)?;
    hyp.check(x.ncols())?;
    Ok(factorize(kernel, hyp, x, y, sigma)?.nll)
}

/// Negative log likelihood with the squared exponential kernel given hyperparameters
/// as a flat `[l_1, ..., l_k, s2]` vector (see [Hyperparameters::from_vec]).
///
/// ```
/// use gpsur_gp::gp_nll;
/// use ndarray::array;
///
/// let x = array![[0.0], [1.0], [2.0]];
/// let y = array![0.1, 0.4, 0.2];
/// let value = gp_nll(&[1.0f64, 1.0], &x, &y, 1e-2).expect("likelihood");
/// assert!(value.is_finite());
/// ```
pub fn gp_nll<F: Float>(
    hyp: &[F],
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    sigma: F,
) -> Result<F> {
    let hyp = Hyperparameters::from_vec(hyp)?;
    nll(&SquaredExponentialKernel(), &hyp, x, y, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};

    #[test]
    fn test_covariance_matrix() {
        let xa = array![[0.], [1.]];
        let xb = array![[0.], [2.], [3.]];
        let hyp = Hyperparameters::isotropic(1., 2.);
        let k = covariance_matrix(&SquaredExponentialKernel(), &hyp, &xa, &xb);
        assert_eq!((2, 3), k.dim());
        assert_abs_diff_eq!(k[[0, 0]], 2., epsilon = 1e-12);
        assert_abs_diff_eq!(k[[1, 1]], 2. * (-0.5f64).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(k[[0, 2]], 2. * (-4.5f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_nll_two_points_closed_form() {
        // Ky = [[1 + s, c], [c, 1 + s]] with c = exp(-1/2)
        let x = array![[0.], [1.]];
        let y = array![1., -1.];
        let sigma = 0.5;
        let s = sigma * sigma;
        let c = (-0.5f64).exp();
        let det = (1. + s) * (1. + s) - c * c;
        // y^T Ky^-1 y with y = (1, -1): 2 (1 + s + c) / det
        let quad = 2. * (1. + s + c) / det;
        let expected = 0.5 * quad + 0.5 * det.ln();

        let value = gp_nll(&[1f64, 1.], &x, &y, sigma).unwrap();
        assert_abs_diff_eq!(value, expected, epsilon = 1e-10);
    }

    #[test]
    fn test_nll_single_point() {
        let x = array![[3.]];
        let y = array![2.];
        let value = gp_nll(&[1f64, 4.], &x, &y, 0.).unwrap();
        // 0.5 * y^2 / s2 + 0.5 * ln(s2)
        assert_abs_diff_eq!(value, 0.5 * 4. / 4. + 0.5 * 4f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_nll_profile_is_finite() {
        let x = Array::linspace(0f64, 1., 8).insert_axis(Axis(1));
        let y = x.column(0).mapv(|v| (3. * v).sin());
        let sigma = 1e-2;
        for &l in Array::linspace(0.1f64, 2., 20).iter() {
            assert!(gp_nll(&[l, 1.], &x, &y, sigma).unwrap().is_finite());
        }
    }

    #[test]
    fn test_nll_not_positive_definite() {
        // duplicated input without noise gives a singular covariance
        let x = array![[1.], [1.]];
        let y = array![1., 1.];
        let res = gp_nll(&[1f64, 1.], &x, &y, 0.);
        assert!(matches!(res, Err(GpError::LikelihoodComputationError(_))));
    }

    #[test]
    fn test_nll_invalid_inputs() {
        let x = array![[0.], [1.]];
        assert!(gp_nll(&[1f64, 1.], &x, &array![1.], 0.1).is_err());
        assert!(gp_nll(&[1f64, 1., 1.], &x, &array![1., 2.], 0.1).is_err());
        assert!(gp_nll(&[-1f64, 1.], &x, &array![1., 2.], 0.1).is_err());
    }
}
