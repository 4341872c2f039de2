//! A module for metrics to evaluate GP surrogate performances: prediction errors
//! against reference values, coverage of confidence intervals and
//! cross-validated Q2 predictive coefficient.

use linfa::dataset::Dataset;
use linfa::{
    Float, ParamGuard,
    traits::{Fit, Predict, PredictInplace},
};
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Zip};

use crate::{GpError, GpSurrogate, GpSurrogateParams, kernels::Kernel};

/// Root mean square error between reference values `y` and predictions `pred`
///
/// *Panics* if y and pred lengths differ
pub fn rmse<F: Float>(
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    pred: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> F {
    assert_eq!(y.len(), pred.len(), "Compared arrays should have same length");
    (y - pred)
        .mapv(|v| v * v)
        .mean()
        .map_or(F::zero(), |mse| mse.sqrt())
}

/// Largest absolute error between reference values `y` and predictions `pred`
///
/// *Panics* if y and pred lengths differ
pub fn max_abs_error<F: Float>(
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    pred: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> F {
    assert_eq!(y.len(), pred.len(), "Compared arrays should have same length");
    Zip::from(y).and(pred).fold(F::zero(), |acc, &a, &b| {
        let err = num_traits::Float::abs(a - b);
        if err > acc { err } else { acc }
    })
}

/// Fraction of reference values `y` lying within `mean +/- z * std`
/// (z = 1.96 for a 95% interval)
pub fn coverage<F: Float>(
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    mean: &ArrayBase<impl Data<Elem = F>, Ix1>,
    std: &ArrayBase<impl Data<Elem = F>, Ix1>,
    z: F,
) -> F {
    assert_eq!(y.len(), mean.len(), "Compared arrays should have same length");
    assert_eq!(y.len(), std.len(), "Compared arrays should have same length");
    if y.is_empty() {
        return F::zero();
    }
    let inside = Zip::from(y)
        .and(mean)
        .and(std)
        .fold(0usize, |count, &v, &m, &s| {
            if num_traits::Float::abs(v - m) <= z * s {
                count + 1
            } else {
                count
            }
        });
    F::cast(inside) / F::cast(y.len())
}

/// A trait for Q2 predictive coefficient cross validation score
pub trait PredictScore<F, ER, P, O>
where
    F: Float,
    ER: std::error::Error + From<linfa::error::Error>,
    P: Fit<Array2<F>, Array1<F>, ER, Object = O> + ParamGuard,
    O: PredictInplace<Array2<F>, Array1<F>>,
{
    /// Return the training data (xt, yt)
    fn training_data(&self) -> &(Array2<F>, Array1<F>);

    /// Return the model parameters
    fn params(&self) -> P;

    /// Compute quality metric Q2 with kfold cross validation,
    /// sub models are fitted with the same parameters as the model.
    fn q2_score(&self, kfold: usize) -> Result<F, ER> {
        let (xt, yt) = self.training_data();
        if kfold < 2 || kfold > xt.nrows() {
            return Err(linfa::error::Error::Parameters(format!(
                "kfold should be in [2, {}], got {kfold}",
                xt.nrows()
            ))
            .into());
        }
        let dataset = Dataset::new(xt.to_owned(), yt.to_owned());
        let yt_mean = yt.mean().unwrap_or_else(F::zero);
        // Predictive Residual Sum of Squares
        let mut press = F::zero();
        // Total Sum of Squares
        let mut tss = F::zero();
        for (train, valid) in dataset.fold(kfold).into_iter() {
            let model: O = self.params().fit(&train)?;
            let pred = model.predict(valid.records());
            press += (valid.targets() - pred).mapv(|v| v * v).sum();
            tss += (valid.targets() - yt_mean).mapv(|v| v * v).sum();
        }
        Ok(F::one() - press / tss)
    }

    /// Q2 predictive coefficient with Leave-One-Out Cross-Validation
    fn looq2_score(&self) -> Result<F, ER> {
        self.q2_score(self.training_data().0.nrows())
    }
}

impl<F, K> PredictScore<F, GpError, GpSurrogateParams<F, K>, Self> for GpSurrogate<F, K>
where
    F: Float,
    K: Kernel<F>,
{
    fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    fn params(&self) -> GpSurrogateParams<F, K> {
        GpSurrogateParams::from(self.params.clone())
    }
}
