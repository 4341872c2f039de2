use linfa::Float;
use ndarray::{Array2, ArrayBase, Data, Ix1, Ix2, Zip};

/// Computes differences between each row of x and each row of y
/// resulting in a 2d array of shape (nrows(x) * nrows(y), ncols(x)),
/// row `i * nrows(y) + j` holding `x_i - y_j`.
///
/// *Panics* if x and y have not the same column numbers
pub fn pairwise_differences<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array2<F> {
    assert!(x.ncols() == y.ncols());

    let ny = y.nrows();
    let mut result = Array2::zeros((x.nrows() * ny, x.ncols()));
    for (i, xi) in x.rows().into_iter().enumerate() {
        for (j, yj) in y.rows().into_iter().enumerate() {
            Zip::from(result.row_mut(i * ny + j))
                .and(&xi)
                .and(&yj)
                .for_each(|r, &a, &b| *r = a - b);
        }
    }
    result
}

/// Largest extent `max - min` over the columns of x, 0 when x is empty
pub(crate) fn input_span<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> F {
    x.columns()
        .into_iter()
        .map(|col| value_range(&col))
        .fold(F::zero(), |acc, s| acc.max(s))
}

/// Extent `max - min` of the values of y, 0 when y is empty
pub(crate) fn value_range<F: Float>(y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> F {
    if y.is_empty() {
        return F::zero();
    }
    let (lo, up) = y
        .iter()
        .fold((F::infinity(), F::neg_infinity()), |(lo, up), &v| {
            (lo.min(v), up.max(v))
        });
    up - lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_pairwise_differences() {
        let x = array![[-0.9486833], [-0.82219219]];
        let y = array![
            [-1.26491106],
            [-0.63245553],
            [0.],
            [0.63245553],
            [1.26491106]
        ];
        assert_abs_diff_eq!(
            &array![
                [0.31622777],
                [-0.31622777],
                [-0.9486833],
                [-1.58113883],
                [-2.21359436],
                [0.44271887],
                [-0.18973666],
                [-0.82219219],
                [-1.45464772],
                [-2.08710326]
            ],
            &pairwise_differences(&x, &y),
            epsilon = 1e-6
        )
    }

    #[test]
    fn test_spans() {
        let x = array![[4.7, 0.55], [5.3, 0.6], [5.0, 0.58]];
        assert_abs_diff_eq!(input_span(&x), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(value_range(&array![0.2, -0.1, 0.05]), 0.3, epsilon = 1e-12);
        assert_eq!(0., value_range(&ndarray::Array1::<f64>::zeros(0)));
    }
}
