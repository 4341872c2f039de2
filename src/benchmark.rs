//! Synthetic benchmark of the mockup study: a shifted and scaled Rosenbrock surface.

use ndarray::{Array1, ArrayBase, Data, Ix2};

/// Rosenbrock function of two variables `(a - x)^2 + b (y - x^2)^2`
pub fn rosenbrock(x: f64, y: f64, a: f64, b: f64) -> f64 {
    (a - x).powi(2) + b * (y - x * x).powi(2)
}

/// Two inputs model `f(u, v)` parameterized by `r`:
///
/// `f(u, v) = rosenbrock((r - 0.5) + u - 5, 1 + 3 (v - 0.6), a = 1, b = 3) / 20`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MockupFunction {
    /// Shift parameter of the first input
    pub r: f64,
}

impl Default for MockupFunction {
    fn default() -> Self {
        MockupFunction { r: 0.25 }
    }
}

impl MockupFunction {
    /// Constructor
    pub fn new(r: f64) -> Self {
        MockupFunction { r }
    }

    /// Value at `(u, v)`
    pub fn eval(&self, u: f64, v: f64) -> f64 {
        rosenbrock((self.r - 0.5) + u - 5., 1. + 3. * (v - 0.6), 1., 3.) / 20.
    }

    /// Values at each row `[u, v]` of x (n, 2)
    ///
    /// *Panics* if x has not 2 columns
    pub fn eval_rows(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Array1<f64> {
        assert_eq!(x.ncols(), 2, "mockup function inputs are (u, v) pairs");
        x.rows().into_iter().map(|row| self.eval(row[0], row[1])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_rosenbrock_minimum() {
        assert_eq!(0., rosenbrock(1., 1., 1., 100.));
        assert_eq!(0., rosenbrock(2., 4., 2., 3.));
        assert_abs_diff_eq!(rosenbrock(0., 0., 1., 3.), 1.);
    }

    #[test]
    fn test_mockup_closed_form() {
        let f = MockupFunction::default();
        // u = 5.25 and v = 0.6 give x = 0 and y = 1
        assert_abs_diff_eq!(f.eval(5.25, 0.6), (1. + 3.) / 20., epsilon = 1e-12);
        // u = 6.25 and v = 0.6 give x = 1 and y = 1, the minimum
        assert_abs_diff_eq!(f.eval(6.25, 0.6), 0., epsilon = 1e-12);
        let x = 4.7 - 5.25;
        let y = 1. + 3. * (0.55 - 0.6);
        let expected = ((1. - x) * (1. - x) + 3. * (y - x * x) * (y - x * x)) / 20.;
        assert_abs_diff_eq!(f.eval(4.7, 0.55), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_eval_rows() {
        let f = MockupFunction::new(0.5);
        let x = array![[5., 0.6], [4.7, 0.55]];
        let y = f.eval_rows(&x);
        assert_eq!(2, y.len());
        assert_abs_diff_eq!(y[0], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], f.eval(4.7, 0.55), epsilon = 1e-12);
    }
}
