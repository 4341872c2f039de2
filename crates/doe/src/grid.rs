use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array, Array1, Array2, ArrayBase, Data, Ix2, s};

/// A tensor-product design built from explicit levels along each input axis.
///
/// Points are enumerated with the **first axis varying fastest**, so for a 2D grid
/// with axes `u` and `v` the points are `[u0, v0], [u1, v0], ..., [u0, v1], ...`.
#[derive(Clone, Debug)]
pub struct Grid<F: Float> {
    /// Levels of each axis
    axes: Vec<Array1<F>>,
    /// Bounding box of the levels as a (nx, 2) matrix
    xlimits: Array2<F>,
}

impl<F: Float> Grid<F> {
    /// Constructor given the levels of each axis.
    ///
    /// **Panics** if no axis is given or if an axis has no level.
    ///
    /// ```
    /// use gpsur_doe::Grid;
    /// use ndarray::array;
    ///
    /// let grid = Grid::new(vec![array![0., 1., 2.], array![10., 20.]]);
    /// assert_eq!(grid.len(), 6);
    /// ```
    pub fn new(axes: Vec<Array1<F>>) -> Self {
        if axes.is_empty() {
            panic!("grid must have at least one axis");
        }
        let mut xlimits = Array2::zeros((axes.len(), 2));
        for (i, axis) in axes.iter().enumerate() {
            if axis.is_empty() {
                panic!("grid axis {i} has no level");
            }
            let (lo, up) = axis
                .iter()
                .fold((F::infinity(), F::neg_infinity()), |(lo, up), &v| {
                    (lo.min(v), up.max(v))
                });
            xlimits[[i, 0]] = lo;
            xlimits[[i, 1]] = up;
        }
        Grid { axes, xlimits }
    }

    /// Constructor of evenly spaced levels within `xlimits` (nx, 2) bounds,
    /// bounds included, with `levels[i]` levels along axis i.
    ///
    /// **Panics** if xlimits has not 2 columns or if `levels` length differs from nx.
    pub fn linspace(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, levels: &[usize]) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        if xlimits.nrows() != levels.len() {
            panic!(
                "expected {} level counts (one per xlimits row), got {}",
                xlimits.nrows(),
                levels.len()
            );
        }
        let axes = xlimits
            .rows()
            .into_iter()
            .zip(levels)
            .map(|(lim, &n)| Array::linspace(lim[0], lim[1], n))
            .collect();
        Self::new(axes)
    }

    /// Levels of each axis
    pub fn axes(&self) -> &[Array1<F>] {
        &self.axes
    }

    /// Number of axes, i.e. dimension of the points
    pub fn dim(&self) -> usize {
        self.axes.len()
    }

    /// Number of levels along each axis
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.len()).collect()
    }

    /// Total number of points
    pub fn len(&self) -> usize {
        self.axes.iter().map(|a| a.len()).product()
    }

    /// Whether the grid holds no point (never true for a constructed grid)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All grid points as a (len, nx) matrix, first axis varying fastest
    pub fn points(&self) -> Array2<F> {
        let n = self.len();
        let mut pts = Array2::zeros((n, self.dim()));
        for (k, mut row) in pts.rows_mut().into_iter().enumerate() {
            let mut rest = k;
            for (j, axis) in self.axes.iter().enumerate() {
                row[j] = axis[rest % axis.len()];
                rest /= axis.len();
            }
        }
        pts
    }

    /// Sub-grid keeping levels `0, step, 2*step, ...` of every axis.
    ///
    /// **Panics** if step is 0.
    pub fn every(&self, step: usize) -> Grid<F> {
        if step == 0 {
            panic!("grid step must be strictly positive");
        }
        let axes = self
            .axes
            .iter()
            .map(|a| a.slice(s![..;step]).to_owned())
            .collect();
        Grid::new(axes)
    }

    /// Coordinate matrices `(U, V)` of a 2D grid, both of shape (len(v), len(u))
    /// with `U[[i, j]] = u[j]` and `V[[i, j]] = v[i]`.
    ///
    /// Returns `None` when the grid is not 2-dimensional.
    pub fn meshgrid(&self) -> Option<(Array2<F>, Array2<F>)> {
        if self.dim() != 2 {
            return None;
        }
        let (u, v) = (&self.axes[0], &self.axes[1]);
        let uu = Array2::from_shape_fn((v.len(), u.len()), |(_, j)| u[j]);
        let vv = Array2::from_shape_fn((v.len(), u.len()), |(i, _)| v[i]);
        Some((uu, vv))
    }
}

impl<F: Float> SamplingMethod<F> for Grid<F> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    /// First `ns` grid points (all of them if `ns` exceeds the grid size)
    /// mapped to the unit hypercube. Degenerate axes are mapped to 0.
    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let pts = self.points();
        let ns = ns.min(pts.nrows());
        let lower = self.xlimits.column(0);
        let width = (&self.xlimits.column(1) - &lower)
            .mapv(|w| if w > F::zero() { w } else { F::one() });
        (&pts.slice(s![..ns, ..]) - &lower) / &width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr2, array};

    #[test]
    fn test_points_first_axis_fastest() {
        let grid = Grid::new(vec![array![1., 2., 3.], array![10., 20.]]);
        let expected = array![
            [1., 10.],
            [2., 10.],
            [3., 10.],
            [1., 20.],
            [2., 20.],
            [3., 20.]
        ];
        assert_eq!(expected, grid.points());
        assert_eq!(vec![3, 2], grid.shape());
        assert_eq!(6, grid.len());
    }

    #[test]
    fn test_linspace_bounds() {
        let xlimits = arr2(&[[4.7, 5.3], [0.55, 0.6]]);
        let grid = Grid::linspace(&xlimits, &[20, 20]);
        assert_eq!(400, grid.len());
        assert_abs_diff_eq!(grid.axes()[0][0], 4.7);
        assert_abs_diff_eq!(grid.axes()[0][19], 5.3, epsilon = 1e-12);
        assert_abs_diff_eq!(grid.axes()[1][19], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(*grid.sampling_space(), xlimits, epsilon = 1e-12);
    }

    #[test]
    fn test_every() {
        let grid = Grid::linspace(&arr2(&[[0., 19.], [0., 19.]]), &[20, 20]);
        let sub = grid.every(5);
        assert_eq!(vec![4, 4], sub.shape());
        assert_eq!(array![0., 5., 10., 15.], sub.axes()[0]);
        let pts = sub.points();
        // second block of four points shares the second v level
        assert_eq!(array![[0., 5.], [5., 5.], [10., 5.], [15., 5.]], pts.slice(s![4..8, ..]));
    }

    #[test]
    fn test_meshgrid() {
        let grid = Grid::new(vec![array![1., 2., 3.], array![10., 20.]]);
        let (uu, vv) = grid.meshgrid().expect("2D grid");
        assert_eq!(array![[1., 2., 3.], [1., 2., 3.]], uu);
        assert_eq!(array![[10., 10., 10.], [20., 20., 20.]], vv);

        let grid3 = Grid::new(vec![array![0.], array![0.], array![0.]]);
        assert!(grid3.meshgrid().is_none());
    }

    #[test]
    fn test_grid_sample() {
        let grid = Grid::new(vec![array![5., 10.], array![1., 3.]]);
        assert_eq!(array![[0., 0.], [1., 0.], [0., 1.]], grid.normalized_sample(3));
        assert_eq!(array![[5., 1.], [10., 1.], [5., 3.], [10., 3.]], grid.sample(10));
    }

    #[test]
    #[should_panic]
    fn test_every_zero_step() {
        Grid::new(vec![array![0., 1.]]).every(0);
    }
}
