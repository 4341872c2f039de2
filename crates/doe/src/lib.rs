/*!
Sampling designs used to build and train surrogate models.

A design lives in a sample space `xlimits`, a 2D ndarray `(nx, 2)` giving the
lower and upper bound of each of the `nx` input components.

Two families are provided:
* [Grid]: tensor product of explicit per-axis levels, used to
  evaluate a reference function on a regular mesh or to pick a coarser training
  sub-grid,
* [Lhs]: Latin Hypercube Sampling, used to spread optimizer
  starting points over a box.

Example:
```
use gpsur_doe::{Grid, Lhs, LhsKind, SamplingMethod};
use ndarray::arr2;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

// Design space is [4.7, 5.3] x [0.55, 0.6]
let xlimits = arr2(&[[4.7, 5.3], [0.55, 0.6]]);

// 20 x 20 regular mesh and its every-5th-level training sub-grid
let grid = Grid::linspace(&xlimits, &[20, 20]);
let train = grid.every(5);
assert_eq!(train.points().nrows(), 16);

// Five maximin latin hypercube samples, reproducible
let samples = Lhs::new(&xlimits)
    .kind(LhsKind::Maximin)
    .with_rng(Xoshiro256Plus::seed_from_u64(42))
    .sample(5);
```
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod grid;
mod lhs;
mod traits;
mod utils;

pub use grid::*;
pub use lhs::*;
pub use traits::*;
pub use utils::pdist;
