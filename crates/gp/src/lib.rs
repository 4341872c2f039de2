//! This library implements [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! as a surrogate of a scalar function observed with gaussian measurement noise.
//!
//! The process has a zero mean and a stationary covariance `s2 * kernel(x - x', l)`.
//! Hyperparameters (length scales `l`, signal variance `s2`, noise standard deviation `sigma`)
//! are either given or estimated by minimizing the negative log likelihood of the training
//! data with a multistart COBYLA optimizer.
//!
//! GP surrogates are implemented by [GpSurrogate] parameterized by [GpSurrogateParams].
//! The likelihood itself is available through [nll] and [gp_nll] to profile it
//! against hyperparameters values.
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
mod errors;
mod hyperparameters;
pub mod kernels;
mod likelihood;
pub mod metrics;

mod parameters;
mod utils;

mod optimization;

pub use algorithm::*;
pub use errors::*;
pub use hyperparameters::*;
pub use kernels::{Kernel, Matern32Kernel, Matern52Kernel, SquaredExponentialKernel};
pub use likelihood::{covariance_matrix, gp_nll, nll};
pub use parameters::*;
pub use utils::pairwise_differences;
