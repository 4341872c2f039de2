//! Mockup study of a Gaussian process surrogate fitted to a shifted and scaled
//! Rosenbrock function of two inputs `(u, v)`.
//!
//! The study runs the following stages:
//! * sample the [benchmark] function on a 20x20 grid for reference,
//! * take every 5th level of each input as training set (16 points),
//! * fit a [gpsur_gp::GpSurrogate] estimating its length scale and measurement noise,
//! * predict along a `v = v0` slice and compare with the reference,
//! * profile the negative log likelihood over the length scale and the noise.
//!
//! Figures are written as SVG files by the [plot] module and arrays can be dumped
//! with the [export] module.
//!
//! ```no_run
//! use gpsur::{StudyConfig, plot, study};
//!
//! let cfg = StudyConfig::default();
//! let report = study::run(&cfg).expect("study run");
//! println!("rmse on test slice = {}", report.rmse);
//! plot::draw_figures(&report, &cfg).expect("figures");
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
pub mod benchmark;
mod config;
mod errors;
pub mod export;
pub mod plot;
pub mod study;

pub use benchmark::{MockupFunction, rosenbrock};
pub use config::*;
pub use errors::*;
