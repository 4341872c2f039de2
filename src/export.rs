//! Dumps of the study arrays in numpy `.npy` format.

use crate::errors::Result;
use crate::study::StudyReport;

use log::info;
use ndarray_npy::write_npy;
use std::path::{Path, PathBuf};

/// Writes study arrays to `dir`, returns the written file paths
pub fn dump_arrays(report: &StudyReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = vec![];
    let mut save1 = |name: &str, array: &ndarray::Array1<f64>| -> Result<()> {
        let path = dir.join(name);
        write_npy(&path, array)?;
        written.push(path);
        Ok(())
    };
    save1("u.npy", &report.truth.u)?;
    save1("v.npy", &report.truth.v)?;
    save1("ytrain.npy", &report.train.y)?;
    save1("ytest.npy", &report.slice.reference)?;
    save1("mean.npy", &report.slice.mean)?;
    save1("std.npy", &report.slice.std)?;
    save1("length_scales.npy", &report.length_scale_profile.values)?;
    save1("nll_length_scale.npy", &report.length_scale_profile.nll)?;
    save1("sigmas.npy", &report.noise_profile.values)?;
    save1("nll_sigma.npy", &report.noise_profile.nll)?;

    for (name, array) in [
        ("y_grid.npy", &report.truth.y),
        ("xtrain.npy", &report.train.x),
        ("xtest.npy", &report.slice.x),
    ] {
        let path = dir.join(name);
        write_npy(&path, array)?;
        written.push(path);
    }
    info!("{} arrays saved to {}", written.len(), dir.display());
    Ok(written)
}
