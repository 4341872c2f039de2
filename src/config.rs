use crate::errors::{MockupError, Result};
use std::path::PathBuf;

/// Default hyperparameters `[l, s2]` of the noise likelihood profile
pub const NOISE_SCAN_HYPERPARAMETERS: [f64; 2] = [2.08, 1.0];

/// Settings of the mockup study, defaults reproduce the reference mockup run
#[derive(Clone, Debug, PartialEq)]
pub struct StudyConfig {
    /// Shift parameter `r` of the mockup function
    pub r: f64,
    /// Bounds of the `u` input
    pub u_bounds: (f64, f64),
    /// Bounds of the `v` input
    pub v_bounds: (f64, f64),
    /// Number of levels of each input in the ground truth grid
    pub levels: usize,
    /// Training set keeps every `train_step`-th level of each input
    pub train_step: usize,
    /// Index into training `v` levels of the test slice `v = v0`
    pub test_row: usize,
    /// Length scale range of the likelihood profile
    pub length_scale_range: (f64, f64),
    /// Number of points of the length scale profile
    pub length_scale_points: usize,
    /// Signal variance used by the length scale profile
    pub scan_signal_variance: f64,
    /// Smallest noise standard deviation of the noise profile,
    /// the largest is 1e-2 of the training outputs range
    pub noise_scan_end: f64,
    /// Number of points of the noise profile
    pub noise_scan_points: usize,
    /// Hyperparameters `[l.., s2]` used by the noise profile
    pub noise_scan_hyperparameters: Vec<f64>,
    /// Directory of output files
    pub out_dir: PathBuf,
    /// Figure size in pixels
    pub plot_size: (u32, u32),
    /// Seed of the hyperparameters optimization multistart
    pub seed: u64,
    /// Whether study arrays are dumped as .npy files
    pub export_npy: bool,
}

impl Default for StudyConfig {
    fn default() -> Self {
        StudyConfig {
            r: 0.25,
            u_bounds: (4.7, 5.3),
            v_bounds: (0.55, 0.6),
            levels: 20,
            train_step: 5,
            test_row: 1,
            length_scale_range: (1.0, 4.0),
            length_scale_points: 100,
            scan_signal_variance: 1.0,
            noise_scan_end: 1e-3,
            noise_scan_points: 40,
            noise_scan_hyperparameters: NOISE_SCAN_HYPERPARAMETERS.to_vec(),
            out_dir: PathBuf::from("mockup_out"),
            plot_size: (800, 600),
            seed: gpsur_gp::GP_OPTIM_SEED,
            export_npy: false,
        }
    }
}

impl StudyConfig {
    /// Number of training levels of each input
    pub fn train_levels(&self) -> usize {
        self.levels.div_ceil(self.train_step.max(1))
    }

    /// Checks settings consistency
    pub fn check(&self) -> Result<()> {
        let invalid = |msg: String| Err(MockupError::InvalidConfigError(msg));
        for (name, (lo, up)) in [("u", self.u_bounds), ("v", self.v_bounds)] {
            if !(lo.is_finite() && up.is_finite() && lo < up) {
                return invalid(format!("{name} bounds should be finite with lower < upper, got ({lo}, {up})"));
            }
        }
        if self.levels < 2 {
            return invalid(format!("levels should be at least 2, got {}", self.levels));
        }
        if self.train_step == 0 {
            return invalid("training step should be strictly positive".to_string());
        }
        if self.train_levels() < 2 {
            return invalid(format!(
                "training step {} should keep at least 2 of the {} levels",
                self.train_step, self.levels
            ));
        }
        if self.test_row >= self.train_levels() {
            return invalid(format!(
                "test row {} should index one of the {} training v levels",
                self.test_row,
                self.train_levels()
            ));
        }
        let (lmin, lmax) = self.length_scale_range;
        if !(lmin > 0. && lmin <= lmax) || self.length_scale_points == 0 {
            return invalid(format!(
                "length scale profile needs 0 < min <= max and at least one point, got ({lmin}, {lmax}) with {} points",
                self.length_scale_points
            ));
        }
        if !(self.scan_signal_variance > 0.) {
            return invalid(format!(
                "profile signal variance should be positive, got {}",
                self.scan_signal_variance
            ));
        }
        if !(self.noise_scan_end >= 0.) || self.noise_scan_points == 0 {
            return invalid(format!(
                "noise profile needs a non negative end and at least one point, got {} with {} points",
                self.noise_scan_end, self.noise_scan_points
            ));
        }
        if self.noise_scan_hyperparameters.len() < 2 {
            return invalid(format!(
                "noise profile hyperparameters should be [l.., s2], got {:?}",
                self.noise_scan_hyperparameters
            ));
        }
        if self.plot_size.0 == 0 || self.plot_size.1 == 0 {
            return invalid(format!("plot size should not be empty, got {:?}", self.plot_size));
        }
        Ok(())
    }
}
