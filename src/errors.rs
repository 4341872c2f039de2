use gpsur_gp::GpError;
use thiserror::Error;

/// A result type for the mockup study
pub type Result<T> = std::result::Result<T, MockupError>;

/// An error when running the mockup study
#[derive(Error, Debug)]
pub enum MockupError {
    /// When surrogate fitting or likelihood evaluation fails
    #[error(transparent)]
    GpError(#[from] GpError),
    /// When output files cannot be written
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// When figure drawing fails
    #[error("Plot error: {0}")]
    PlotError(String),
    /// When array dump fails
    #[error(transparent)]
    NpyError(#[from] ndarray_npy::WriteNpyError),
    /// When the study configuration is not usable
    #[error("InvalidConfig error: {0}")]
    InvalidConfigError(String),
}
