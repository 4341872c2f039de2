use thiserror::Error;

/// A result type for GP surrogate computations
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when training or using a [`GpSurrogate`](crate::GpSurrogate)
#[derive(Error, Debug)]
pub enum GpError {
    /// When the likelihood cannot be evaluated (covariance not positive definite, non finite value)
    #[error("Likelihood computation error: {0}")]
    LikelihoodComputationError(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When a linfa error occurs
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
    /// When a given value or array shape is not usable
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
}
