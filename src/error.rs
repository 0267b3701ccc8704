//! Error types for the spectral GAN library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Hyperparameters that cannot produce a consistent network
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Tensor shape does not match what a stage expects
    #[error("Shape mismatch at {stage}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        stage: String,
        expected: Vec<i64>,
        actual: Vec<i64>,
    },

    /// Invalid argument to a model operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error raised by libtorch
    #[error("Torch error: {0}")]
    TorchError(#[from] tch::TchError),
}

impl Error {
    /// Build a shape mismatch error for the named stage
    pub fn shape_mismatch(stage: impl Into<String>, expected: &[i64], actual: &[i64]) -> Self {
        Error::ShapeMismatch {
            stage: stage.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}
