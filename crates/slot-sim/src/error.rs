//! Error types for batch simulation

use slot_lab::ConfigError;
use thiserror::Error;

/// Batch setup failures. Failures of single simulations are reported in the
/// [`BatchReport`](crate::BatchReport) instead.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid batch configuration: {0}")]
    InvalidConfig(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for batch operations
pub type SimResult<T> = Result<T, SimError>;
