//! Structured error types for pairstat.

use thiserror::Error;

/// Unified error type for all pairstat operations.
#[derive(Debug, Error)]
pub enum PairstatError {
    /// Invalid input to a computation (too few observations, zero variance,
    /// out-of-range values).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration: unknown column, bad selection, unknown metric.
    #[error("configuration error: {0}")]
    Config(String),

    /// Options text that could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A statistic failed on one comparison and the failure is fatal.
    #[error("statistic failed for '{reference}' vs '{target}': {message}")]
    Statistic {
        reference: String,
        target: String,
        message: String,
    },

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

impl PairstatError {
    /// Whether this error is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, PairstatError::Config(_))
    }
}

/// Convenience alias used throughout pairstat.
pub type Result<T> = std::result::Result<T, PairstatError>;
