//! Error types for markowitz.

use thiserror::Error;

/// Error type for markowitz operations.
#[derive(Debug, Error)]
pub enum MarkowitzError {
    /// Mismatched dimensions between weights, mean returns, and covariance.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// The constrained optimizer did not converge within its iteration
    /// budget or constraint tolerance.
    #[error("Optimization failed to converge after {iterations} iterations (last objective {last_objective})")]
    OptimizationFailure {
        iterations: usize,
        last_objective: f64,
    },

    /// Invalid problem specification.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for markowitz operations.
pub type Result<T> = std::result::Result<T, MarkowitzError>;
