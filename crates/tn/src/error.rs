//! Error types for tensor and linear-algebra operations

use thiserror::Error;

/// Errors raised by the linear-algebra kernels
#[derive(Error, Debug)]
pub enum LinalgError {
    /// The iterative eigensolver exhausted its budget
    #[error("eigensolver did not converge {requested} eigenpairs after {matvecs} matrix-vector products")]
    ConvergenceFailure { requested: usize, matvecs: usize },

    /// Operand shapes do not agree
    #[error("Dimension mismatch: {message}")]
    DimensionMismatch { message: String },
}

/// Result type for linear-algebra operations
pub type Result<T> = std::result::Result<T, LinalgError>;
