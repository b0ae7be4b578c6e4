//! Error types of the DMRG engine

use thiserror::Error;
use tn::LinalgError;

#[derive(Error, Debug)]
pub enum DmrgError {
    /// Invalid or inconsistent run parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A combination of options the engine does not implement
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// The eigensolver failed, also after the retry
    #[error("Convergence failure: {0}")]
    ConvergenceFailure(String),

    /// A density matrix or wavefunction mixes quantum-number sectors
    #[error("Symmetry violation: {0}")]
    SymmetryViolation(String),

    #[error("Linear algebra error: {0}")]
    Linalg(#[from] LinalgError),
}

pub type Result<T> = std::result::Result<T, DmrgError>;
