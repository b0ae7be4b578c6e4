//! Tensor containers and dense/iterative linear algebra used by the DMRG
//! engine.

pub mod block_marker;
pub mod error;
pub mod lanczos;
pub mod linalg;
pub mod mps;
pub mod truncation;

pub use error::{LinalgError, Result};
pub use mps::C64;
