//! Two-block DMRG for one-dimensional lattice Hamiltonians.

pub mod analysis;
pub mod assemble;
pub mod block_generator;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod predict;
pub mod superblock;
pub mod symmetry;

pub use block_generator::{BlockGenerator, Evolutor};
pub use config::{BlockParams, Direction, Endpoint, SectorRule, Truncation, TruncationStrategy};
pub use engine::{DmrgEngine, StepRecord};
pub use error::{DmrgError, Result};
