//! Local operators, model Hamiltonians and reference solvers for 1D chains.

pub mod energy;
mod env;
pub mod exact;
pub mod hamiltonian;
pub mod labeling;
pub mod observables;
pub mod operators;
pub mod opstring;

pub use hamiltonian::OpCollection;
pub use labeling::BlockLabeling;
pub use operators::{LocalOp, SiteSpace};
pub use opstring::OpString;
