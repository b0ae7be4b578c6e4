use crate::hamiltonian::OpCollection;
use crate::observables::expect;
use tn::mps::MPS;

/// Expectation value `⟨ψ|H|ψ⟩ / ⟨ψ|ψ⟩`.
pub fn energy(psi: &MPS, h: &OpCollection) -> f64 {
    h.ops.iter().map(|op| expect(psi, op, &h.space).re).sum()
}
