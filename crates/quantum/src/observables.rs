use crate::env::sandwich;
use crate::operators::{LocalOp, SiteSpace};
use crate::opstring::OpString;
use std::collections::BTreeMap;
use tn::mps::{C64, MPS};

/// `⟨ψ|ψ⟩`.
pub fn norm_sqr(psi: &MPS) -> f64 {
    sandwich(&psi.sites, &BTreeMap::new()).re
}

/// Normalized expectation value of an operator string on a chain-ordered MPS.
pub fn expect(psi: &MPS, op: &OpString, space: &SiteSpace) -> C64 {
    let nrm = norm_sqr(psi);
    if nrm == 0.0 {
        return C64::new(0.0, 0.0);
    }
    let order: Vec<usize> = (0..psi.len()).collect();
    let ops = op.expand(&order, space);
    op.coeff * sandwich(&psi.sites, &ops) / nrm
}

/// `⟨O_k⟩` for a bosonic local operator.
pub fn expect_local(psi: &MPS, k: usize, op: &LocalOp, space: &SiteSpace) -> f64 {
    expect(psi, &OpString::single(1.0, k, op.clone()), space).re
}

/// `⟨A_i B_j⟩`, Jordan-Wigner strings included.
pub fn correlation(
    psi: &MPS,
    i: usize,
    a: &LocalOp,
    j: usize,
    b: &LocalOp,
    space: &SiteSpace,
) -> C64 {
    expect(psi, &OpString::pair(1.0, i, a.clone(), j, b.clone()), space)
}
