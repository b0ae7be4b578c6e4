use crate::operators::{
    annihilate, create, number, pauli_x, pauli_z, spin_minus, spin_plus, spin_z, SiteSpace,
};
use crate::opstring::OpString;

/// A Hamiltonian as a sum of operator strings on a chain.
#[derive(Clone, Debug)]
pub struct OpCollection {
    pub nsite: usize,
    pub space: SiteSpace,
    pub ops: Vec<OpString>,
}

impl OpCollection {
    pub fn new(nsite: usize, space: SiteSpace) -> Self {
        Self {
            nsite,
            space,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: OpString) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Terms touching `site`.
    pub fn query(&self, site: usize) -> Vec<&OpString> {
        self.ops
            .iter()
            .filter(|op| op.units.iter().any(|(i, _)| *i == site))
            .collect()
    }

    /// Largest distance between two sites of one term.
    pub fn range(&self) -> usize {
        self.ops
            .iter()
            .filter_map(|op| Some(op.max_site()? - op.min_site()?))
            .max()
            .unwrap_or(0)
    }
}

/// Transverse-field Ising chain, `H = -J Σ Z_i Z_{i+1} - h Σ X_i`.
pub fn transverse_ising(n: usize, j: f64, h: f64) -> OpCollection {
    let mut c = OpCollection::new(n, SiteSpace::spin_half());
    for i in 0..n.saturating_sub(1) {
        c.push(OpString::pair(-j, i, pauli_z(), i + 1, pauli_z()));
    }
    for i in 0..n {
        c.push(OpString::single(-h, i, pauli_x()));
    }
    c
}

/// XXZ chain of spin `twice_s / 2` with single-ion anisotropy,
/// `H = Σ J/2 (S+_i S-_{i+1} + h.c.) + Jz Sz_i Sz_{i+1} + D Σ (Sz_i)^2`.
pub fn xxz(n: usize, twice_s: usize, j: f64, jz: f64, d: f64) -> OpCollection {
    let mut c = OpCollection::new(n, SiteSpace::spin(twice_s));
    for i in 0..n.saturating_sub(1) {
        c.push(OpString::pair(j / 2.0, i, spin_plus(twice_s), i + 1, spin_minus(twice_s)));
        c.push(OpString::pair(j / 2.0, i, spin_minus(twice_s), i + 1, spin_plus(twice_s)));
        c.push(OpString::pair(jz, i, spin_z(twice_s), i + 1, spin_z(twice_s)));
    }
    if d != 0.0 {
        for i in 0..n {
            c.push(OpString::pair(d, i, spin_z(twice_s), i, spin_z(twice_s)));
        }
    }
    c
}

/// Spin-1/2 Heisenberg chain, `H = J Σ S_i · S_{i+1}`.
pub fn heisenberg(n: usize, j: f64) -> OpCollection {
    xxz(n, 1, j, j, 0.0)
}

/// Spinless fermions with hopping and nearest-neighbour repulsion,
/// `H = -t Σ (c+_i c_{i+1} + c+_{i+1} c_i) + V Σ n_i n_{i+1} - μ Σ n_i`.
pub fn spinless_fermions(n: usize, t: f64, v: f64, mu: f64) -> OpCollection {
    let mut c = OpCollection::new(n, SiteSpace::spinless_fermion());
    for i in 0..n.saturating_sub(1) {
        c.push(OpString::pair(-t, i, create(), i + 1, annihilate()));
        c.push(OpString::pair(-t, i + 1, create(), i, annihilate()));
        if v != 0.0 {
            c.push(OpString::pair(v, i, number(), i + 1, number()));
        }
    }
    if mu != 0.0 {
        for i in 0..n {
            c.push(OpString::single(-mu, i, number()));
        }
    }
    c
}
