//! The two-block system `H = HL ⊗ I + I ⊗ HR + Σ c OL ⊗ OR`.

use crate::block_generator::BlockGenerator;
use faer::Mat;
use quantum::OpString;
use std::collections::BTreeMap;
use tn::linalg::{add, identity, kron, matmul, scale, transpose};
use tn::C64;

/// Frame index of chain site `i` in the right block of an `nl + nr` window.
pub fn site_image(i: usize, nl: usize, nr: usize) -> usize {
    nl + nr - 1 - i
}

/// A coupling term split into its left and right factor images.
#[derive(Clone, Debug)]
pub struct Coupling {
    pub coeff: C64,
    pub left: Mat<C64>,
    pub right: Mat<C64>,
}

/// Superblock operator over the expanded left and right blocks.
///
/// Joint index `x * ndimr + y`. Fock ordering puts the left chain sites first
/// and then the right block in its own frame, which is what the fermionic
/// strings of the coupling terms are expanded in.
pub struct SuperBlock<'a> {
    left: &'a BlockGenerator,
    right: &'a BlockGenerator,
    couplings: Vec<Coupling>,
}

impl<'a> SuperBlock<'a> {
    /// `left` and `right` must both be expanded. The window spans the
    /// expanded left sites `0..=nl` and the expanded right sites.
    pub fn new(left: &'a BlockGenerator, right: &'a BlockGenerator, coupling: &[OpString]) -> Self {
        let nl = left.len();
        let nr = right.len();
        let window = nl + nr + 2;
        let order: Vec<usize> = (0..=nl).chain((nl + 1..window).rev()).collect();
        let space = left.space();

        let couplings = coupling
            .iter()
            .map(|op| {
                let factors = op.expand(&order, space);
                let mut lf = BTreeMap::new();
                let mut rf = BTreeMap::new();
                for (site, m) in factors {
                    if site <= nl {
                        lf.insert(site, m);
                    } else {
                        rf.insert(site_image(site, nl + 1, nr + 1), m);
                    }
                }
                Coupling {
                    coeff: op.coeff,
                    left: left.image(&lf),
                    right: right.image(&rf),
                }
            })
            .collect();

        Self {
            left,
            right,
            couplings,
        }
    }

    pub fn ndiml(&self) -> usize {
        self.left.ndim()
    }

    pub fn ndimr(&self) -> usize {
        self.right.ndim()
    }

    pub fn dim(&self) -> usize {
        self.ndiml() * self.ndimr()
    }

    pub fn couplings(&self) -> &[Coupling] {
        &self.couplings
    }

    /// Dense matrix of the full operator.
    pub fn dense(&self) -> Mat<C64> {
        let (ml, mr) = (self.ndiml(), self.ndimr());
        let mut h = add(
            &kron(self.left.hamiltonian(), &identity(mr)),
            &kron(&identity(ml), self.right.hamiltonian()),
        );
        for c in &self.couplings {
            h = add(&h, &scale(&kron(&c.left, &c.right), c.coeff));
        }
        h
    }

    /// Matrix-free product: with `v` reshaped to `X` (`ndiml × ndimr`),
    /// `HL X + X HRᵀ + Σ c OL X ORᵀ`.
    pub fn apply(&self, v: &[C64]) -> Vec<C64> {
        let (ml, mr) = (self.ndiml(), self.ndimr());
        let x = Mat::from_fn(ml, mr, |i, j| v[i * mr + j]);
        let mut y = add(
            &matmul(self.left.hamiltonian(), &x),
            &matmul(&x, &transpose(self.right.hamiltonian())),
        );
        for c in &self.couplings {
            let term = matmul(&matmul(&c.left, &x), &transpose(&c.right));
            y = add(&y, &scale(&term, c.coeff));
        }
        let mut out = Vec::with_capacity(ml * mr);
        for i in 0..ml {
            for j in 0..mr {
                out.push(y.read(i, j));
            }
        }
        out
    }
}

/// Restriction of an operator to a subset of basis states.
pub struct Restricted<'a, F> {
    pub indices: &'a [usize],
    pub dim: usize,
    pub apply: F,
}

impl<'a, F> Restricted<'a, F>
where
    F: Fn(&[C64]) -> Vec<C64>,
{
    pub fn embed(&self, v: &[C64]) -> Vec<C64> {
        let mut full = vec![C64::new(0.0, 0.0); self.dim];
        for (k, &i) in self.indices.iter().enumerate() {
            full[i] = v[k];
        }
        full
    }

    pub fn extract(&self, v: &[C64]) -> Vec<C64> {
        self.indices.iter().map(|&i| v[i]).collect()
    }

    pub fn apply(&self, v: &[C64]) -> Vec<C64> {
        self.extract(&(self.apply)(&self.embed(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_generator::Evolutor;
    use quantum::hamiltonian::{spinless_fermions, transverse_ising};
    use quantum::{OpCollection, SiteSpace};
    use tn::linalg::eigh;

    fn one_site(space: SiteSpace, chain: &OpCollection) -> BlockGenerator {
        let mut g = BlockGenerator::new(space, Evolutor::Isometric);
        let ops: Vec<OpString> = chain
            .ops
            .iter()
            .filter(|op| op.sites() == vec![0])
            .cloned()
            .collect();
        g.expand(&ops).unwrap();
        g
    }

    fn couplings(chain: &OpCollection) -> Vec<OpString> {
        chain
            .ops
            .iter()
            .filter(|op| op.min_site() == Some(0) && op.max_site() == Some(1))
            .cloned()
            .collect()
    }

    #[test]
    fn two_site_ising_matches_exact() {
        let chain = transverse_ising(2, 1.0, 0.5);
        let g = one_site(SiteSpace::spin_half(), &chain);
        let sb = SuperBlock::new(&g, &g, &couplings(&chain));
        let (e, _) = eigh(&sb.dense()).unwrap();
        assert!((e[0] + 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn matvec_agrees_with_dense() {
        let chain = spinless_fermions(2, 1.0, 0.4, 0.2);
        let g = one_site(SiteSpace::spinless_fermion(), &chain);
        let sb = SuperBlock::new(&g, &g, &couplings(&chain));
        let h = sb.dense();
        let v: Vec<C64> = (0..4).map(|i| C64::new(0.3 * i as f64 - 0.2, 0.1 * i as f64)).collect();
        let hv = sb.apply(&v);
        for i in 0..4 {
            let expect: C64 = (0..4).map(|j| h.read(i, j) * v[j]).sum();
            assert!((hv[i] - expect).norm() < 1e-12);
        }
        let exact = quantum::exact::lowest_levels(&chain, 1).unwrap()[0];
        let (e, _) = eigh(&h).unwrap();
        assert!((e[0] - exact).abs() < 1e-12);
    }

    #[test]
    fn restriction_round_trip() {
        let r = Restricted {
            indices: &[1, 3],
            dim: 4,
            apply: |v: &[C64]| v.iter().map(|x| x * 2.0).collect::<Vec<C64>>(),
        };
        let out = r.apply(&[C64::new(1.0, 0.0), C64::new(0.0, 1.0)]);
        assert_eq!(out, vec![C64::new(2.0, 0.0), C64::new(0.0, 2.0)]);
        assert_eq!(r.embed(&out)[3], C64::new(0.0, 2.0));
    }
}
