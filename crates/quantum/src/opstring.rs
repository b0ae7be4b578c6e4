use crate::operators::{LocalOp, SiteSpace};
use faer::Mat;
use std::collections::BTreeMap;
use tn::linalg::matmul;
use tn::C64;

/// Product of local operators with a coefficient, `coeff · U_1 U_2 … U_k`.
///
/// Units keep their order: fermionic units do not commute, and the
/// Jordan-Wigner expansion depends on it.
#[derive(Clone, Debug)]
pub struct OpString {
    pub coeff: C64,
    pub units: Vec<(usize, LocalOp)>,
}

impl OpString {
    pub fn new(coeff: f64, units: Vec<(usize, LocalOp)>) -> Self {
        Self {
            coeff: C64::new(coeff, 0.0),
            units,
        }
    }

    pub fn single(coeff: f64, site: usize, op: LocalOp) -> Self {
        Self::new(coeff, vec![(site, op)])
    }

    pub fn pair(coeff: f64, i: usize, a: LocalOp, j: usize, b: LocalOp) -> Self {
        Self::new(coeff, vec![(i, a), (j, b)])
    }

    /// Distinct sites touched, ascending.
    pub fn sites(&self) -> Vec<usize> {
        let mut s: Vec<usize> = self.units.iter().map(|(i, _)| *i).collect();
        s.sort_unstable();
        s.dedup();
        s
    }

    pub fn min_site(&self) -> Option<usize> {
        self.units.iter().map(|(i, _)| *i).min()
    }

    pub fn max_site(&self) -> Option<usize> {
        self.units.iter().map(|(i, _)| *i).max()
    }

    /// Odd number of fermionic units.
    pub fn is_fermionic(&self) -> bool {
        self.units.iter().filter(|(_, u)| u.fermionic).count() % 2 == 1
    }

    /// The same string seen from the right end of an `nl + nr` site window,
    /// site `i` maps to `nl + nr - 1 - i`.
    pub fn site_image(&self, nl: usize, nr: usize) -> OpString {
        let last = nl + nr - 1;
        OpString {
            coeff: self.coeff,
            units: self
                .units
                .iter()
                .map(|(i, u)| (last - i, u.clone()))
                .collect(),
        }
    }

    /// Jordan-Wigner expansion into one matrix per site.
    ///
    /// `order` lists sites in Fock ordering. Every fermionic unit puts the
    /// parity operator on the sites placed before it, and factors on the same
    /// site multiply in unit order. Sites left with the identity are omitted,
    /// the coefficient is not included.
    pub fn expand(&self, order: &[usize], space: &SiteSpace) -> BTreeMap<usize, Mat<C64>> {
        let parity = space.parity_matrix();
        let mut out: BTreeMap<usize, Mat<C64>> = BTreeMap::new();
        let mul = |site: usize, m: &Mat<C64>, out: &mut BTreeMap<usize, Mat<C64>>| {
            let next = match out.get(&site) {
                Some(cur) => matmul(cur, m),
                None => m.clone(),
            };
            out.insert(site, next);
        };

        for (site, unit) in &self.units {
            if unit.fermionic && space.is_fermionic() {
                let pos = order.iter().position(|s| s == site).unwrap_or(0);
                for &before in &order[..pos] {
                    mul(before, &parity, &mut out);
                }
            }
            mul(*site, &unit.matrix, &mut out);
        }

        out.retain(|_, m| !is_identity(m));
        out
    }
}

fn is_identity(m: &Mat<C64>) -> bool {
    (0..m.nrows()).all(|i| {
        (0..m.ncols()).all(|j| {
            let target = if i == j { 1.0 } else { 0.0 };
            (m.read(i, j) - C64::new(target, 0.0)).norm() == 0.0
        })
    })
}
