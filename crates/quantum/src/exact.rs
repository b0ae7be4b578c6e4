//! Exact diagonalization of small chains.

use crate::hamiltonian::OpCollection;
use faer::Mat;
use tn::linalg::{add, eigh, identity, kron, scale, zeros};
use tn::mps::{C64, MPS};
use tn::Result;

/// Dense Hamiltonian in the chain-ordered product basis,
/// index `s_0 d^{n-1} + … + s_{n-1}`.
pub fn full_hamiltonian(h: &OpCollection) -> Mat<C64> {
    let d = h.space.dim;
    let dim = d.pow(h.nsite as u32);
    let order: Vec<usize> = (0..h.nsite).collect();
    let mut out = zeros(dim, dim);
    for op in &h.ops {
        let factors = op.expand(&order, &h.space);
        let mut term = identity(1);
        for k in 0..h.nsite {
            term = match factors.get(&k) {
                Some(m) => kron(&term, m),
                None => kron(&term, &identity(d)),
            };
        }
        out = add(&out, &scale(&term, op.coeff));
    }
    out
}

/// Mirror operator `i -> n-1-i`.
///
/// On fermionic chains the reordering of `N` particles contributes
/// `(-1)^{N(N-1)/2}`.
pub fn reflection(h: &OpCollection) -> Mat<C64> {
    let d = h.space.dim;
    let n = h.nsite;
    let dim = d.pow(n as u32);
    let mut out = zeros(dim, dim);
    for idx in 0..dim {
        let digits = to_digits(idx, d, n);
        let mirrored: usize = digits.iter().rev().fold(0, |acc, &s| acc * d + s);
        let count: usize = digits.iter().map(|&s| h.space.odd(s)).sum();
        let sign = if (count * count.saturating_sub(1) / 2) % 2 == 1 {
            -1.0
        } else {
            1.0
        };
        out.write(mirrored, idx, C64::new(sign, 0.0));
    }
    out
}

fn to_digits(mut idx: usize, d: usize, n: usize) -> Vec<usize> {
    let mut digits = vec![0; n];
    for k in (0..n).rev() {
        digits[k] = idx % d;
        idx /= d;
    }
    digits
}

/// Lowest `k` eigenvalues.
pub fn lowest_levels(h: &OpCollection, k: usize) -> Result<Vec<f64>> {
    let (values, _) = eigh(&full_hamiltonian(h))?;
    Ok(values.into_iter().take(k).collect())
}

/// Ground energy and state.
pub fn ground_state(h: &OpCollection) -> Result<(f64, Vec<C64>)> {
    let (values, vectors) = eigh(&full_hamiltonian(h))?;
    let dim = vectors.nrows();
    let e0 = values.first().copied().unwrap_or(0.0);
    Ok((e0, (0..dim).map(|i| vectors.read(i, 0)).collect()))
}

/// Lowest energy among states with mirror eigenvalue `parity`.
///
/// The wrong sector is lifted by a penalty larger than the spectral width.
pub fn ground_energy_in_reflection_sector(h: &OpCollection, parity: i8) -> Result<f64> {
    let hm = full_hamiltonian(h);
    let r = reflection(h);
    let width: f64 = (0..hm.nrows())
        .map(|i| (0..hm.ncols()).map(|j| hm.read(i, j).norm()).sum::<f64>())
        .fold(0.0, f64::max);
    let lambda = 2.0 * width + 1.0;
    let dim = hm.nrows();
    let wrong = add(&identity(dim), &scale(&r, C64::new(-(parity as f64), 0.0)));
    let pen = add(&hm, &scale(&wrong, C64::new(lambda / 2.0, 0.0)));
    let (values, _) = eigh(&pen)?;
    Ok(values.first().copied().unwrap_or(0.0))
}

/// Chain-ordered coefficients of an MPS.
pub fn statevector(psi: &MPS) -> Vec<C64> {
    let mut acc: Vec<Vec<C64>> = vec![vec![C64::new(1.0, 0.0)]];
    for a in &psi.sites {
        // acc[idx][l] -> next[idx * dp + p][r]
        let mut next = vec![vec![C64::new(0.0, 0.0); a.dr]; acc.len() * a.dp];
        for (idx, row) in acc.iter().enumerate() {
            for p in 0..a.dp {
                for r in 0..a.dr {
                    next[idx * a.dp + p][r] = (0..a.dl).map(|l| row[l] * a.get(l, p, r)).sum();
                }
            }
        }
        acc = next;
    }
    acc.into_iter().map(|row| row.iter().sum()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hamiltonian::{heisenberg, spinless_fermions, transverse_ising};

    #[test]
    fn two_site_ising_ground_energy() {
        // H = -Z Z - h (X_0 + X_1), lowest level -sqrt(1 + 4 h^2)
        let h = transverse_ising(2, 1.0, 0.5);
        let e = lowest_levels(&h, 1).unwrap()[0];
        assert!((e + 2.0f64.sqrt()).abs() < 1e-12, "E = {}", e);
    }

    #[test]
    fn heisenberg_dimer_singlet() {
        let e = lowest_levels(&heisenberg(2, 1.0), 1).unwrap()[0];
        assert!((e + 0.75).abs() < 1e-12);
    }

    #[test]
    fn free_fermions_fill_lowest_modes() {
        let n = 6;
        let h = spinless_fermions(n, 1.0, 0.0, 0.0);
        let expected: f64 = (1..=n)
            .map(|k| -2.0 * (k as f64 * std::f64::consts::PI / (n as f64 + 1.0)).cos())
            .filter(|e| *e < 0.0)
            .sum();
        let e = lowest_levels(&h, 1).unwrap()[0];
        assert!((e - expected).abs() < 1e-10, "{} vs {}", e, expected);
    }

    #[test]
    fn reflection_commutes_with_fermion_chain() {
        let h = spinless_fermions(4, 1.0, 0.7, 0.0);
        let hm = full_hamiltonian(&h);
        let r = reflection(&h);
        let lhs = tn::linalg::matmul(&hm, &r);
        let rhs = tn::linalg::matmul(&r, &hm);
        for i in 0..16 {
            for j in 0..16 {
                assert!((lhs.read(i, j) - rhs.read(i, j)).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn sectors_cover_the_ground_state() {
        let h = transverse_ising(4, 1.0, 0.8);
        let e0 = lowest_levels(&h, 1).unwrap()[0];
        let even = ground_energy_in_reflection_sector(&h, 1).unwrap();
        let odd = ground_energy_in_reflection_sector(&h, -1).unwrap();
        assert!((even.min(odd) - e0).abs() < 1e-10);
        assert!(odd > e0 - 1e-10);
    }

    #[test]
    fn statevector_of_product_state() {
        let v = statevector(&MPS::product(&[1, 0, 1], 2));
        assert_eq!(v.len(), 8);
        assert_eq!(v[0b101], C64::new(1.0, 0.0));
        assert_eq!(v.iter().filter(|x| x.norm() > 0.0).count(), 1);
    }
}
