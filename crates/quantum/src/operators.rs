//! Local operators and the single-site Hilbert spaces they act on.

use faer::Mat;
use tn::linalg::{diag, from_rows, identity as eye};
use tn::C64;

/// An operator acting on one site.
#[derive(Clone, Debug)]
pub struct LocalOp {
    pub name: String,
    pub matrix: Mat<C64>,
    /// Odd under the fermion parity of the site.
    pub fermionic: bool,
}

impl LocalOp {
    pub fn new(name: &str, matrix: Mat<C64>) -> Self {
        Self {
            name: name.to_string(),
            matrix,
            fermionic: false,
        }
    }

    pub fn fermion(name: &str, matrix: Mat<C64>) -> Self {
        Self {
            name: name.to_string(),
            matrix,
            fermionic: true,
        }
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }
}

/// Local Hilbert space of a site.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteSpace {
    pub dim: usize,
    /// Fermion parity (+1 even, -1 odd) of each basis state, absent for
    /// bosonic sites.
    pub parity: Option<Vec<i8>>,
}

impl SiteSpace {
    /// Spin `twice_s / 2` with basis `m = s, s-1, …, -s`.
    pub fn spin(twice_s: usize) -> Self {
        Self {
            dim: twice_s + 1,
            parity: None,
        }
    }

    pub fn spin_half() -> Self {
        Self::spin(1)
    }

    /// Spinless fermion with basis `|0⟩, |1⟩`.
    pub fn spinless_fermion() -> Self {
        Self {
            dim: 2,
            parity: Some(vec![1, -1]),
        }
    }

    pub fn is_fermionic(&self) -> bool {
        self.parity.is_some()
    }

    /// `1` when basis state `i` is fermion-odd.
    pub fn odd(&self, i: usize) -> usize {
        match &self.parity {
            Some(p) if p[i] < 0 => 1,
            _ => 0,
        }
    }

    /// Parity operator, the identity for bosonic sites.
    pub fn parity_matrix(&self) -> Mat<C64> {
        match &self.parity {
            Some(p) => diag(&p.iter().map(|&x| x as f64).collect::<Vec<_>>()),
            None => eye(self.dim),
        }
    }
}

fn c(re: f64, im: f64) -> C64 {
    C64::new(re, im)
}

pub fn identity(d: usize) -> LocalOp {
    LocalOp::new("I", eye(d))
}

pub fn pauli_x() -> LocalOp {
    LocalOp::new(
        "X",
        from_rows(&[vec![c(0.0, 0.0), c(1.0, 0.0)], vec![c(1.0, 0.0), c(0.0, 0.0)]]),
    )
}

pub fn pauli_y() -> LocalOp {
    LocalOp::new(
        "Y",
        from_rows(&[vec![c(0.0, 0.0), c(0.0, -1.0)], vec![c(0.0, 1.0), c(0.0, 0.0)]]),
    )
}

pub fn pauli_z() -> LocalOp {
    LocalOp::new("Z", diag(&[1.0, -1.0]))
}

/// `S^z` for spin `twice_s / 2`.
pub fn spin_z(twice_s: usize) -> LocalOp {
    let s = twice_s as f64 / 2.0;
    let m: Vec<f64> = (0..=twice_s).map(|i| s - i as f64).collect();
    LocalOp::new("Sz", diag(&m))
}

/// `S^+` for spin `twice_s / 2`, `⟨m+1|S^+|m⟩ = sqrt(s(s+1) - m(m+1))`.
pub fn spin_plus(twice_s: usize) -> LocalOp {
    let s = twice_s as f64 / 2.0;
    let d = twice_s + 1;
    let matrix = Mat::from_fn(d, d, |i, j| {
        if j == i + 1 {
            let m = s - j as f64;
            c((s * (s + 1.0) - m * (m + 1.0)).sqrt(), 0.0)
        } else {
            c(0.0, 0.0)
        }
    });
    LocalOp::new("S+", matrix)
}

pub fn spin_minus(twice_s: usize) -> LocalOp {
    LocalOp::new("S-", tn::linalg::adjoint(&spin_plus(twice_s).matrix))
}

/// Fermion annihilation `c`, `c|1⟩ = |0⟩`.
pub fn annihilate() -> LocalOp {
    LocalOp::fermion(
        "c",
        from_rows(&[vec![c(0.0, 0.0), c(1.0, 0.0)], vec![c(0.0, 0.0), c(0.0, 0.0)]]),
    )
}

pub fn create() -> LocalOp {
    LocalOp::fermion(
        "c+",
        from_rows(&[vec![c(0.0, 0.0), c(0.0, 0.0)], vec![c(1.0, 0.0), c(0.0, 0.0)]]),
    )
}

pub fn number() -> LocalOp {
    LocalOp::new("n", diag(&[0.0, 1.0]))
}

pub fn fermion_parity() -> LocalOp {
    LocalOp::new("P", diag(&[1.0, -1.0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tn::linalg::{matmul, add, scale};

    fn close(a: &Mat<C64>, b: &Mat<C64>) -> bool {
        (0..a.nrows()).all(|i| (0..a.ncols()).all(|j| (a.read(i, j) - b.read(i, j)).norm() < 1e-12))
    }

    #[test]
    fn spin_half_matches_pauli() {
        let sz = spin_z(1).matrix;
        assert!(close(&scale(&pauli_z().matrix, c(0.5, 0.0)), &sz));
        let sx = scale(&add(&spin_plus(1).matrix, &spin_minus(1).matrix), c(0.5, 0.0));
        assert!(close(&scale(&pauli_x().matrix, c(0.5, 0.0)), &sx));
    }

    #[test]
    fn spin_one_commutator() {
        // [S+, S-] = 2 Sz
        let p = spin_plus(2).matrix;
        let m = spin_minus(2).matrix;
        let comm = add(&matmul(&p, &m), &scale(&matmul(&m, &p), c(-1.0, 0.0)));
        assert!(close(&comm, &scale(&spin_z(2).matrix, c(2.0, 0.0))));
    }

    #[test]
    fn fermion_algebra() {
        let cm = annihilate().matrix;
        let cp = create().matrix;
        let anti = add(&matmul(&cm, &cp), &matmul(&cp, &cm));
        assert!(close(&anti, &eye(2)));
        assert!(close(&matmul(&cp, &cm), &number().matrix));
        assert_eq!(SiteSpace::spinless_fermion().odd(1), 1);
        assert_eq!(SiteSpace::spin(2).odd(1), 0);
    }
}
