//! Reduction of the ground-state wavefunction to kept block bases.

use crate::config::TruncationStrategy;
use crate::error::{DmrgError, Result};
use faer::Mat;
use std::collections::BTreeMap;
use tn::block_marker::{BlockMarker, Label};
use tn::linalg::{
    adjoint, conj, diag, eigh, matmul, select_columns, submatrix, svd, transpose, zeros,
};
use tn::truncation::{KeepMask, Truncation, ZERO_REF};
use tn::C64;

const RDM_BLOCKDIAG_TOL: f64 = 1e-5;

/// Rotated basis of one side, before the cut.
#[derive(Clone, Debug)]
pub struct SideBasis {
    /// Square unitary, one column per candidate state.
    pub basis: Mat<C64>,
    /// Weight of each column in the reduced density matrix.
    pub weights: Vec<f64>,
    /// Label of each column, when the side is labeled.
    pub labels: Option<Vec<Label>>,
}

impl SideBasis {
    /// Kept columns and their labels.
    pub fn kept(&self, mask: &KeepMask) -> (Mat<C64>, Option<Vec<Label>>) {
        let idx = mask.kept_indices();
        let labels = self
            .labels
            .as_ref()
            .map(|l| idx.iter().map(|&i| l[i].clone()).collect());
        (select_columns(&self.basis, &idx), labels)
    }
}

/// Outcome of the truncation analysis.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub left: SideBasis,
    pub right: SideBasis,
    pub left_mask: KeepMask,
    pub right_mask: KeepMask,
}

impl Analysis {
    /// Discarded weight of the left side.
    pub fn truncation_error(&self) -> f64 {
        self.left_mask.discarded.max(0.0)
    }
}

/// Averages the retained vectors into one `ndiml × ndimr` wavefunction.
pub fn combined_wavefunction(phis: &[Vec<C64>], ndiml: usize, ndimr: usize) -> Mat<C64> {
    let norm = (phis.len().max(1) as f64).sqrt();
    Mat::from_fn(ndiml, ndimr, |x, y| {
        let v: C64 = phis.iter().map(|p| p[x * ndimr + y]).sum::<C64>() / norm;
        if v.norm() < ZERO_REF {
            C64::new(0.0, 0.0)
        } else {
            v
        }
    })
}

/// Runs the selected strategy and the keep-mask selection on both sides.
pub fn analyze(
    phi: &Mat<C64>,
    bml: Option<&BlockMarker>,
    bmr: Option<&BlockMarker>,
    trunc: &Truncation,
    strategy: TruncationStrategy,
) -> Result<Analysis> {
    let (left, right) = match strategy {
        TruncationStrategy::Svd => svd_analysis(phi, bml, bmr)?,
        TruncationStrategy::DensityMatrix => (
            rdm_analysis(&matmul(phi, &adjoint(phi)), bml)?,
            rdm_analysis(&matmul(&transpose(phi), &conj(phi)), bmr)?,
        ),
    };
    check_density(&left, bml)?;
    check_density(&right, bmr)?;

    let left_mask = trunc.keep_mask(&left.weights);
    let right_mask = trunc.keep_mask(&right.weights);
    Ok(Analysis {
        left,
        right,
        left_mask,
        right_mask,
    })
}

/// Index groups by label, or one group holding everything.
fn label_groups(bm: Option<&BlockMarker>, n: usize) -> BTreeMap<Label, Vec<usize>> {
    match bm {
        Some(m) => m.groups(),
        None => {
            let mut g = BTreeMap::new();
            g.insert(Vec::new(), (0..n).collect());
            g
        }
    }
}

/// Block-wise SVD `phi = U S V†`, the right basis is `conj(V)`.
///
/// Each connected block of the wavefunction has to pair one left label with
/// one right label. Labels without partner get zero-weight unit columns.
pub fn svd_analysis(
    phi: &Mat<C64>,
    bml: Option<&BlockMarker>,
    bmr: Option<&BlockMarker>,
) -> Result<(SideBasis, SideBasis)> {
    let (m, n) = (phi.nrows(), phi.ncols());
    let lg = label_groups(bml, m);
    let rg = label_groups(bmr, n);
    let lkeys: Vec<&Label> = lg.keys().collect();
    let rkeys: Vec<&Label> = rg.keys().collect();

    // partners of every left label
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for (li, lk) in lkeys.iter().enumerate() {
        for (ri, rk) in rkeys.iter().enumerate() {
            let block = &submatrix(phi, &lg[*lk], &rg[*rk]);
            let nonzero = (0..block.nrows())
                .any(|i| (0..block.ncols()).any(|j| block.read(i, j) != C64::new(0.0, 0.0)));
            if nonzero {
                pairs.push((li, ri));
            }
        }
    }
    for &(li, ri) in &pairs {
        let left_degree = pairs.iter().filter(|p| p.0 == li).count();
        let right_degree = pairs.iter().filter(|p| p.1 == ri).count();
        if left_degree > 1 || right_degree > 1 {
            return Err(DmrgError::SymmetryViolation(format!(
                "wavefunction couples left label {:?} and right label {:?} to several sectors",
                lkeys[li], rkeys[ri]
            )));
        }
    }

    let mut ucols: Vec<(Vec<C64>, f64, Label)> = Vec::with_capacity(m);
    let mut wcols: Vec<(Vec<C64>, f64, Label)> = Vec::with_capacity(n);
    let embed = |rows: &[usize], dim: usize, col: &dyn Fn(usize) -> C64| -> Vec<C64> {
        let mut v = vec![C64::new(0.0, 0.0); dim];
        for (k, &r) in rows.iter().enumerate() {
            v[r] = col(k);
        }
        v
    };

    for &(li, ri) in &pairs {
        let (lrows, rrows) = (&lg[lkeys[li]], &rg[rkeys[ri]]);
        let dec = svd(&submatrix(phi, lrows, rrows));
        for j in 0..lrows.len() {
            let w = dec.s.get(j).map_or(0.0, |s| s * s);
            let col = embed(lrows, m, &|k| dec.u.read(k, j));
            ucols.push((col, w, lkeys[li].clone()));
        }
        for j in 0..rrows.len() {
            let w = dec.s.get(j).map_or(0.0, |s| s * s);
            let col = embed(rrows, n, &|k| dec.v.read(k, j).conj());
            wcols.push((col, w, rkeys[ri].clone()));
        }
    }
    for (li, lk) in lkeys.iter().enumerate() {
        if !pairs.iter().any(|p| p.0 == li) {
            for &r in &lg[*lk] {
                ucols.push((unit(m, r), 0.0, (*lk).clone()));
            }
        }
    }
    for (ri, rk) in rkeys.iter().enumerate() {
        if !pairs.iter().any(|p| p.1 == ri) {
            for &r in &rg[*rk] {
                wcols.push((unit(n, r), 0.0, (*rk).clone()));
            }
        }
    }

    Ok((
        side_from_columns(ucols, m, bml.is_some()),
        side_from_columns(wcols, n, bmr.is_some()),
    ))
}

/// Eigendecomposition of a reduced density matrix, block by block.
pub fn rdm_analysis(rho: &Mat<C64>, bm: Option<&BlockMarker>) -> Result<SideBasis> {
    let dim = rho.nrows();
    if let Some(m) = bm {
        m.check_blockdiag(rho, RDM_BLOCKDIAG_TOL).map_err(|worst| {
            DmrgError::SymmetryViolation(format!(
                "reduced density matrix is not block diagonal (off-block element {:.3e}); \
                 check that the quantum numbers are additive and the ground state is not degenerate",
                worst
            ))
        })?;
    }
    let mut cols = Vec::with_capacity(dim);
    for (label, rows) in label_groups(bm, dim) {
        let (e, v) = eigh(&submatrix(rho, &rows, &rows))?;
        // descending weight inside the block
        for j in (0..rows.len()).rev() {
            let mut col = vec![C64::new(0.0, 0.0); dim];
            for (k, &r) in rows.iter().enumerate() {
                col[r] = v.read(k, j);
            }
            cols.push((col, e[j], label.clone()));
        }
    }
    Ok(side_from_columns(cols, dim, bm.is_some()))
}

fn unit(dim: usize, i: usize) -> Vec<C64> {
    let mut v = vec![C64::new(0.0, 0.0); dim];
    v[i] = C64::new(1.0, 0.0);
    v
}

fn side_from_columns(cols: Vec<(Vec<C64>, f64, Label)>, dim: usize, labeled: bool) -> SideBasis {
    let basis = Mat::from_fn(dim, cols.len(), |i, j| cols[j].0[i]);
    let weights = cols.iter().map(|c| c.1).collect();
    let labels = if labeled {
        Some(cols.into_iter().map(|c| c.2).collect())
    } else {
        None
    };
    SideBasis {
        basis,
        weights,
        labels,
    }
}

/// The density matrix rebuilt from a side basis must not mix labels.
fn check_density(side: &SideBasis, bm: Option<&BlockMarker>) -> Result<()> {
    let Some(m) = bm else {
        return Ok(());
    };
    let dim = side.basis.nrows();
    let rho = if dim == 0 {
        zeros(0, 0)
    } else {
        matmul(&matmul(&side.basis, &diag(&side.weights)), &adjoint(&side.basis))
    };
    m.check_blockdiag(&rho, 1e-8).map_err(|worst| {
        DmrgError::SymmetryViolation(format!(
            "density matrix is not block diagonal (off-block element {:.3e})",
            worst
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn c(re: f64) -> C64 {
        C64::new(re, 0.0)
    }

    fn singlet() -> Mat<C64> {
        let s = 1.0 / 2.0_f64.sqrt();
        Mat::from_fn(2, 2, |i, j| if i != j { c(if i == 0 { s } else { -s }) } else { c(0.0) })
    }

    fn half() -> BlockMarker {
        BlockMarker::new(vec![vec![1], vec![-1]])
    }

    #[test]
    fn singlet_has_two_equal_weights() {
        let (l, r) = svd_analysis(&singlet(), None, None).unwrap();
        assert!((l.weights[0] - 0.5).abs() < 1e-12);
        assert!((l.weights[1] - 0.5).abs() < 1e-12);
        assert!((r.weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn labeled_svd_pairs_opposite_spins() {
        let bm = half();
        let (l, r) = svd_analysis(&singlet(), Some(&bm), Some(&bm)).unwrap();
        let ll = l.labels.unwrap();
        let rl = r.labels.unwrap();
        assert_eq!(ll.len(), 2);
        assert_eq!(rl.len(), 2);
        // column j of each side belongs to the same Schmidt pair
        for (a, b) in ll.iter().zip(&rl) {
            assert_eq!(a[0] + b[0], 0);
        }
    }

    #[test]
    fn mixed_sectors_are_a_symmetry_violation() {
        // |up up> + |up down> pairs left label +1 with both right labels
        let phi = Mat::from_fn(2, 2, |i, _| if i == 0 { c(0.5_f64.sqrt()) } else { c(0.0) });
        let bm = half();
        let err = svd_analysis(&phi, Some(&bm), Some(&bm)).unwrap_err();
        assert!(matches!(err, DmrgError::SymmetryViolation(_)));
    }

    #[test]
    fn rdm_and_svd_agree_on_spectrum() {
        let phi = Mat::from_fn(3, 2, |i, j| c(0.1 + i as f64 * 0.3 - j as f64 * 0.2));
        let trunc = Truncation::new(4);
        let a = analyze(&phi, None, None, &trunc, TruncationStrategy::Svd).unwrap();
        let b = analyze(&phi, None, None, &trunc, TruncationStrategy::DensityMatrix).unwrap();
        let mut wa = a.left.weights.clone();
        let mut wb = b.left.weights.clone();
        wa.sort_by(|x, y| y.total_cmp(x));
        wb.sort_by(|x, y| y.total_cmp(x));
        for (x, y) in wa.iter().zip(&wb) {
            assert!((x - y).abs() < 1e-10);
        }
        assert_eq!(a.left_mask.kept(), b.left_mask.kept());
    }

    #[test]
    fn rdm_rejects_off_block_density() {
        let rho = Mat::from_fn(2, 2, |_, _| c(0.5));
        let err = rdm_analysis(&rho, Some(&half())).unwrap_err();
        assert!(matches!(err, DmrgError::SymmetryViolation(_)));
    }

    proptest! {
        #[test]
        fn kept_and_discarded_weights_sum_to_norm(
            raw in prop::collection::vec(-1.0f64..1.0, 12),
            max_bond in 1usize..5,
        ) {
            let nrm: f64 = raw.iter().map(|x| x * x).sum::<f64>().sqrt().max(1e-3);
            let phi = Mat::from_fn(4, 3, |i, j| c(raw[i * 3 + j] / nrm));
            let total: f64 = raw.iter().map(|x| (x / nrm).powi(2)).sum();
            let trunc = Truncation::new(max_bond);
            let a = analyze(&phi, None, None, &trunc, TruncationStrategy::Svd).unwrap();
            let kept: f64 = a
                .left
                .weights
                .iter()
                .zip(&a.left_mask.mask)
                .filter(|&(_, &k)| k)
                .map(|(w, _)| w)
                .sum();
            prop_assert!(a.truncation_error() >= 0.0);
            prop_assert!((kept + a.truncation_error() - total).abs() < 1e-9);
        }

        #[test]
        fn error_does_not_shrink_with_smaller_budget(
            raw in prop::collection::vec(-1.0f64..1.0, 16),
            max_bond in 2usize..5,
        ) {
            let phi = Mat::from_fn(4, 4, |i, j| c(raw[i * 4 + j]));
            let (wide, narrow) = (Truncation::new(max_bond), Truncation::new(max_bond - 1));
            let big = analyze(&phi, None, None, &wide, TruncationStrategy::Svd).unwrap();
            let small = analyze(&phi, None, None, &narrow, TruncationStrategy::Svd).unwrap();
            prop_assert!(small.truncation_error() + 1e-12 >= big.truncation_error());
        }
    }
}
