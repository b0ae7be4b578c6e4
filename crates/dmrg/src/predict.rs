//! Warm-start guess for the next sweep step (PRL 77, 3633).

use crate::block_generator::BlockGenerator;
use crate::config::Direction;
use crate::error::{DmrgError, Result};
use faer::Mat;
use tn::linalg::{adjoint, conj, matmul, transpose};
use tn::mps::{Tensor4, C64};

pub(crate) fn as_matrix(phi: &Tensor4) -> Mat<C64> {
    let cols = phi.right_dim();
    Mat::from_fn(phi.left_dim(), cols, |x, y| phi.data[x * cols + y])
}

/// Moves `phi[a, s1, r, s2]` one site in `direction`.
///
/// `left` and `right` are the blocks truncated in the step that produced
/// `phi`, of lengths `nl + 1` and `nr + 1`.
///
/// `->`: `phi'[b, s2, a', s3] = Σ conj(UL[(a s1), b]) phi[a, s1, r, s2] WR[(a' s3), r]`
/// with `UL` the new left isometry and `WR` the right one from `nr - 1` to `nr`.
///
/// `<-`: `phi'[a', s0, b, s1] = Σ AL[(a' s0), a] phi[a, s1, r, s2] conj(WR[(r s2), b])`
/// with `AL` the left isometry from `nl - 1` to `nl` and `WR` the new right one.
pub fn predict(
    phi: &Tensor4,
    left: &BlockGenerator,
    right: &BlockGenerator,
    direction: Direction,
) -> Result<Tensor4> {
    let d = phi.d1;
    let nl = left.len().checked_sub(1);
    let nr = right.len().checked_sub(1);
    let (Some(nl), Some(nr)) = (nl, nr) else {
        return Err(DmrgError::Configuration(
            "prediction needs truncated blocks".to_string(),
        ));
    };
    let fermionic = left.space().is_fermionic();
    let site_odd: Vec<usize> = (0..d).map(|s| left.space().odd(s)).collect();
    let m = as_matrix(phi);

    match direction {
        Direction::Right => {
            if nr == 0 {
                return Err(DmrgError::Configuration(
                    "no right block left to move into".to_string(),
                ));
            }
            let ul = left.isometry(nl);
            let wr = right.isometry(nr - 1);
            let nb = ul.ncols();
            let na = right.dim_at(nr - 1);

            let m1 = matmul(&adjoint(&ul), &m);
            let t2 = Mat::from_fn(nb * d, phi.dr, |row, r| m1.read(row / d, r * d + row % d));
            let out = matmul(&t2, &transpose(&wr));

            let odd_a = right.odd_at(nr - 1);
            let mut next = Tensor4::zeros(nb, d, na, d);
            for b in 0..nb {
                for s2 in 0..d {
                    for a in 0..na {
                        for s3 in 0..d {
                            let mut v = out.read(b * d + s2, a * d + s3);
                            if fermionic && site_odd[s2] * (odd_a[a] + site_odd[s3]) % 2 == 1 {
                                v = -v;
                            }
                            next.set(b, s2, a, s3, v);
                        }
                    }
                }
            }
            Ok(next)
        }
        Direction::Left => {
            if nl == 0 {
                return Err(DmrgError::Configuration(
                    "no left block left to move into".to_string(),
                ));
            }
            let al = left.isometry(nl - 1);
            let wr = right.isometry(nr);
            let nb = wr.ncols();
            let na = left.dim_at(nl - 1);

            let mb = matmul(&m, &conj(&wr));
            let m2 = Mat::from_fn(phi.dl, d * nb, |a, col| mb.read(a * d + col / nb, col % nb));
            let out = matmul(&al, &m2);

            let odd_b = right.odd_at(nr + 1);
            let mut next = Tensor4::zeros(na, d, nb, d);
            for a in 0..na {
                for s0 in 0..d {
                    for b in 0..nb {
                        for s1 in 0..d {
                            let mut v = out.read(a * d + s0, s1 * nb + b);
                            if fermionic && site_odd[s1] * odd_b[b] == 1 {
                                v = -v;
                            }
                            next.set(a, s0, b, s1, v);
                        }
                    }
                }
            }
            Ok(next)
        }
    }
}
