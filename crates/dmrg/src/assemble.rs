//! Canonical MPS from the last wavefunction and the block histories.

use crate::block_generator::BlockGenerator;
use crate::config::Direction;
use crate::error::{DmrgError, Result};
use crate::predict::as_matrix;
use faer::Mat;
use tn::linalg::{adjoint, conj, matmul, thin_svd, transpose};
use tn::mps::{CanonicalMps, Tensor3, Tensor4, C64};

/// Left tensors of chain sites `0..len`.
fn left_tensors(gen: &BlockGenerator, len: usize) -> Vec<Tensor3> {
    let d = gen.space().dim;
    (0..len)
        .map(|k| {
            let u = gen.isometry(k);
            Tensor3::from_fn(gen.dim_at(k), d, gen.dim_at(k + 1), |a, s, b| u.read(a * d + s, b))
        })
        .collect()
}

/// Right tensor whose right link is the block basis of length `k`, with the
/// fermion reordering sign that brings the right block into chain order.
fn right_tensor<F>(gen: &BlockGenerator, k: usize, dl: usize, mut f: F) -> Tensor3
where
    F: FnMut(usize, usize, usize) -> C64,
{
    let space = gen.space();
    let d = space.dim;
    let odd = gen.odd_at(k);
    let fermionic = space.is_fermionic();
    Tensor3::from_fn(dl, d, gen.dim_at(k), |l, s, r| {
        let v = f(l, s, r);
        if fermionic && space.odd(s) * odd[r] == 1 {
            -v
        } else {
            v
        }
    })
}

/// Right tensors of the block frame sites `len-1 … 0` in chain order.
fn right_tensors(gen: &BlockGenerator, len: usize) -> Vec<Tensor3> {
    let d = gen.space().dim;
    (0..len)
        .rev()
        .map(|k| {
            let w = gen.isometry(k);
            right_tensor(gen, k, gen.dim_at(k + 1), |l, s, r| w.read(r * d + s, l))
        })
        .collect()
}

/// Builds the MPS at the cut of the step that produced `phi`.
///
/// `left` and `right` are that step's truncated blocks (lengths `nl + 1` and
/// `nr + 1`). Tensors are `(left link, site, right link)`, the amplitudes
/// refer to chain-ordered Fock states.
pub fn assemble(
    phi: &Tensor4,
    left: &BlockGenerator,
    right: &BlockGenerator,
    direction: Direction,
) -> Result<CanonicalMps> {
    let (Some(nl), Some(nr)) = (left.len().checked_sub(1), right.len().checked_sub(1)) else {
        return Err(DmrgError::Configuration(
            "MPS assembly needs truncated blocks".to_string(),
        ));
    };
    let d = phi.d1;
    let m = as_matrix(phi);
    let mut sites = left_tensors(left, nl);

    let (s, first_right) = match direction {
        Direction::Right => {
            let ul = left.isometry(nl);
            let proj = matmul(&adjoint(&ul), &m);
            // psi[b, (s2, r)]
            let dr = phi.dr;
            let psi = Mat::from_fn(proj.nrows(), d * dr, |b, col| {
                proj.read(b, (col % dr) * d + col / dr)
            });
            let dec = thin_svd(&psi);
            let a = matmul(&ul, &dec.u);
            let k = dec.s.len();
            sites.push(Tensor3::from_fn(left.dim_at(nl), d, k, |x, s1, j| a.read(x * d + s1, j)));
            let v = dec.v;
            let b0 = right_tensor(right, nr, k, |j, s2, r| v.read(s2 * dr + r, j).conj());
            (dec.s, b0)
        }
        Direction::Left => {
            let wr = right.isometry(nr);
            let psi = matmul(&m, &conj(&wr));
            let dec = thin_svd(&psi);
            let k = dec.s.len();
            let u = dec.u;
            sites.push(Tensor3::from_fn(left.dim_at(nl), d, k, |x, s1, j| u.read(x * d + s1, j)));
            let t = matmul(&adjoint(&dec.v), &transpose(&wr));
            let b0 = right_tensor(right, nr, k, |j, s2, r| t.read(j, r * d + s2));
            (dec.s, b0)
        }
    };

    let mut rights = vec![first_right];
    rights.extend(right_tensors(right, nr));
    Ok(CanonicalMps {
        left: sites,
        s,
        right: rights,
    })
}
