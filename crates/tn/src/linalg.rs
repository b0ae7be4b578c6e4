//! Dense linear algebra on `faer` matrices.

use crate::error::{LinalgError, Result};
use crate::mps::C64;
use faer::{Mat, Side};

const ZERO: C64 = C64 { re: 0.0, im: 0.0 };
const ONE: C64 = C64 { re: 1.0, im: 0.0 };

pub fn zeros(nrows: usize, ncols: usize) -> Mat<C64> {
    Mat::from_fn(nrows, ncols, |_, _| ZERO)
}

pub fn identity(n: usize) -> Mat<C64> {
    Mat::from_fn(n, n, |i, j| if i == j { ONE } else { ZERO })
}

pub fn from_rows(rows: &[Vec<C64>]) -> Mat<C64> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, |r| r.len());
    Mat::from_fn(nrows, ncols, |i, j| rows[i][j])
}

pub fn diag(values: &[f64]) -> Mat<C64> {
    let n = values.len();
    Mat::from_fn(n, n, |i, j| if i == j { C64::new(values[i], 0.0) } else { ZERO })
}

/// Conjugate transpose.
pub fn adjoint(a: &Mat<C64>) -> Mat<C64> {
    Mat::from_fn(a.ncols(), a.nrows(), |i, j| a.read(j, i).conj())
}

pub fn transpose(a: &Mat<C64>) -> Mat<C64> {
    Mat::from_fn(a.ncols(), a.nrows(), |i, j| a.read(j, i))
}

pub fn conj(a: &Mat<C64>) -> Mat<C64> {
    Mat::from_fn(a.nrows(), a.ncols(), |i, j| a.read(i, j).conj())
}

pub fn scale(a: &Mat<C64>, c: C64) -> Mat<C64> {
    Mat::from_fn(a.nrows(), a.ncols(), |i, j| a.read(i, j) * c)
}

pub fn add(a: &Mat<C64>, b: &Mat<C64>) -> Mat<C64> {
    Mat::from_fn(a.nrows(), a.ncols(), |i, j| a.read(i, j) + b.read(i, j))
}

pub fn matmul(a: &Mat<C64>, b: &Mat<C64>) -> Mat<C64> {
    if a.nrows() == 0 || b.ncols() == 0 || a.ncols() == 0 {
        return zeros(a.nrows(), b.ncols());
    }
    a * b
}

/// Kronecker product, `(a ⊗ b)[(i k), (j l)] = a[i j] b[k l]`.
pub fn kron(a: &Mat<C64>, b: &Mat<C64>) -> Mat<C64> {
    let (br, bc) = (b.nrows(), b.ncols());
    Mat::from_fn(a.nrows() * br, a.ncols() * bc, |row, col| {
        a.read(row / br, col / bc) * b.read(row % br, col % bc)
    })
}

/// Projection `u† o u` of an operator onto the column space of `u`.
pub fn project(u: &Mat<C64>, o: &Mat<C64>) -> Mat<C64> {
    matmul(&adjoint(u), &matmul(o, u))
}

/// Keeps the listed columns.
pub fn select_columns(a: &Mat<C64>, cols: &[usize]) -> Mat<C64> {
    Mat::from_fn(a.nrows(), cols.len(), |i, j| a.read(i, cols[j]))
}

/// Submatrix on the given row and column index sets.
pub fn submatrix(a: &Mat<C64>, rows: &[usize], cols: &[usize]) -> Mat<C64> {
    Mat::from_fn(rows.len(), cols.len(), |i, j| a.read(rows[i], cols[j]))
}

/// Hermitian eigendecomposition with eigenvalues in ascending order.
///
/// Returns the eigenvalues and a matrix whose columns are the eigenvectors.
pub fn eigh(a: &Mat<C64>) -> Result<(Vec<f64>, Mat<C64>)> {
    if a.nrows() != a.ncols() {
        return Err(LinalgError::DimensionMismatch {
            message: format!("eigh of a {}x{} matrix", a.nrows(), a.ncols()),
        });
    }
    let n = a.nrows();
    if n == 0 {
        return Ok((Vec::new(), zeros(0, 0)));
    }

    let eig = a.selfadjoint_eigendecomposition(Side::Lower);
    let s = eig.s().column_vector();
    let u = eig.u();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| s.read(i).re.total_cmp(&s.read(j).re));

    let values = order.iter().map(|&i| s.read(i).re).collect();
    let vectors = Mat::from_fn(n, n, |i, j| u.read(i, order[j]));
    Ok((values, vectors))
}

/// Full singular value decomposition `a = u · diag(s) · v†`.
#[derive(Clone, Debug)]
pub struct Svd {
    /// `m × m` unitary.
    pub u: Mat<C64>,
    /// `min(m, n)` singular values in descending order.
    pub s: Vec<f64>,
    /// `n × n` unitary.
    pub v: Mat<C64>,
}

pub fn svd(a: &Mat<C64>) -> Svd {
    let (m, n) = (a.nrows(), a.ncols());
    if m == 0 || n == 0 {
        return Svd {
            u: identity(m),
            s: Vec::new(),
            v: identity(n),
        };
    }

    let dec = a.svd();
    let sd = dec.s_diagonal();
    let k = m.min(n);

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&i, &j| sd.read(j).re.total_cmp(&sd.read(i).re));

    let (u_raw, v_raw) = (dec.u(), dec.v());
    let permute = |col: usize| if col < k { order[col] } else { col };
    Svd {
        u: Mat::from_fn(m, m, |i, j| u_raw.read(i, permute(j))),
        s: order.iter().map(|&i| sd.read(i).re).collect(),
        v: Mat::from_fn(n, n, |i, j| v_raw.read(i, permute(j))),
    }
}

/// Thin SVD, `u` is `m × k` and `v` is `n × k` with `k = min(m, n)`.
pub fn thin_svd(a: &Mat<C64>) -> Svd {
    let (m, n) = (a.nrows(), a.ncols());
    let k = m.min(n);
    let full = svd(a);
    Svd {
        u: Mat::from_fn(m, k, |i, j| full.u.read(i, j)),
        s: full.s,
        v: Mat::from_fn(n, k, |i, j| full.v.read(i, j)),
    }
}

/// `Σ conj(a_i) b_i`.
pub fn dot(a: &[C64], b: &[C64]) -> C64 {
    a.iter().zip(b).map(|(x, y)| x.conj() * y).sum()
}

pub fn norm(a: &[C64]) -> f64 {
    a.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt()
}
