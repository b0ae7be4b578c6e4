//! Iterative eigensolver for the lowest eigenpairs of a Hermitian operator.
//!
//! Thick-restart Lanczos with full reorthogonalization. The operator is only
//! touched through matrix-vector products, so the superblock Hamiltonian never
//! has to be materialized.

use crate::error::{LinalgError, Result};
use crate::linalg::{dot, eigh, norm};
use crate::mps::C64;
use faer::Mat;
use log::debug;
use rng::ShakeRng;

/// Lowest eigenpairs in ascending order.
#[derive(Clone, Debug)]
pub struct Eigenpairs {
    pub values: Vec<f64>,
    pub vectors: Vec<Vec<C64>>,
}

impl Eigenpairs {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keeps the first `k` pairs.
    pub fn truncate(&mut self, k: usize) {
        self.values.truncate(k);
        self.vectors.truncate(k);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LanczosOptions {
    /// Residual tolerance, relative to `max(1, |θ|)`.
    pub tol: f64,
    /// Budget of operator applications.
    pub max_matvec: usize,
    /// Size of the search space before a restart.
    pub max_krylov: usize,
}

impl Default for LanczosOptions {
    fn default() -> Self {
        Self {
            tol: 1e-9,
            max_matvec: 5000,
            max_krylov: 64,
        }
    }
}

struct Krylov {
    basis: Vec<Vec<C64>>,
    images: Vec<Vec<C64>>,
    matvecs: usize,
}

impl Krylov {
    /// Orthonormalizes `w` against the basis and appends it with its image.
    ///
    /// Returns `false` when `w` has no component outside the basis.
    fn push<F>(&mut self, mut w: Vec<C64>, apply: &mut F) -> bool
    where
        F: FnMut(&[C64]) -> Vec<C64>,
    {
        let start = norm(&w);
        if start == 0.0 {
            return false;
        }
        // two passes of Gram-Schmidt
        for _ in 0..2 {
            for q in &self.basis {
                let c = dot(q, &w);
                for (wi, qi) in w.iter_mut().zip(q) {
                    *wi -= c * qi;
                }
            }
        }
        let nrm = norm(&w);
        if nrm <= 1e-10 * start {
            return false;
        }
        for wi in w.iter_mut() {
            *wi /= nrm;
        }
        let hw = apply(&w);
        self.matvecs += 1;
        self.basis.push(w);
        self.images.push(hw);
        true
    }

    fn push_random<F>(&mut self, dim: usize, apply: &mut F, rng: &mut ShakeRng) -> bool
    where
        F: FnMut(&[C64]) -> Vec<C64>,
    {
        for _ in 0..4 {
            let v: Vec<C64> = rng
                .uniform_vector(dim, b"LANCZOS_REFILL")
                .into_iter()
                .map(|x| C64::new(x - 0.5, 0.0))
                .collect();
            if self.push(v, apply) {
                return true;
            }
        }
        false
    }
}

/// Lowest `k` eigenpairs of the Hermitian operator `apply` acting on `dim`
/// dimensional vectors, starting from `v0` (random when empty or zero).
pub fn lanczos<F>(
    mut apply: F,
    dim: usize,
    k: usize,
    v0: &[C64],
    opts: &LanczosOptions,
    rng: &mut ShakeRng,
) -> Result<Eigenpairs>
where
    F: FnMut(&[C64]) -> Vec<C64>,
{
    let k = k.min(dim);
    if k == 0 {
        return Ok(Eigenpairs {
            values: Vec::new(),
            vectors: Vec::new(),
        });
    }
    if !v0.is_empty() && v0.len() != dim {
        return Err(LinalgError::DimensionMismatch {
            message: format!("start vector of length {} for dimension {}", v0.len(), dim),
        });
    }

    let ncv = opts.max_krylov.max(2 * k + 1).min(dim);
    let mut kry = Krylov {
        basis: Vec::with_capacity(ncv),
        images: Vec::with_capacity(ncv),
        matvecs: 0,
    };

    if (v0.is_empty() || !kry.push(v0.to_vec(), &mut apply))
        && !kry.push_random(dim, &mut apply, rng)
    {
        return Err(LinalgError::ConvergenceFailure {
            requested: k,
            matvecs: kry.matvecs,
        });
    }

    loop {
        // grow the search space by repeated application of the operator
        while kry.basis.len() < ncv {
            let next = kry.images[kry.images.len() - 1].clone();
            if !kry.push(next, &mut apply) && !kry.push_random(dim, &mut apply, rng) {
                break;
            }
        }

        // Rayleigh-Ritz on the current search space
        let m = kry.basis.len();
        let t = Mat::from_fn(m, m, |i, j| {
            let a = dot(&kry.basis[i], &kry.images[j]);
            let b = dot(&kry.basis[j], &kry.images[i]).conj();
            (a + b) * 0.5
        });
        let (theta, y) = eigh(&t)?;

        let combine = |vs: &[Vec<C64>], col: usize| -> Vec<C64> {
            let mut out = vec![C64::new(0.0, 0.0); dim];
            for (i, v) in vs.iter().enumerate() {
                let c = y.read(i, col);
                for (o, x) in out.iter_mut().zip(v) {
                    *o += c * x;
                }
            }
            out
        };

        let nkeep = (k + 1).max(ncv / 2).min(m);
        let mut ritz = Vec::with_capacity(nkeep);
        let mut ritz_images = Vec::with_capacity(nkeep);
        let mut residuals = Vec::with_capacity(nkeep);
        for j in 0..nkeep {
            let x = combine(&kry.basis, j);
            let hx = combine(&kry.images, j);
            let r: Vec<C64> = hx.iter().zip(&x).map(|(h, v)| *h - *v * theta[j]).collect();
            ritz.push(x);
            ritz_images.push(hx);
            residuals.push(r);
        }

        let exhausted = m == dim;
        let worst = (0..k.min(m))
            .map(|j| norm(&residuals[j]) / theta[j].abs().max(1.0))
            .fold(0.0f64, f64::max);

        if exhausted || (m >= k && worst <= opts.tol) {
            debug!(
                "lanczos: {} pairs after {} matvecs (residual {:.2e})",
                k, kry.matvecs, worst
            );
            ritz.truncate(k);
            return Ok(Eigenpairs {
                values: theta[..k].to_vec(),
                vectors: ritz,
            });
        }

        if kry.matvecs >= opts.max_matvec || m < k {
            return Err(LinalgError::ConvergenceFailure {
                requested: k,
                matvecs: kry.matvecs,
            });
        }

        // thick restart: keep the lowest Ritz vectors and continue along the
        // residual of the least converged wanted one
        let lagging = (0..k.min(m))
            .max_by(|&a, &b| norm(&residuals[a]).total_cmp(&norm(&residuals[b])))
            .unwrap_or(0);
        let restart = residuals.swap_remove(lagging);
        kry.basis = ritz;
        kry.images = ritz_images;
        if !kry.push(restart, &mut apply) {
            kry.push_random(dim, &mut apply, rng);
        }
    }
}
