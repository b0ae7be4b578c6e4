//! A growing block of sites and its renormalized Hamiltonian.

use crate::error::{DmrgError, Result};
use faer::Mat;
use quantum::{OpString, SiteSpace};
use std::collections::BTreeMap;
use tn::block_marker::{BlockMarker, Label};
use tn::linalg::{add, diag, identity, kron, project, scale, zeros};
use tn::C64;

/// How the block basis evolves when a site is added.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evolutor {
    /// The full product basis is kept, no truncation ever happens.
    Null,
    /// The basis is rotated and cut by an isometry after every expansion.
    Isometric,
}

/// Hamiltonian generator of a block of `n` sites.
///
/// The block lives in its own frame: sites are numbered `0..n` in the order
/// they were added. `history[k]` maps the expanded basis of length `k`
/// (`dims[k] * d` states, block index major) onto the basis of length `k+1`,
/// `None` standing for the identity.
#[derive(Clone, Debug)]
pub struct BlockGenerator {
    space: SiteSpace,
    evolutor: Evolutor,
    n: usize,
    dims: Vec<usize>,
    history: Vec<Option<Mat<C64>>>,
    /// Fermion parity of the basis, one entry per block length.
    parity: Vec<Vec<i8>>,
    hamiltonian: Mat<C64>,
    marker: Option<BlockMarker>,
    expanded: bool,
}

impl BlockGenerator {
    /// Empty block (`n = 0`, one-dimensional vacuum basis).
    pub fn new(space: SiteSpace, evolutor: Evolutor) -> Self {
        Self {
            space,
            evolutor,
            n: 0,
            dims: vec![1],
            history: Vec::new(),
            parity: vec![vec![1]],
            hamiltonian: zeros(1, 1),
            marker: None,
            expanded: false,
        }
    }

    /// Attaches quantum-number labels to the (empty) block basis.
    pub fn with_marker(mut self, marker: BlockMarker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn space(&self) -> &SiteSpace {
        &self.space
    }

    pub fn evolutor(&self) -> Evolutor {
        self.evolutor
    }

    /// Dimension of the current basis (expanded or not).
    pub fn ndim(&self) -> usize {
        if self.expanded {
            self.dims[self.n] * self.space.dim
        } else {
            self.dims[self.n]
        }
    }

    /// Basis dimension of the block of length `k`.
    pub fn dim_at(&self, k: usize) -> usize {
        self.dims[k]
    }

    pub fn hamiltonian(&self) -> &Mat<C64> {
        &self.hamiltonian
    }

    pub fn marker(&self) -> Option<&BlockMarker> {
        self.marker.as_ref()
    }

    /// Labels of the expanded basis, index `a * d + s`.
    pub fn expanded_marker(&self, site: &BlockMarker) -> Option<BlockMarker> {
        self.marker.as_ref().map(|m| m.kron(site))
    }

    /// Fermion parity of the basis of length `k`.
    pub fn parity_at(&self, k: usize) -> &[i8] {
        &self.parity[k]
    }

    /// `1` for fermion-odd states of the basis of length `k`.
    pub fn odd_at(&self, k: usize) -> Vec<usize> {
        self.parity[k].iter().map(|&p| usize::from(p < 0)).collect()
    }

    /// Parity of the expanded basis.
    pub fn expanded_parity(&self) -> Vec<i8> {
        let d = self.space.dim;
        let block = &self.parity[self.n];
        let mut out = Vec::with_capacity(block.len() * d);
        for &pa in block {
            for s in 0..d {
                let ps = if self.space.odd(s) == 1 { -1 } else { 1 };
                out.push(pa * ps);
            }
        }
        out
    }

    /// Isometry from length `k` to `k+1` as a dense matrix.
    pub fn isometry(&self, k: usize) -> Mat<C64> {
        match &self.history[k] {
            Some(u) => u.clone(),
            None => identity(self.dims[k] * self.space.dim),
        }
    }

    /// Adds one site. `ops` are the terms, in the block frame, that touch the
    /// new site `n` and no site beyond it.
    pub fn expand(&mut self, ops: &[OpString]) -> Result<&Mat<C64>> {
        if self.expanded {
            return Err(DmrgError::Configuration(format!(
                "block of length {} expanded twice without truncation",
                self.n
            )));
        }
        let d = self.space.dim;
        let order: Vec<usize> = (0..=self.n).collect();
        self.expanded = true;

        let mut h = kron(&self.hamiltonian, &identity(d));
        for op in ops {
            if op.max_site() != Some(self.n) {
                return Err(DmrgError::Configuration(format!(
                    "term on sites {:?} does not end on the new site {}",
                    op.sites(),
                    self.n
                )));
            }
            let factors = op.expand(&order, &self.space);
            h = add(&h, &scale(&self.image(&factors), op.coeff));
        }
        self.hamiltonian = h;
        Ok(&self.hamiltonian)
    }

    /// Matrix of `⊗_k factors[k]` on the expanded basis, built by walking the
    /// isometry history. Missing sites carry the identity.
    pub fn image(&self, factors: &BTreeMap<usize, Mat<C64>>) -> Mat<C64> {
        let d = self.space.dim;
        let n = self.n;
        let site_op = |k: usize| factors.get(&k).cloned().unwrap_or_else(|| identity(d));

        let first = match factors.keys().next() {
            Some(&k) => k.min(n),
            None => return identity(self.dims[n] * d),
        };

        // a leading run of parity factors is diagonal in every block basis
        let parity = self.space.parity_matrix();
        let mut start = first;
        let mut op = identity(self.dims[first]);
        if self.space.is_fermionic() {
            let run = (0..n)
                .take_while(|k| factors.get(k).map_or(false, |m| same(m, &parity)))
                .count();
            if run > 0 {
                let p: Vec<f64> = self.parity[run].iter().map(|&x| x as f64).collect();
                op = diag(&p);
                start = run;
            }
        }

        for k in start..n {
            op = kron(&op, &site_op(k));
            if let Some(u) = &self.history[k] {
                op = project(u, &op);
            }
        }
        kron(&op, &site_op(n))
    }

    /// Replaces the expanded basis by the columns of `u`.
    ///
    /// `labels` are the labels of the new basis when the block is labeled. A
    /// null evolutor ignores `u` and keeps the full product basis, its labels
    /// are then those of the expanded basis.
    pub fn truncate(&mut self, u: &Mat<C64>, labels: Option<Vec<Label>>) -> Result<()> {
        if !self.expanded {
            return Err(DmrgError::Configuration(format!(
                "truncation of block of length {} before expansion",
                self.n
            )));
        }
        let exp_parity = self.expanded_parity();
        let ndim = self.ndim();

        match self.evolutor {
            Evolutor::Null => {
                self.marker = labels.map(BlockMarker::new);
                self.history.push(None);
                self.parity.push(exp_parity);
                self.dims.push(ndim);
            }
            Evolutor::Isometric => {
                if u.nrows() != ndim {
                    return Err(DmrgError::Configuration(format!(
                        "isometry with {} rows for an expanded basis of {}",
                        u.nrows(),
                        ndim
                    )));
                }
                let kept = u.ncols();
                let new_parity: Vec<i8> = (0..kept)
                    .map(|j| {
                        let w: f64 = (0..ndim)
                            .map(|x| u.read(x, j).norm_sqr() * exp_parity[x] as f64)
                            .sum();
                        if w < 0.0 {
                            -1
                        } else {
                            1
                        }
                    })
                    .collect();
                self.hamiltonian = project(u, &self.hamiltonian);
                self.marker = labels.map(BlockMarker::new);
                self.history.push(Some(u.clone()));
                self.parity.push(new_parity);
                self.dims.push(kept);
            }
        }
        self.n += 1;
        self.expanded = false;
        Ok(())
    }
}

fn same(a: &Mat<C64>, b: &Mat<C64>) -> bool {
    a.nrows() == b.nrows()
        && a.ncols() == b.ncols()
        && (0..a.nrows()).all(|i| (0..a.ncols()).all(|j| a.read(i, j) == b.read(i, j)))
}
