//! Quantum-number labels of a basis and the block structure they induce.

use crate::mps::C64;
use faer::Mat;
use std::collections::BTreeMap;
use std::ops::Range;

/// One value per conserved quantity.
pub type Label = Vec<i32>;

pub fn label_add(a: &[i32], b: &[i32]) -> Label {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

pub fn label_sub(a: &[i32], b: &[i32]) -> Label {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Labels of every basis vector of a space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockMarker {
    labels: Vec<Label>,
}

impl BlockMarker {
    pub fn new(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    /// Marker of a one-dimensional space with all quantities zero.
    pub fn vacuum(nqn: usize) -> Self {
        Self {
            labels: vec![vec![0; nqn]],
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn label(&self, i: usize) -> &Label {
        &self.labels[i]
    }

    /// Marker of the product space `self ⊗ other`, index `i * other.len() + j`.
    pub fn kron(&self, other: &BlockMarker) -> BlockMarker {
        let mut labels = Vec::with_capacity(self.len() * other.len());
        for a in &self.labels {
            for b in &other.labels {
                labels.push(label_add(a, b));
            }
        }
        BlockMarker { labels }
    }

    /// Keeps the entries whose mask is set.
    pub fn select(&self, keep: &[usize]) -> BlockMarker {
        BlockMarker {
            labels: keep.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }

    /// Stable ordering of the basis by label: `perm[k]` is the original index
    /// placed at blockized position `k`.
    pub fn permutation(&self) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..self.len()).collect();
        perm.sort_by(|&i, &j| self.labels[i].cmp(&self.labels[j]));
        perm
    }

    /// Label ranges in blockized order.
    pub fn blocks(&self) -> Vec<(Label, Range<usize>)> {
        let perm = self.permutation();
        let mut out: Vec<(Label, Range<usize>)> = Vec::new();
        for (k, &i) in perm.iter().enumerate() {
            let extends = out
                .last()
                .map_or(false, |(label, _)| *label == self.labels[i]);
            if extends {
                if let Some((_, range)) = out.last_mut() {
                    range.end = k + 1;
                }
            } else {
                out.push((self.labels[i].clone(), k..k + 1));
            }
        }
        out
    }

    /// Original indices grouped by label.
    pub fn groups(&self) -> BTreeMap<Label, Vec<usize>> {
        let mut out: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
        for (i, l) in self.labels.iter().enumerate() {
            out.entry(l.clone()).or_default().push(i);
        }
        out
    }

    /// Original indices carrying `label`.
    pub fn extract_block(&self, label: &[i32]) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.as_slice() == label)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn blockize_vec(&self, v: &[C64]) -> Vec<C64> {
        self.permutation().iter().map(|&i| v[i]).collect()
    }

    pub fn antiblockize_vec(&self, v: &[C64]) -> Vec<C64> {
        let mut out = vec![C64::new(0.0, 0.0); v.len()];
        for (k, &i) in self.permutation().iter().enumerate() {
            out[i] = v[k];
        }
        out
    }

    /// Reorders rows and columns of a square matrix into blockized order.
    pub fn blockize_mat(&self, m: &Mat<C64>) -> Mat<C64> {
        let perm = self.permutation();
        Mat::from_fn(m.nrows(), m.ncols(), |i, j| m.read(perm[i], perm[j]))
    }

    pub fn antiblockize_mat(&self, m: &Mat<C64>) -> Mat<C64> {
        let perm = self.permutation();
        let mut inv = vec![0usize; perm.len()];
        for (k, &i) in perm.iter().enumerate() {
            inv[i] = k;
        }
        Mat::from_fn(m.nrows(), m.ncols(), |i, j| m.read(inv[i], inv[j]))
    }

    /// Checks that `m` (in original order) couples only equal labels.
    ///
    /// Returns the largest offending magnitude on failure.
    pub fn check_blockdiag(&self, m: &Mat<C64>, tol: f64) -> Result<(), f64> {
        let mut worst = 0.0f64;
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                if self.labels[i] != self.labels[j] {
                    worst = worst.max(m.read(i, j).norm());
                }
            }
        }
        if worst > tol {
            Err(worst)
        } else {
            Ok(())
        }
    }
}
