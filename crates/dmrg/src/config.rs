use crate::error::{DmrgError, Result};
use quantum::BlockLabeling;
use std::collections::BTreeMap;
use std::fmt;
use tn::block_marker::Label;

pub use tn::truncation::Truncation;

/// Scan direction of a finite sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// `->`, the left block grows.
    Right,
    /// `<-`, the right block grows.
    Left,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Right => write!(f, "->"),
            Direction::Left => write!(f, "<-"),
        }
    }
}

/// How the kept basis is extracted from the ground state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TruncationStrategy {
    /// Block-wise SVD of the wavefunction matrix.
    #[default]
    Svd,
    /// Eigendecomposition of the reduced density matrices.
    DensityMatrix,
}

/// Target quantum-number sector of the superblock.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SectorRule {
    #[default]
    None,
    /// Fixed value per conserved quantity.
    Fixed(BTreeMap<String, i32>),
    /// `num * nsite / den` per conserved quantity, e.g. half filling as `(1, 2)`.
    PerSite(BTreeMap<String, (i32, i32)>),
}

impl SectorRule {
    pub fn is_none(&self) -> bool {
        matches!(self, SectorRule::None)
    }

    fn names(&self) -> Vec<&str> {
        match self {
            SectorRule::None => Vec::new(),
            SectorRule::Fixed(m) => m.keys().map(String::as_str).collect(),
            SectorRule::PerSite(m) => m.keys().map(String::as_str).collect(),
        }
    }

    /// Checks that the rule names exactly the quantities of `labeling`.
    pub fn validate(&self, labeling: &BlockLabeling) -> Result<()> {
        for name in self.names() {
            if !labeling.names.iter().any(|n| n == name) {
                return Err(DmrgError::Configuration(format!(
                    "target sector names unknown quantity `{}` (labeling has {:?})",
                    name, labeling.names
                )));
            }
        }
        if !self.is_none() && self.names().len() != labeling.nqn() {
            return Err(DmrgError::Configuration(format!(
                "target sector must fix every quantity of {:?}",
                labeling.names
            )));
        }
        if let SectorRule::PerSite(m) = self {
            if let Some((name, _)) = m.iter().find(|(_, (_, den))| *den == 0) {
                return Err(DmrgError::Configuration(format!(
                    "zero denominator in the target of `{}`",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Target label for a system of `nsite` sites, in labeling order.
    pub fn resolve(&self, labeling: &BlockLabeling, nsite: usize) -> Option<Label> {
        let value = |name: &String| -> i32 {
            match self {
                SectorRule::None => 0,
                SectorRule::Fixed(m) => m.get(name).copied().unwrap_or(0),
                SectorRule::PerSite(m) => m
                    .get(name)
                    .map(|&(num, den)| num * nsite as i32 / den)
                    .unwrap_or(0),
            }
        };
        match self {
            SectorRule::None => None,
            _ => Some(labeling.names.iter().map(value).collect()),
        }
    }
}

/// Per-step options of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockParams {
    /// Number of lowest levels targeted together.
    pub nlevel: usize,
    pub target_sector: SectorRule,
    /// Requested reflection parity, `+1` or `-1`.
    pub parity: Option<i8>,
    /// Candidates inspected when selecting the parity. Defaults to 2 for
    /// finite and 3 for infinite runs.
    pub c_detect_scope: Option<usize>,
    pub strategy: TruncationStrategy,
}

impl Default for BlockParams {
    fn default() -> Self {
        Self {
            nlevel: 1,
            target_sector: SectorRule::None,
            parity: None,
            c_detect_scope: None,
            strategy: TruncationStrategy::Svd,
        }
    }
}

/// Where a finite run stops: after `pass` passes, at `site` while scanning
/// in `direction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub pass: usize,
    pub direction: Direction,
    pub site: usize,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            pass: 4,
            direction: Direction::Left,
            site: 0,
        }
    }
}
