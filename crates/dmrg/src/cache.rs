use crate::block_generator::BlockGenerator;
use crate::error::{DmrgError, Result};
use std::collections::BTreeMap;

/// Side of the superblock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Blocks entering one step.
///
/// `Shared` is a single generator playing both roles: it is expanded and
/// truncated once.
#[derive(Clone, Debug)]
pub enum BlockPair {
    Shared(BlockGenerator),
    Distinct(BlockGenerator, BlockGenerator),
}

impl BlockPair {
    pub fn left(&self) -> &BlockGenerator {
        match self {
            BlockPair::Shared(g) => g,
            BlockPair::Distinct(l, _) => l,
        }
    }

    pub fn right(&self) -> &BlockGenerator {
        match self {
            BlockPair::Shared(g) => g,
            BlockPair::Distinct(_, r) => r,
        }
    }

    /// Sites covered once both blocks are expanded.
    pub fn window(&self) -> usize {
        self.left().len() + self.right().len() + 2
    }

    pub fn into_left(self) -> BlockGenerator {
        match self {
            BlockPair::Shared(g) => g,
            BlockPair::Distinct(l, _) => l,
        }
    }
}

/// Most recently truncated block of every length, one map per side.
///
/// Under reflection symmetry the right side is served by the left map.
#[derive(Clone, Debug)]
pub struct BlockCache {
    left: BTreeMap<usize, BlockGenerator>,
    right: BTreeMap<usize, BlockGenerator>,
    reflect: bool,
}

impl BlockCache {
    pub fn new(initial: &BlockGenerator, reflect: bool) -> Self {
        let mut left = BTreeMap::new();
        let mut right = BTreeMap::new();
        left.insert(initial.len(), initial.clone());
        right.insert(initial.len(), initial.clone());
        Self {
            left,
            right,
            reflect,
        }
    }

    fn map(&self, side: Side) -> &BTreeMap<usize, BlockGenerator> {
        if side == Side::Left || self.reflect {
            &self.left
        } else {
            &self.right
        }
    }

    /// A copy of the cached block of `length`.
    pub fn query(&self, side: Side, length: usize) -> Result<BlockGenerator> {
        self.map(side).get(&length).cloned().ok_or_else(|| {
            DmrgError::Configuration(format!(
                "no cached {:?} block of length {}",
                side, length
            ))
        })
    }

    pub fn contains(&self, side: Side, length: usize) -> bool {
        self.map(side).contains_key(&length)
    }

    /// Replaces the entry of the block's length.
    pub fn set(&mut self, side: Side, gen: BlockGenerator) {
        let map = if side == Side::Left || self.reflect {
            &mut self.left
        } else {
            &mut self.right
        };
        map.insert(gen.len(), gen);
    }
}
