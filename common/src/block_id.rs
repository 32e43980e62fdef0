// common/src/block_id.rs
//! Identifiers for the fixed set of memory blocks a store exposes.

use core::fmt;
use crate::errors::{AdapterError, FailureReason, Operation};

/// Number of memory blocks every store exposes
pub const BLOCK_COUNT: usize = 3;

/// Selects one of the memory blocks. How a block is actually named is up to
/// the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockId {
    Block0,
    Block1,
    Block2,
}

impl BlockId {
    /// All block identifiers, in index order
    pub const ALL: [BlockId; BLOCK_COUNT] = [BlockId::Block0, BlockId::Block1, BlockId::Block2];

    /// Position of this block in the store's block table
    pub fn index(self) -> usize {
        match self {
            BlockId::Block0 => 0,
            BlockId::Block1 => 1,
            BlockId::Block2 => 2,
        }
    }

    /// Look up a block by raw index.
    ///
    /// Fails with an initialization failure, since a block that does not
    /// exist can never be opened.
    pub fn from_index(index: usize) -> Result<Self, AdapterError> {
        Self::ALL.get(index).copied().ok_or(AdapterError::InitializationFailure {
            operation: Operation::Open,
            block: None,
            reason: FailureReason::UnknownBlock(index),
        })
    }
}

impl TryFrom<usize> for BlockId {
    type Error = AdapterError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::from_index(index)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {}", self.index())
    }
}
