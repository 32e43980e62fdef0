// common/src/errors.rs
//! Error types for memory block access.
//!
//! Stores report a [`StoreError`]. The adapter folds those into one of two
//! [`AdapterError`] kinds, together with the operation, block and range that
//! were being accessed.

use core::fmt;
use crate::block_id::BlockId;

/// The adapter operation that was in progress when an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Size,
    Read,
    Write,
    Close,
}

impl Operation {
    /// Get a string representation of the operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Open => "opening memory block",
            Operation::Size => "getting memory size",
            Operation::Read => "reading memory",
            Operation::Write => "writing memory",
            Operation::Close => "closing memory block",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by a block store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Memory block is already open and cannot be opened again
    BlockAlreadyOpened,
    /// Memory block is closed and cannot be accessed
    BlockNotOpened,
    /// The given name is not a recognized memory block name
    InvalidBlockName,
    /// The handle does not correspond to an open memory block
    InvalidHandle,
    /// The given offset is out of bounds
    InvalidOffset,
    /// The store could not be reached
    Unavailable,
}

impl StoreError {
    /// Get a string representation of the error
    pub fn to_str(&self) -> &'static str {
        match self {
            StoreError::BlockAlreadyOpened => "Memory block is already open and cannot be opened again",
            StoreError::BlockNotOpened => "Memory block is closed and cannot be accessed",
            StoreError::InvalidBlockName => "The given name is not a recognized memory block name",
            StoreError::InvalidHandle => "The handle argument does not correspond to a valid open memory block",
            StoreError::InvalidOffset => "The given offset is out of bounds",
            StoreError::Unavailable => "The memory block store could not be reached",
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Why an adapter operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No block is open on this adapter
    NotOpen,
    /// The adapter already holds an open block
    AlreadyOpen,
    /// Raw block index with no matching block
    UnknownBlock(usize),
    /// The store rejected the call
    Store(StoreError),
    /// The requested range does not fit in the block
    OutOfBounds { size: usize },
    /// The source buffer is shorter than the byte count to write
    BufferTooSmall { provided: usize, required: usize },
    /// The store returned fewer bytes than requested
    ShortRead { requested: usize, returned: usize },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NotOpen => write!(f, "no memory block is open"),
            FailureReason::AlreadyOpen => write!(f, "a memory block is already open"),
            FailureReason::UnknownBlock(index) => write!(f, "no memory block with index {}", index),
            FailureReason::Store(e) => write!(f, "{}", e),
            FailureReason::OutOfBounds { size } => write!(f, "range exceeds block size of {} bytes", size),
            FailureReason::BufferTooSmall { provided, required } => {
                write!(f, "buffer holds {} bytes but {} were requested", provided, required)
            }
            FailureReason::ShortRead { requested, returned } => {
                write!(f, "store returned {} of {} requested bytes", returned, requested)
            }
        }
    }
}

impl From<StoreError> for FailureReason {
    fn from(e: StoreError) -> Self {
        FailureReason::Store(e)
    }
}

/// Errors returned by the block adapter.
///
/// `InitializationFailure` means the adapter is not in a usable state: the
/// open failed, the block is unknown, or no block is open. `IoFailure` means a
/// usable block rejected a read or write, including ranges caught by the
/// bounds pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterError {
    InitializationFailure {
        operation: Operation,
        block: Option<BlockId>,
        reason: FailureReason,
    },
    IoFailure {
        operation: Operation,
        block: BlockId,
        offset: usize,
        length: usize,
        reason: FailureReason,
    },
}

impl AdapterError {
    pub fn operation(&self) -> Operation {
        match self {
            AdapterError::InitializationFailure { operation, .. } => *operation,
            AdapterError::IoFailure { operation, .. } => *operation,
        }
    }

    pub fn block(&self) -> Option<BlockId> {
        match self {
            AdapterError::InitializationFailure { block, .. } => *block,
            AdapterError::IoFailure { block, .. } => Some(*block),
        }
    }

    pub fn reason(&self) -> FailureReason {
        match self {
            AdapterError::InitializationFailure { reason, .. } => *reason,
            AdapterError::IoFailure { reason, .. } => *reason,
        }
    }

    pub fn is_initialization_failure(&self) -> bool {
        matches!(self, AdapterError::InitializationFailure { .. })
    }

    pub fn is_io_failure(&self) -> bool {
        matches!(self, AdapterError::IoFailure { .. })
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::InitializationFailure { operation, block: Some(block), reason } => {
                write!(f, "Initialization failure {} ({}): {}", operation, block, reason)
            }
            AdapterError::InitializationFailure { operation, block: None, reason } => {
                write!(f, "Initialization failure {}: {}", operation, reason)
            }
            AdapterError::IoFailure { operation, block, offset, length, reason } => write!(
                f,
                "I/O failure {} ({}, offset {}, length {}): {}",
                operation, block, offset, length, reason
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_failure_display_carries_range() {
        let err = AdapterError::IoFailure {
            operation: Operation::Read,
            block: BlockId::Block0,
            offset: 30,
            length: 5,
            reason: FailureReason::OutOfBounds { size: 32 },
        };
        assert_eq!(
            format!("{}", err),
            "I/O failure reading memory (block 0, offset 30, length 5): range exceeds block size of 32 bytes"
        );
        assert!(err.is_io_failure());
        assert_eq!(err.block(), Some(BlockId::Block0));
    }

    #[test]
    fn initialization_failure_display() {
        let err = AdapterError::InitializationFailure {
            operation: Operation::Open,
            block: Some(BlockId::Block1),
            reason: StoreError::BlockAlreadyOpened.into(),
        };
        assert_eq!(
            format!("{}", err),
            "Initialization failure opening memory block (block 1): Memory block is already open and cannot be opened again"
        );
        assert_eq!(err.operation(), Operation::Open);
    }
}
