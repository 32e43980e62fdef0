use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};
use common::{BlockId, StoreError, BLOCK_COUNT};

/// Handle generator shared by every store, so a handle issued by one store is
/// never valid on another
static NEXT_STORE_HANDLE: AtomicU32 = AtomicU32::new(1);

/// Raw token a store hands out for one opened block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreHandle(u32);

impl StoreHandle {
    /// Allocates a fresh, never before issued handle
    pub fn generate() -> Self {
        StoreHandle(NEXT_STORE_HANDLE.fetch_add(1, Ordering::SeqCst))
    }

    /// The numeric value of the handle, as shown in log records
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Interface for memory block stores
pub trait BlockStore: Send {
    /// Return the store-specific name of a block, if the store has one
    fn block_name(&self, block: BlockId) -> Option<&str>;

    /// Open a block by name for exclusive use
    fn open(&mut self, name: &str) -> Result<StoreHandle, StoreError>;

    /// Return the size of an open block in bytes
    fn size(&self, handle: StoreHandle) -> Result<usize, StoreError>;

    /// Read `length` bytes starting at `offset`
    fn read(&self, handle: StoreHandle, offset: usize, length: usize) -> Result<Vec<u8>, StoreError>;

    /// Write all of `data` starting at `offset`
    fn write(&mut self, handle: StoreHandle, offset: usize, data: &[u8]) -> Result<(), StoreError>;

    /// Release an open block. Unknown handles are ignored.
    fn close(&mut self, handle: StoreHandle);
}

/// Names of the three memory blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNames([String; BLOCK_COUNT]);

impl BlockNames {
    pub fn new(names: [String; BLOCK_COUNT]) -> Self {
        Self(names)
    }

    /// Get the name of a block
    pub fn name(&self, block: BlockId) -> &str {
        &self.0[block.index()]
    }

    /// Find the block carrying the given name
    pub fn find(&self, name: &str) -> Option<BlockId> {
        BlockId::ALL.iter().copied().find(|block| self.name(*block) == name)
    }
}

impl Default for BlockNames {
    fn default() -> Self {
        Self(["gorp".to_string(), "baba".to_string(), "yaga".to_string()])
    }
}

/// Returns true when `length` bytes at `offset` fit inside `size` bytes
pub fn range_fits(offset: usize, length: usize, size: usize) -> bool {
    offset.checked_add(length).map_or(false, |end| end <= size)
}
