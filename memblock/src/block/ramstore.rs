use super::block_store::{range_fits, BlockNames, BlockStore, StoreHandle};
use alloc::vec;
use alloc::vec::Vec;
use common::{BlockId, StoreError};

/// Default size of each memory block: 32 chunks of 32 bits
pub const DEFAULT_BLOCK_SIZE: usize = 128;

struct RamBlock {
    data: Vec<u8>,
    handle: Option<StoreHandle>,
}

/// Store keeping every memory block in RAM.
///
/// A block can only be held by one handle at a time. Contents survive a
/// close, so reopening a block sees what was last written. Writes are
/// validated before any byte is copied, so a rejected write leaves the block
/// untouched.
pub struct RamBlockStore {
    names: BlockNames,
    blocks: Vec<RamBlock>,
}

impl RamBlockStore {
    /// Creates a store with the default names and block size.
    pub fn new() -> Self {
        Self::with_size(BlockNames::default(), DEFAULT_BLOCK_SIZE)
    }

    /// Creates a store with the given names, every block `block_size` bytes
    /// long and zero filled.
    pub fn with_size(names: BlockNames, block_size: usize) -> Self {
        log::debug!("RamBlockStore: creating 3 blocks of {} bytes", block_size);

        let blocks = BlockId::ALL
            .iter()
            .map(|_| RamBlock {
                data: vec![0; block_size],
                handle: None,
            })
            .collect();

        RamBlockStore { names, blocks }
    }

    /// Current contents of a block, whether or not it is open
    pub fn contents(&self, block: BlockId) -> &[u8] {
        &self.blocks[block.index()].data
    }

    fn lookup(&self, handle: StoreHandle) -> Result<usize, StoreError> {
        self.blocks
            .iter()
            .position(|block| block.handle == Some(handle))
            .ok_or(StoreError::InvalidHandle)
    }
}

impl Default for RamBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore for RamBlockStore {
    fn block_name(&self, block: BlockId) -> Option<&str> {
        Some(self.names.name(block))
    }

    fn open(&mut self, name: &str) -> Result<StoreHandle, StoreError> {
        let block = self.names.find(name).ok_or(StoreError::InvalidBlockName)?;
        let entry = &mut self.blocks[block.index()];
        if entry.handle.is_some() {
            return Err(StoreError::BlockAlreadyOpened);
        }

        let handle = StoreHandle::generate();
        entry.handle = Some(handle);
        log::trace!("RamBlockStore: opened {} ({}) as handle {}", name, block, handle.raw());
        Ok(handle)
    }

    fn size(&self, handle: StoreHandle) -> Result<usize, StoreError> {
        let index = self.lookup(handle)?;
        Ok(self.blocks[index].data.len())
    }

    fn read(&self, handle: StoreHandle, offset: usize, length: usize) -> Result<Vec<u8>, StoreError> {
        let index = self.lookup(handle)?;
        let data = &self.blocks[index].data;
        if !range_fits(offset, length, data.len()) {
            return Err(StoreError::InvalidOffset);
        }

        Ok(data[offset..offset + length].to_vec())
    }

    fn write(&mut self, handle: StoreHandle, offset: usize, buffer: &[u8]) -> Result<(), StoreError> {
        let index = self.lookup(handle)?;
        let data = &mut self.blocks[index].data;
        if !range_fits(offset, buffer.len(), data.len()) {
            return Err(StoreError::InvalidOffset);
        }

        data[offset..offset + buffer.len()].copy_from_slice(buffer);
        Ok(())
    }

    fn close(&mut self, handle: StoreHandle) {
        if let Ok(index) = self.lookup(handle) {
            self.blocks[index].handle = None;
            log::trace!("RamBlockStore: closed handle {}", handle.raw());
        }
    }
}
