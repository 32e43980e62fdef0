//! Memory addressed in 32-bit chunks, and a store that exposes it as bytes.
//!
//! [`DdrMemory`] models a back end that can only get and set whole 32-bit
//! chunks. [`ChunkedBlockStore`] adapts any such device to the byte-oriented
//! [`BlockStore`] interface. Bytes are laid out little-endian inside a chunk,
//! so byte 0 of a block is the low byte of chunk 0.

use super::block_store::{range_fits, BlockNames, BlockStore, StoreHandle};
use alloc::vec;
use alloc::vec::Vec;
use core::cmp;
use common::{BlockId, StoreError};

/// Bytes per chunk
pub const CHUNK_SIZE: usize = 4;

/// Default number of chunks in each block. All chunk offsets must be less
/// than this value.
pub const DDR_MAX_OFFSET: usize = 32;

/// Interface for devices that are addressed in 32-bit chunks
pub trait ChunkDevice: Send {
    /// Return the device-specific name of a block
    fn block_name(&self, block: BlockId) -> Option<&str>;

    /// Open a block by name for exclusive use
    fn open(&mut self, name: &str) -> Result<StoreHandle, StoreError>;

    /// Release an open block, making it available to others
    fn close(&mut self, handle: StoreHandle) -> Result<(), StoreError>;

    /// Return the number of chunks in an open block
    fn chunk_count(&self, handle: StoreHandle) -> Result<usize, StoreError>;

    /// Read the chunk at `chunk_offset`
    fn get_chunk(&self, handle: StoreHandle, chunk_offset: usize) -> Result<u32, StoreError>;

    /// Write the chunk at `chunk_offset`
    fn set_chunk(&mut self, handle: StoreHandle, chunk_offset: usize, value: u32) -> Result<(), StoreError>;
}

struct DdrBlock {
    chunks: Vec<u32>,
    handle: Option<StoreHandle>,
}

/// In-memory chunk device with three zero-filled blocks
pub struct DdrMemory {
    names: BlockNames,
    blocks: Vec<DdrBlock>,
}

impl DdrMemory {
    /// Creates a device with the default names and `DDR_MAX_OFFSET` chunks
    /// per block.
    pub fn new() -> Self {
        Self::with_chunks(BlockNames::default(), DDR_MAX_OFFSET)
    }

    pub fn with_chunks(names: BlockNames, chunk_count: usize) -> Self {
        let blocks = BlockId::ALL
            .iter()
            .map(|_| DdrBlock {
                chunks: vec![0; chunk_count],
                handle: None,
            })
            .collect();

        DdrMemory { names, blocks }
    }

    fn lookup(&self, handle: StoreHandle) -> Result<usize, StoreError> {
        self.blocks
            .iter()
            .position(|block| block.handle == Some(handle))
            .ok_or(StoreError::InvalidHandle)
    }
}

impl Default for DdrMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkDevice for DdrMemory {
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
        Ok(handle)
    }

    fn close(&mut self, handle: StoreHandle) -> Result<(), StoreError> {
        let index = self.lookup(handle).map_err(|_| StoreError::BlockNotOpened)?;
        self.blocks[index].handle = None;
        Ok(())
    }

    fn chunk_count(&self, handle: StoreHandle) -> Result<usize, StoreError> {
        let index = self.lookup(handle)?;
        Ok(self.blocks[index].chunks.len())
    }

    fn get_chunk(&self, handle: StoreHandle, chunk_offset: usize) -> Result<u32, StoreError> {
        let index = self.lookup(handle)?;
        self.blocks[index]
            .chunks
            .get(chunk_offset)
            .copied()
            .ok_or(StoreError::InvalidOffset)
    }

    fn set_chunk(&mut self, handle: StoreHandle, chunk_offset: usize, value: u32) -> Result<(), StoreError> {
        let index = self.lookup(handle)?;
        let chunk = self.blocks[index]
            .chunks
            .get_mut(chunk_offset)
            .ok_or(StoreError::InvalidOffset)?;
        *chunk = value;
        Ok(())
    }
}

/// Byte-oriented store on top of a chunk device.
///
/// Partially covered chunks at either end of a range are read, patched and
/// written back. Writes go out chunk by chunk and are not atomic: if the
/// device rejects a chunk midway, the chunks before it stay written.
pub struct ChunkedBlockStore<D: ChunkDevice> {
    device: D,
}

impl<D: ChunkDevice> ChunkedBlockStore<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    fn check_range(&self, handle: StoreHandle, offset: usize, length: usize) -> Result<(), StoreError> {
        let size = self.size(handle)?;
        if range_fits(offset, length, size) {
            Ok(())
        } else {
            Err(StoreError::InvalidOffset)
        }
    }
}

impl<D: ChunkDevice> BlockStore for ChunkedBlockStore<D> {
    fn block_name(&self, block: BlockId) -> Option<&str> {
        self.device.block_name(block)
    }

    fn open(&mut self, name: &str) -> Result<StoreHandle, StoreError> {
        self.device.open(name)
    }

    fn size(&self, handle: StoreHandle) -> Result<usize, StoreError> {
        Ok(self.device.chunk_count(handle)? * CHUNK_SIZE)
    }

    fn read(&self, handle: StoreHandle, offset: usize, length: usize) -> Result<Vec<u8>, StoreError> {
        self.check_range(handle, offset, length)?;

        let end = offset + length;
        let mut data = Vec::with_capacity(length);
        let mut position = offset;
        while position < end {
            let first = position % CHUNK_SIZE;
            let count = cmp::min(CHUNK_SIZE - first, end - position);
            let bytes = self.device.get_chunk(handle, position / CHUNK_SIZE)?.to_le_bytes();
            data.extend_from_slice(&bytes[first..first + count]);
            position += count;
        }

        Ok(data)
    }

    fn write(&mut self, handle: StoreHandle, offset: usize, buffer: &[u8]) -> Result<(), StoreError> {
        self.check_range(handle, offset, buffer.len())?;

        let end = offset + buffer.len();
        let mut position = offset;
        while position < end {
            let chunk_offset = position / CHUNK_SIZE;
            let first = position % CHUNK_SIZE;
            let count = cmp::min(CHUNK_SIZE - first, end - position);

            // Whole chunks are overwritten outright, partial ones keep their
            // other bytes
            let mut bytes = if count == CHUNK_SIZE {
                [0; CHUNK_SIZE]
            } else {
                self.device.get_chunk(handle, chunk_offset)?.to_le_bytes()
            };
            let source = position - offset;
            bytes[first..first + count].copy_from_slice(&buffer[source..source + count]);
            self.device.set_chunk(handle, chunk_offset, u32::from_le_bytes(bytes))?;

            position += count;
        }

        Ok(())
    }

    fn close(&mut self, handle: StoreHandle) {
        if let Err(e) = self.device.close(handle) {
            log::debug!("ChunkedBlockStore: ignoring close of handle {}: {}", handle.raw(), e);
        }
    }
}
