use crate::block::block_store::{range_fits, BlockStore, StoreHandle};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use common::{AdapterError, BlockId, FailureReason, Operation};
use spin::Mutex;

/// Token for the block an adapter currently has open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    block: BlockId,
    raw: StoreHandle,
}

impl BlockHandle {
    /// The block this handle refers to
    pub fn block(&self) -> BlockId {
        self.block
    }
}

struct OpenBlock {
    handle: BlockHandle,
    size: usize,
}

/// Bounds-checked byte access to one memory block of a shared store.
///
/// Every read and write is checked against the size cached at open time
/// before the store is touched. Store failures are reported as
/// [`AdapterError`]s; nothing is retried. Dropping the adapter closes its
/// block.
pub struct BlockAdapter {
    store: Arc<Mutex<dyn BlockStore>>,
    open_block: Option<OpenBlock>,
}

impl BlockAdapter {
    /// Create a new adapter for a store. No block is open yet.
    pub fn new(store: Arc<Mutex<dyn BlockStore>>) -> Self {
        Self {
            store,
            open_block: None,
        }
    }

    /// Create a new adapter for the process-wide shared store
    pub fn shared() -> Self {
        Self::new(crate::block::shared_store())
    }

    /// Open a memory block for access
    pub fn open(&mut self, block: BlockId) -> Result<BlockHandle, AdapterError> {
        let init_failure = |reason: FailureReason| AdapterError::InitializationFailure {
            operation: Operation::Open,
            block: Some(block),
            reason,
        };

        if self.open_block.is_some() {
            return Err(init_failure(FailureReason::AlreadyOpen));
        }

        let mut store = self.store.lock();
        let name = store
            .block_name(block)
            .map(String::from)
            .ok_or_else(|| init_failure(FailureReason::UnknownBlock(block.index())))?;

        let raw = store.open(&name).map_err(|e| init_failure(e.into()))?;
        let size = match store.size(raw) {
            Ok(size) => size,
            Err(e) => {
                store.close(raw);
                return Err(AdapterError::InitializationFailure {
                    operation: Operation::Size,
                    block: Some(block),
                    reason: e.into(),
                });
            }
        };

        log::debug!("BlockAdapter: opened {} ({}), {} bytes", block, name, size);

        let handle = BlockHandle { block, raw };
        self.open_block = Some(OpenBlock { handle, size });
        Ok(handle)
    }

    /// Open a memory block given its raw index
    pub fn open_index(&mut self, index: usize) -> Result<BlockHandle, AdapterError> {
        let block = BlockId::try_from(index)?;
        self.open(block)
    }

    /// The handle of the open block, if any
    pub fn handle(&self) -> Option<BlockHandle> {
        self.open_block.as_ref().map(|open| open.handle)
    }

    pub fn is_open(&self) -> bool {
        self.open_block.is_some()
    }

    /// Size in bytes of the open block
    pub fn block_size(&self) -> Result<usize, AdapterError> {
        self.require_open(Operation::Size).map(|open| open.size)
    }

    /// Read `max_bytes` bytes starting at `offset`
    pub fn read(&self, offset: usize, max_bytes: usize) -> Result<Vec<u8>, AdapterError> {
        let open = self.require_open(Operation::Read)?;
        let io_failure = |reason: FailureReason| AdapterError::IoFailure {
            operation: Operation::Read,
            block: open.handle.block,
            offset,
            length: max_bytes,
            reason,
        };

        if !range_fits(offset, max_bytes, open.size) {
            return Err(io_failure(FailureReason::OutOfBounds { size: open.size }));
        }

        let mut data = self
            .store
            .lock()
            .read(open.handle.raw, offset, max_bytes)
            .map_err(|e| io_failure(e.into()))?;

        if data.len() < max_bytes {
            return Err(io_failure(FailureReason::ShortRead {
                requested: max_bytes,
                returned: data.len(),
            }));
        }
        data.truncate(max_bytes);

        log::trace!("BlockAdapter: read {} bytes at offset {} of {}", max_bytes, offset, open.handle.block);
        Ok(data)
    }

    /// Write the first `max_bytes` bytes of `data` starting at `offset`.
    ///
    /// `data` must hold at least `max_bytes` bytes.
    pub fn write(&mut self, offset: usize, data: &[u8], max_bytes: usize) -> Result<(), AdapterError> {
        let open = self.require_open(Operation::Write)?;
        let io_failure = |reason: FailureReason| AdapterError::IoFailure {
            operation: Operation::Write,
            block: open.handle.block,
            offset,
            length: max_bytes,
            reason,
        };

        if data.len() < max_bytes {
            return Err(io_failure(FailureReason::BufferTooSmall {
                provided: data.len(),
                required: max_bytes,
            }));
        }
        if !range_fits(offset, max_bytes, open.size) {
            return Err(io_failure(FailureReason::OutOfBounds { size: open.size }));
        }

        self.store
            .lock()
            .write(open.handle.raw, offset, &data[..max_bytes])
            .map_err(|e| io_failure(e.into()))?;

        log::trace!("BlockAdapter: wrote {} bytes at offset {} of {}", max_bytes, offset, open.handle.block);
        Ok(())
    }

    /// Close the open block. Closing an adapter with nothing open is a no-op.
    pub fn close(&mut self) {
        if let Some(open) = self.open_block.take() {
            self.store.lock().close(open.handle.raw);
            log::debug!("BlockAdapter: closed {}", open.handle.block);
        }
    }

    fn require_open(&self, operation: Operation) -> Result<&OpenBlock, AdapterError> {
        self.open_block.as_ref().ok_or(AdapterError::InitializationFailure {
            operation,
            block: None,
            reason: FailureReason::NotOpen,
        })
    }
}

impl Drop for BlockAdapter {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::block_store::BlockNames;
    use crate::block::ramstore::RamBlockStore;
    use common::StoreError;
    use core::cell::Cell;

    /// Wraps a RAM store, counting the calls that reach it and optionally
    /// misbehaving
    struct ProbeStore {
        inner: RamBlockStore,
        reads: Cell<usize>,
        writes: usize,
        short_reads: bool,
        fail_writes: bool,
        fail_size: bool,
        hide_names: bool,
    }

    impl ProbeStore {
        fn new(block_size: usize) -> Self {
            Self {
                inner: RamBlockStore::with_size(BlockNames::default(), block_size),
                reads: Cell::new(0),
                writes: 0,
                short_reads: false,
                fail_writes: false,
                fail_size: false,
                hide_names: false,
            }
        }
    }

    impl BlockStore for ProbeStore {
        fn block_name(&self, block: BlockId) -> Option<&str> {
            if self.hide_names {
                None
            } else {
                self.inner.block_name(block)
            }
        }

        fn open(&mut self, name: &str) -> Result<StoreHandle, StoreError> {
            self.inner.open(name)
        }

        fn size(&self, handle: StoreHandle) -> Result<usize, StoreError> {
            if self.fail_size {
                return Err(StoreError::Unavailable);
            }
            self.inner.size(handle)
        }

        fn read(&self, handle: StoreHandle, offset: usize, length: usize) -> Result<Vec<u8>, StoreError> {
            self.reads.set(self.reads.get() + 1);
            let mut data = self.inner.read(handle, offset, length)?;
            if self.short_reads {
                data.pop();
            }
            Ok(data)
        }

        fn write(&mut self, handle: StoreHandle, offset: usize, data: &[u8]) -> Result<(), StoreError> {
            self.writes += 1;
            if self.fail_writes {
                return Err(StoreError::Unavailable);
            }
            self.inner.write(handle, offset, data)
        }

        fn close(&mut self, handle: StoreHandle) {
            self.inner.close(handle)
        }
    }

    fn probe(block_size: usize) -> Arc<Mutex<ProbeStore>> {
        Arc::new(Mutex::new(ProbeStore::new(block_size)))
    }

    fn adapter_for(store: &Arc<Mutex<ProbeStore>>) -> BlockAdapter {
        let shared: Arc<Mutex<dyn BlockStore>> = store.clone();
        BlockAdapter::new(shared)
    }

    #[test]
    fn write_then_read_round_trips() {
        let store = probe(32);
        let mut adapter = adapter_for(&store);
        adapter.open(BlockId::Block0).unwrap();
        assert_eq!(adapter.block_size(), Ok(32));

        let hello = [0x48, 0x65, 0x6C, 0x6C, 0x6F];
        adapter.write(0, &hello, 5).unwrap();
        assert_eq!(adapter.read(0, 5).unwrap(), hello.to_vec());
    }

    #[test]
    fn write_uses_only_max_bytes() {
        let store = probe(8);
        let mut adapter = adapter_for(&store);
        adapter.open(BlockId::Block1).unwrap();
        adapter.write(2, &[7, 7, 7, 7], 2).unwrap();
        assert_eq!(adapter.read(0, 8).unwrap(), vec![0, 0, 7, 7, 0, 0, 0, 0]);
    }

    #[test]
    fn out_of_bounds_never_reaches_store() {
        let store = probe(32);
        let mut adapter = adapter_for(&store);
        adapter.open(BlockId::Block0).unwrap();

        let err = adapter.read(30, 5).unwrap_err();
        assert!(err.is_io_failure());
        assert_eq!(err.reason(), FailureReason::OutOfBounds { size: 32 });

        let err = adapter.write(30, &[0; 5], 5).unwrap_err();
        assert!(err.is_io_failure());
        assert_eq!(store.lock().reads.get(), 0);
        assert_eq!(store.lock().writes, 0);

        let err = adapter.read(usize::MAX, 2).unwrap_err();
        assert!(err.is_io_failure());
    }

    #[test]
    fn short_buffer_is_rejected_before_store() {
        let store = probe(32);
        let mut adapter = adapter_for(&store);
        adapter.open(BlockId::Block0).unwrap();

        let err = adapter.write(0, &[1, 2], 3).unwrap_err();
        assert_eq!(err.reason(), FailureReason::BufferTooSmall { provided: 2, required: 3 });
        assert_eq!(store.lock().writes, 0);
    }

    #[test]
    fn store_failures_become_io_failures() {
        let store = probe(32);
        let mut adapter = adapter_for(&store);
        adapter.open(BlockId::Block2).unwrap();

        store.lock().fail_writes = true;
        let err = adapter.write(0, &[1], 1).unwrap_err();
        assert_eq!(
            err,
            AdapterError::IoFailure {
                operation: Operation::Write,
                block: BlockId::Block2,
                offset: 0,
                length: 1,
                reason: FailureReason::Store(StoreError::Unavailable),
            }
        );

        store.lock().short_reads = true;
        let err = adapter.read(0, 4).unwrap_err();
        assert_eq!(err.reason(), FailureReason::ShortRead { requested: 4, returned: 3 });
    }

    #[test]
    fn closed_adapter_rejects_access() {
        let store = probe(32);
        let mut adapter = adapter_for(&store);

        let err = adapter.read(0, 1).unwrap_err();
        assert!(err.is_initialization_failure());

        adapter.open(BlockId::Block0).unwrap();
        adapter.close();
        adapter.close();
        assert!(!adapter.is_open());

        assert!(adapter.read(0, 1).unwrap_err().is_initialization_failure());
        assert!(adapter.write(0, &[1], 1).unwrap_err().is_initialization_failure());
        assert!(adapter.block_size().unwrap_err().is_initialization_failure());
    }

    #[test]
    fn second_open_on_same_adapter_fails() {
        let store = probe(32);
        let mut adapter = adapter_for(&store);
        let handle = adapter.open(BlockId::Block0).unwrap();
        assert_eq!(handle.block(), BlockId::Block0);

        let err = adapter.open(BlockId::Block1).unwrap_err();
        assert_eq!(err.reason(), FailureReason::AlreadyOpen);
        assert_eq!(adapter.handle(), Some(handle));
    }

    #[test]
    fn block_held_by_another_adapter_cannot_be_opened() {
        let store = probe(32);
        let mut first = adapter_for(&store);
        let mut second = adapter_for(&store);
        first.open(BlockId::Block0).unwrap();

        let err = second.open(BlockId::Block0).unwrap_err();
        assert!(err.is_initialization_failure());
        assert_eq!(err.reason(), FailureReason::Store(StoreError::BlockAlreadyOpened));

        drop(first);
        assert!(second.open(BlockId::Block0).is_ok());
    }

    #[test]
    fn failed_size_query_releases_block() {
        let store = probe(32);
        store.lock().fail_size = true;
        let mut adapter = adapter_for(&store);

        let err = adapter.open(BlockId::Block0).unwrap_err();
        assert_eq!(err.operation(), Operation::Size);
        assert!(!adapter.is_open());

        store.lock().fail_size = false;
        assert!(adapter.open(BlockId::Block0).is_ok());
    }

    #[test]
    fn unnamed_block_is_unknown() {
        let store = probe(32);
        store.lock().hide_names = true;
        let mut adapter = adapter_for(&store);
        let err = adapter.open(BlockId::Block1).unwrap_err();
        assert_eq!(err.reason(), FailureReason::UnknownBlock(1));
    }

    #[test]
    fn open_index_rejects_unknown_blocks() {
        let store = probe(32);
        let mut adapter = adapter_for(&store);
        assert!(adapter.open_index(7).unwrap_err().is_initialization_failure());
        assert_eq!(adapter.open_index(2).unwrap().block(), BlockId::Block2);
    }
}
