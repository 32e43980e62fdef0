//! Memory block stores and the adapter that gives bounds-checked byte access
//! to them.

pub mod block_adapter;
pub mod block_store;
pub mod chunked;
pub mod ramstore;

pub use block_adapter::{BlockAdapter, BlockHandle};
pub use block_store::{BlockNames, BlockStore, StoreHandle};
pub use chunked::{ChunkDevice, ChunkedBlockStore, DdrMemory};
pub use ramstore::RamBlockStore;

use crate::config::{self, ConfigError, StoreBackend, StoreConfig};
use alloc::sync::Arc;
use lazy_static::lazy_static;
use spin::Mutex;

lazy_static! {
    static ref SHARED_STORE: Arc<Mutex<dyn BlockStore>> = {
        match config::store_config().and_then(|store_config| build_store(&store_config)) {
            Ok(store) => store,
            Err(e) => {
                log::warn!("Invalid store configuration: {}. Using defaults.", e);
                Arc::new(Mutex::new(RamBlockStore::new()))
            }
        }
    };
}

/// Build a new store as described by `store_config`. Settings that fail
/// [`StoreConfig::validate`] are rejected rather than adjusted.
pub fn build_store(store_config: &StoreConfig) -> Result<Arc<Mutex<dyn BlockStore>>, ConfigError> {
    store_config.validate()?;

    log::debug!(
        "Building {:?} store with {} byte blocks",
        store_config.backend,
        store_config.block_size
    );

    let store: Arc<Mutex<dyn BlockStore>> = match store_config.backend {
        StoreBackend::Ram => Arc::new(Mutex::new(RamBlockStore::with_size(
            store_config.names.clone(),
            store_config.block_size,
        ))),
        StoreBackend::Chunked => Arc::new(Mutex::new(ChunkedBlockStore::new(DdrMemory::with_chunks(
            store_config.names.clone(),
            store_config.block_size / chunked::CHUNK_SIZE,
        )))),
    };
    Ok(store)
}

/// The process-wide store, built from the global configuration on first use
pub fn shared_store() -> Arc<Mutex<dyn BlockStore>> {
    SHARED_STORE.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::BlockId;

    #[test]
    fn misaligned_chunked_block_size_is_rejected() {
        let store_config = StoreConfig {
            backend: StoreBackend::Chunked,
            block_size: 30,
            ..StoreConfig::default()
        };
        match build_store(&store_config) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "store.block_size"),
            Ok(_) => panic!("30 byte chunked blocks should be rejected"),
        }
    }

    #[test]
    fn ram_store_keeps_odd_block_size() {
        let store_config = StoreConfig {
            block_size: 30,
            ..StoreConfig::default()
        };
        let store = build_store(&store_config).unwrap();
        let mut store = store.lock();
        let name = store.block_name(BlockId::Block0).map(String::from).unwrap();
        let handle = store.open(&name).unwrap();
        assert_eq!(store.size(handle), Ok(30));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut store_config = StoreConfig::default();
        store_config.names = BlockNames::new(["a".into(), "b".into(), "a".into()]);
        assert!(build_store(&store_config).is_err());
    }
}
