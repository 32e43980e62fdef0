//! Bounds-checked access to named memory blocks, and a hex dump formatter for
//! the bytes read from them.
//!
//! A [`BlockAdapter`] opens one of the three blocks of a [`BlockStore`],
//! checks every read and write against the block size before the store is
//! touched, and reports failures as an [`AdapterError`]. [`hexdump::render`]
//! turns any byte buffer into a printable listing.

#![cfg_attr(not(test), no_std)]
extern crate alloc; // Vec, String, Arc, BTreeMap

pub mod block;
pub mod config;
pub mod hexdump;
pub mod logger;

pub use block::{BlockAdapter, BlockHandle, BlockStore, StoreHandle};
pub use common::{AdapterError, BlockId, FailureReason, Operation, StoreError};
pub use hexdump::render;

use config::ConfigError;

/// Load the configuration and install the logger at the configured level.
///
/// `config_text` holds `key=value` lines; without it the defaults stay in
/// place. Call this before the first use of the shared store so its settings
/// take effect.
pub fn init(config_text: Option<&str>) -> Result<(), ConfigError> {
    if let Some(text) = config_text {
        config::load_from_str(text);
    }

    let level = config::log_level()?;
    if let Err(e) = logger::init(level) {
        // Somebody else owns the log facade; their logger receives our records
        log::warn!("memblock logger not installed: {}", e);
    }

    log::info!("memblock initialized");
    Ok(())
}
