//! Types shared between the memory block stores and the adapter that sits on
//! top of them.

#![cfg_attr(not(test), no_std)]

pub mod block_id;
pub mod errors;

pub use block_id::{BlockId, BLOCK_COUNT};
pub use errors::{AdapterError, FailureReason, Operation, StoreError};
