#![doc = include_str!("../README.md")]
//!

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(any(), deny(clippy::unwrap_used))]

pub mod config;
pub mod errors;
pub mod provider;
mod storage;
pub mod transfer;
mod util;

pub use config::{AccessLevel, ObjectLocation, StorageConfig, DEFAULT_CHUNK_SIZE};
pub use errors::{
    is_cancel_error, ServiceError, StorageError, ValidationError, MAX_OBJECT_SIZE,
};
#[cfg(not(target_arch = "wasm32"))]
pub use provider::HttpStorageProvider;
pub use provider::{
    GetObjectOutput, GetObjectRequest, InMemoryProvider, ProgressCallback, PutObjectOutput,
    PutObjectRequest, StorageProvider, TransferProgress,
};
pub use storage::*;
pub use transfer::{ResumableTransferTask, TransferControl, TransferState, TransferTask};

// Re-exported so providers can be implemented without a direct dependency.
pub use async_trait::async_trait;
pub use bytes::Bytes;
