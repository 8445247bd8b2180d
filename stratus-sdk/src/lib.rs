#![doc = include_str!("../README.md")]
//!

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(any(), deny(clippy::unwrap_used))]

pub mod config;
pub mod errors;
mod global;
#[cfg(not(target_arch = "wasm32"))]
pub mod logging;
mod stratus;
mod toml_merge;

pub mod prelude;

// --- PUBLIC API EXPORTS ---
// Facade
pub use stratus::{Stratus, CORE_CHANNEL};

// Configuration, errors and the global instance
pub use config::{ConfigToml, LoggingToml, DEFAULT_CONFIG};
pub use errors::{ConfigError, Error, LoggingError, Result};
pub use toml_merge::MergeError;
pub use global::{configure, global, reset_global, set_global};
#[cfg(not(target_arch = "wasm32"))]
pub use logging::init_tracing;

// Event hub
pub use stratus_core::{
    AccessToken, Capsule, Channel, Hub, HubCallback, HubCapsuleHandler, HubError, Listener,
    Payload, Unsubscribe, DEFAULT_HUB_NAME, PROTECTED_CHANNELS,
};

// Storage
#[cfg(not(target_arch = "wasm32"))]
pub use stratus_storage::{DownloadFileOutput, HttpStorageProvider};
pub use stratus_storage::{
    is_cancel_error, AccessLevel, DownloadInput, DownloadOptions, DownloadOutput, GetUrlInput,
    GetUrlOptions, GetUrlOutput, InMemoryProvider, ProgressCallback, ResumableTransferTask,
    ServiceError, Storage, StorageConfig, StorageError, StorageProvider, TransferControl,
    TransferProgress, TransferState, TransferTask, UploadData, UploadInput, UploadOptions,
    UploadOutput, ValidationError,
};
