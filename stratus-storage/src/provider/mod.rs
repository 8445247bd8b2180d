//! The seam between transfer orchestration and an actual object store.
//!
//! Providers receive the task's [`TransferControl`] and are expected to stop at
//! their next checkpoint once the task is paused or canceled.

#[cfg(not(target_arch = "wasm32"))]
mod http;
mod memory;

use std::{collections::HashMap, fmt, sync::Arc, time::Duration, time::SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpStorageProvider;
pub use memory::InMemoryProvider;

use crate::{errors::StorageError, transfer::TransferControl};

/// Bytes moved so far by a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes transferred so far.
    pub transferred_bytes: u64,
    /// Total size, when known up front.
    pub total_bytes: Option<u64>,
}

/// Callback receiving [`TransferProgress`] updates, once per chunk.
#[derive(Clone)]
pub struct ProgressCallback(Arc<dyn Fn(TransferProgress) + Send + Sync>);

impl ProgressCallback {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(TransferProgress) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressCallback")
    }
}

/// Running byte count for one transfer.
#[derive(Debug)]
pub(crate) struct Progress {
    callback: Option<ProgressCallback>,
    transferred: u64,
    total: Option<u64>,
}

impl Progress {
    pub(crate) fn new(callback: Option<ProgressCallback>, total: Option<u64>) -> Self {
        Self {
            callback,
            transferred: 0,
            total,
        }
    }

    pub(crate) fn advance(&mut self, bytes: usize) {
        self.transferred += bytes as u64;
        if let Some(callback) = &self.callback {
            (callback.0)(TransferProgress {
                transferred_bytes: self.transferred,
                total_bytes: self.total,
            });
        }
    }
}

/// Split `body` into zero-copy chunks of at most `chunk_size` bytes.
pub(crate) fn chunks(body: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    (0..body.len())
        .step_by(chunk_size)
        .map(|start| body.slice(start..(start + chunk_size).min(body.len())))
        .collect()
}

/// Request for a single object.
#[derive(Debug, Clone)]
pub struct GetObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Full object key (prefix included).
    pub key: String,
    /// Preferred delivery chunk size.
    pub chunk_size: usize,
    /// Progress updates while the body is received.
    pub on_progress: Option<ProgressCallback>,
}

/// A downloaded object as reported by the provider.
#[derive(Debug, Clone, Default)]
pub struct GetObjectOutput {
    /// Object data.
    pub body: Bytes,
    /// Last modification time.
    pub last_modified: Option<SystemTime>,
    /// Object size in bytes.
    pub content_length: Option<u64>,
    /// Entity tag.
    pub etag: Option<String>,
    /// User-defined metadata.
    pub metadata: HashMap<String, String>,
    /// Version of the object, on versioned buckets.
    pub version_id: Option<String>,
    /// MIME type.
    pub content_type: Option<String>,
}

/// Request storing a single object.
#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Full object key (prefix included).
    pub key: String,
    /// Object data.
    pub body: Bytes,
    /// MIME type.
    pub content_type: Option<String>,
    /// User-defined metadata.
    pub metadata: HashMap<String, String>,
    /// Size of the chunks the body is sent in.
    pub chunk_size: usize,
    /// Progress updates while the body is sent.
    pub on_progress: Option<ProgressCallback>,
}

/// What the provider reports after storing an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// Entity tag of the stored object.
    pub etag: Option<String>,
    /// Version of the stored object, on versioned buckets.
    pub version_id: Option<String>,
}

/// An object store the [`Storage`](crate::Storage) orchestrators can drive.
#[async_trait]
pub trait StorageProvider: Send + Sync + fmt::Debug {
    /// Fetch an object, observing `control` between chunks.
    async fn get_object(
        &self,
        request: GetObjectRequest,
        control: &TransferControl,
    ) -> Result<GetObjectOutput, StorageError>;

    /// Store an object, observing `control` between chunks.
    async fn put_object(
        &self,
        request: PutObjectRequest,
        control: &TransferControl,
    ) -> Result<PutObjectOutput, StorageError>;

    /// URL through which the object can be fetched directly, valid for `expires_in`.
    fn object_url(&self, bucket: &str, key: &str, expires_in: Duration)
        -> Result<Url, StorageError>;
}
