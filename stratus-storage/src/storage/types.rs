//! Inputs and outputs of the storage operations.

use std::{
    collections::HashMap,
    time::{Duration, SystemTime},
};
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

use bytes::Bytes;
use url::Url;

use crate::{
    config::AccessLevel,
    provider::{ProgressCallback, TransferProgress},
};

/// Default validity of URLs returned by [`Storage::get_url`](crate::Storage::get_url).
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// Longest validity a URL may be requested for (7 days).
pub const MAX_URL_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Options shared by downloads.
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Access level; the configured default when `None`.
    pub access_level: Option<AccessLevel>,
    /// Read another identity's protected object.
    pub target_identity_id: Option<String>,
    /// Progress updates while the body is received.
    pub on_progress: Option<ProgressCallback>,
}

/// What to download.
#[derive(Debug, Clone)]
pub struct DownloadInput {
    /// Object key, relative to its access-level prefix.
    pub key: String,
    /// Download options.
    pub options: DownloadOptions,
}

impl DownloadInput {
    /// Download `key` with default options.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            options: DownloadOptions::default(),
        }
    }

    /// Set the access level.
    #[must_use]
    pub fn access_level(mut self, level: AccessLevel) -> Self {
        self.options.access_level = Some(level);
        self
    }

    /// Read another identity's protected object.
    #[must_use]
    pub fn target_identity_id(mut self, identity_id: impl Into<String>) -> Self {
        self.options.target_identity_id = Some(identity_id.into());
        self
    }

    /// Receive progress updates.
    #[must_use]
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(TransferProgress) + Send + Sync + 'static,
    {
        self.options.on_progress = Some(ProgressCallback::new(f));
        self
    }
}

/// A downloaded object.
#[derive(Debug, Clone)]
pub struct DownloadOutput {
    /// The key as given by the caller.
    pub key: String,
    /// Object data.
    pub body: Bytes,
    /// Last modification time.
    pub last_modified: Option<SystemTime>,
    /// Object size in bytes.
    pub size: Option<u64>,
    /// MIME type.
    pub content_type: Option<String>,
    /// Entity tag.
    pub etag: Option<String>,
    /// User-defined metadata.
    pub metadata: HashMap<String, String>,
    /// Object version, on versioned buckets.
    pub version_id: Option<String>,
}

/// An object saved to a local file.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct DownloadFileOutput {
    /// The key as given by the caller.
    pub key: String,
    /// Where the object was written.
    pub path: PathBuf,
    /// Bytes written.
    pub size: u64,
    /// Entity tag.
    pub etag: Option<String>,
}

/// Data to upload.
#[derive(Debug, Clone)]
pub enum UploadData {
    /// In-memory bytes.
    Bytes(Bytes),
    /// UTF-8 text.
    Text(String),
    /// A local file, read when the transfer starts.
    #[cfg(not(target_arch = "wasm32"))]
    File(PathBuf),
}

impl UploadData {
    /// Upload the contents of the file at `path`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        UploadData::File(path.into())
    }

    /// Size in bytes, when known without touching the file system.
    pub(crate) fn known_size(&self) -> Option<u64> {
        match self {
            UploadData::Bytes(bytes) => Some(bytes.len() as u64),
            UploadData::Text(text) => Some(text.len() as u64),
            #[cfg(not(target_arch = "wasm32"))]
            UploadData::File(_) => None,
        }
    }

    pub(crate) fn default_content_type(&self) -> &'static str {
        match self {
            UploadData::Text(_) => "text/plain; charset=utf-8",
            _ => "application/octet-stream",
        }
    }
}

impl From<Bytes> for UploadData {
    fn from(bytes: Bytes) -> Self {
        UploadData::Bytes(bytes)
    }
}

impl From<Vec<u8>> for UploadData {
    fn from(bytes: Vec<u8>) -> Self {
        UploadData::Bytes(bytes.into())
    }
}

impl From<&'static [u8]> for UploadData {
    fn from(bytes: &'static [u8]) -> Self {
        UploadData::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for UploadData {
    fn from(text: String) -> Self {
        UploadData::Text(text)
    }
}

impl From<&str> for UploadData {
    fn from(text: &str) -> Self {
        UploadData::Text(text.to_string())
    }
}

/// Options for uploads.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Access level; the configured default when `None`.
    pub access_level: Option<AccessLevel>,
    /// MIME type. Defaults to `text/plain` for text and `application/octet-stream`
    /// otherwise.
    pub content_type: Option<String>,
    /// User-defined metadata stored with the object.
    pub metadata: HashMap<String, String>,
    /// Progress updates while the body is sent.
    pub on_progress: Option<ProgressCallback>,
}

/// What to upload, and where.
#[derive(Debug, Clone)]
pub struct UploadInput {
    /// Object key, relative to its access-level prefix.
    pub key: String,
    /// Object data.
    pub data: UploadData,
    /// Upload options.
    pub options: UploadOptions,
}

impl UploadInput {
    /// Upload `data` to `key` with default options.
    pub fn new(key: impl Into<String>, data: impl Into<UploadData>) -> Self {
        Self {
            key: key.into(),
            data: data.into(),
            options: UploadOptions::default(),
        }
    }

    /// Set the access level.
    #[must_use]
    pub fn access_level(mut self, level: AccessLevel) -> Self {
        self.options.access_level = Some(level);
        self
    }

    /// Set the MIME type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.options.content_type = Some(content_type.into());
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.metadata.insert(key.into(), value.into());
        self
    }

    /// Receive progress updates.
    #[must_use]
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(TransferProgress) + Send + Sync + 'static,
    {
        self.options.on_progress = Some(ProgressCallback::new(f));
        self
    }
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutput {
    /// The key as given by the caller.
    pub key: String,
    /// Entity tag.
    pub etag: Option<String>,
    /// Object version, on versioned buckets.
    pub version_id: Option<String>,
    /// MIME type the object was stored with.
    pub content_type: Option<String>,
    /// Bytes uploaded.
    pub size: u64,
    /// User-defined metadata.
    pub metadata: HashMap<String, String>,
}

/// Options for [`Storage::get_url`](crate::Storage::get_url).
#[derive(Debug, Clone)]
pub struct GetUrlOptions {
    /// Access level; the configured default when `None`.
    pub access_level: Option<AccessLevel>,
    /// Link to another identity's protected object.
    pub target_identity_id: Option<String>,
    /// How long the URL should stay valid.
    pub expires_in: Duration,
}

impl Default for GetUrlOptions {
    fn default() -> Self {
        Self {
            access_level: None,
            target_identity_id: None,
            expires_in: DEFAULT_URL_EXPIRY,
        }
    }
}

/// Which object to link to.
#[derive(Debug, Clone)]
pub struct GetUrlInput {
    /// Object key, relative to its access-level prefix.
    pub key: String,
    /// URL options.
    pub options: GetUrlOptions,
}

impl GetUrlInput {
    /// Link to `key` with default options.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            options: GetUrlOptions::default(),
        }
    }

    /// Set the access level.
    #[must_use]
    pub fn access_level(mut self, level: AccessLevel) -> Self {
        self.options.access_level = Some(level);
        self
    }

    /// Link to another identity's protected object.
    #[must_use]
    pub fn target_identity_id(mut self, identity_id: impl Into<String>) -> Self {
        self.options.target_identity_id = Some(identity_id.into());
        self
    }

    /// Set the validity period.
    #[must_use]
    pub fn expires_in(mut self, expires_in: Duration) -> Self {
        self.options.expires_in = expires_in;
        self
    }
}

/// A direct link to an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUrlOutput {
    /// The object URL.
    pub url: Url,
    /// When the URL stops being valid.
    pub expires_at: SystemTime,
}
