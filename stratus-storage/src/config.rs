//! Storage configuration and object location resolution.
//!
//! Keys given by callers are relative: the final object key is prefixed according
//! to the access level, mirroring how objects are laid out in the bucket:
//!
//! | access level | prefix                    |
//! |--------------|---------------------------|
//! | `guest`      | `public/`                 |
//! | `protected`  | `protected/{identity}/`   |
//! | `private`    | `private/{identity}/`     |

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ValidationError;

/// Default size of the chunks a transfer is split into (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Who may read an object, which also decides its key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Readable by everyone; stored under `public/`.
    #[default]
    Guest,
    /// Readable by everyone, writable by the owner; stored under `protected/{identity}/`.
    Protected,
    /// Only the owner; stored under `private/{identity}/`.
    Private,
}

impl Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessLevel::Guest => "guest",
            AccessLevel::Protected => "protected",
            AccessLevel::Private => "private",
        })
    }
}

/// `[storage]` section of the application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding the objects.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Region of the bucket. Used to derive the endpoint when none is set.
    #[serde(default)]
    pub region: Option<String>,
    /// Base URL of the object store (path-style: `{endpoint}/{bucket}/{key}`).
    #[serde(default)]
    pub endpoint: Option<Url>,
    /// Access level used when an operation doesn't specify one.
    #[serde(default)]
    pub default_access_level: AccessLevel,
    /// Identity of the signed-in user, needed for protected and private objects.
    #[serde(default)]
    pub identity_id: Option<String>,
    /// Size of the chunks bodies are streamed in; pause and cancel take effect
    /// between chunks.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            endpoint: None,
            default_access_level: AccessLevel::default(),
            identity_id: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Where an operation reads or writes, after configuration was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    /// Bucket name.
    pub bucket: String,
    /// Access-level prefix, e.g. `protected/us-east-1:abc/`.
    pub key_prefix: String,
    /// Full object key: `key_prefix` followed by the caller's key.
    pub key: String,
}

impl StorageConfig {
    /// Configuration for `bucket` with every other setting at its default.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            ..Self::default()
        }
    }

    /// Set the region.
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the signed-in identity.
    #[must_use]
    pub fn identity_id(mut self, identity_id: impl Into<String>) -> Self {
        self.identity_id = Some(identity_id.into());
        self
    }

    /// Set the default access level.
    #[must_use]
    pub fn default_access_level(mut self, level: AccessLevel) -> Self {
        self.default_access_level = level;
        self
    }

    /// Set the transfer chunk size.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// The configured endpoint, or the regional path-style endpoint when only a
    /// region is known.
    pub fn endpoint_url(&self) -> Option<Url> {
        if let Some(endpoint) = &self.endpoint {
            return Some(endpoint.clone());
        }
        let region = self.region.as_deref()?;
        Url::parse(&format!("https://s3.{region}.amazonaws.com")).ok()
    }

    /// Validate the request and compute the object's bucket and final key.
    ///
    /// # Errors
    /// - [`ValidationError::NoKey`] for an empty key.
    /// - [`ValidationError::NoBucket`] when no bucket is configured.
    /// - [`ValidationError::InvalidChunkSize`] when the chunk size is zero.
    /// - [`ValidationError::InvalidTargetIdentity`] when `target_identity_id` is used
    ///   with an access level other than `protected`.
    /// - [`ValidationError::NoIdentityId`] for protected/private access without an identity.
    pub fn resolve(
        &self,
        key: &str,
        access_level: Option<AccessLevel>,
        target_identity_id: Option<&str>,
    ) -> Result<ObjectLocation, ValidationError> {
        if key.is_empty() {
            return Err(ValidationError::NoKey);
        }

        let bucket = match self.bucket.as_deref() {
            Some(bucket) if !bucket.is_empty() => bucket.to_string(),
            _ => return Err(ValidationError::NoBucket),
        };

        if self.chunk_size == 0 {
            return Err(ValidationError::InvalidChunkSize);
        }

        let level = access_level.unwrap_or(self.default_access_level);
        if target_identity_id.is_some() && level != AccessLevel::Protected {
            return Err(ValidationError::InvalidTargetIdentity);
        }

        let identity = target_identity_id.or(self.identity_id.as_deref());
        let key_prefix = match level {
            AccessLevel::Guest => "public/".to_string(),
            AccessLevel::Protected => {
                format!("protected/{}/", identity.ok_or(ValidationError::NoIdentityId)?)
            }
            AccessLevel::Private => {
                format!("private/{}/", identity.ok_or(ValidationError::NoIdentityId)?)
            }
        };

        Ok(ObjectLocation {
            bucket,
            key: format!("{key_prefix}{key}"),
            key_prefix,
        })
    }
}
