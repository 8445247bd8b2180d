//! Error types for storage transfers.
//!
//! Every operation reports a [`StorageError`], which separates:
//! - [`StorageError::Validation`]: the caller's input was rejected before any I/O.
//! - [`StorageError::Service`]: the storage provider failed or answered with an error.
//! - [`StorageError::Canceled`]: the transfer was canceled; see [`is_cancel_error`].
//! - [`StorageError::Io`]: reading or writing a local file failed.
//!
//! No operation retries. Service errors surface exactly as the provider reported them.

use thiserror::Error;

/// Largest object a single upload accepts (5 TiB).
pub const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024 * 1024;

/// The crate's top-level error type.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Malformed or missing caller input. Raised before any network call.
    #[error("Invalid storage request: {0}")]
    Validation(#[from] ValidationError),

    /// The storage provider failed (transport) or returned an error response.
    #[error("Storage service error: {0}")]
    Service(#[from] ServiceError),

    /// The transfer was canceled with [`cancel`](crate::TransferTask::cancel).
    #[error("Transfer canceled{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Canceled {
        /// Reason given to `cancel`, if any.
        reason: Option<String>,
    },

    /// A local file could not be read or written.
    #[error("Local file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether this error was produced by canceling the transfer.
    pub fn is_cancel_error(&self) -> bool {
        matches!(self, StorageError::Canceled { .. })
    }

    pub(crate) fn canceled(reason: Option<String>) -> Self {
        StorageError::Canceled { reason }
    }
}

/// Whether `error` was produced by canceling a transfer.
pub fn is_cancel_error(error: &StorageError) -> bool {
    error.is_cancel_error()
}

/// Caller input rejected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The object key is empty.
    #[error("Missing key in request")]
    NoKey,

    /// No bucket is configured.
    #[error("Missing bucket name while accessing object")]
    NoBucket,

    /// `protected`/`private` access needs an identity id and none is known.
    #[error("Missing identity ID when accessing objects in protected or private access level")]
    NoIdentityId,

    /// `target_identity_id` is only meaningful for `protected` access.
    #[error("`target_identity_id` can only be used with the protected access level")]
    InvalidTargetIdentity,

    /// The upload payload exceeds [`MAX_OBJECT_SIZE`].
    #[error("Object size {size} exceeds the maximum of {MAX_OBJECT_SIZE} bytes")]
    ObjectTooLarge {
        /// Size of the rejected payload in bytes.
        size: u64,
    },

    /// Neither an endpoint nor a region is configured.
    #[error("Missing endpoint or region in storage configuration")]
    NoEndpoint,

    /// A transfer chunk size of zero was configured.
    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,

    /// URL expiry must be positive and at most seven days.
    #[error("URL expiration must be between 1 second and 7 days, got {seconds}s")]
    InvalidUrlExpiry {
        /// Requested expiry in seconds.
        seconds: u64,
    },
}

/// Failures reported by (or while talking to) the storage provider.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network/protocol failure from reqwest (timeouts, TLS, I/O, etc.).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider returned a non-success status.
    #[error("Server responded with an error: {status} - {message}")]
    Server {
        /// HTTP-like status code.
        status: u16,
        /// Response body or a short description.
        message: String,
    },

    /// A provider-specific failure that has no status code.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl ServiceError {
    /// Whether the provider reported that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Server { status: 404, .. })
    }
}

// Staircase conversions so `?` lifts lower-level errors straight to `StorageError`.
macro_rules! impl_from_for_error {
    ($from_type:ty, $to_variant:path) => {
        impl From<$from_type> for StorageError {
            fn from(err: $from_type) -> Self {
                $to_variant(err.into())
            }
        }
    };
}

impl_from_for_error!(reqwest::Error, StorageError::Service);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_errors_are_classified() {
        let canceled = StorageError::canceled(Some("user left".into()));
        assert!(is_cancel_error(&canceled));
        assert_eq!(canceled.to_string(), "Transfer canceled: user left");
        assert_eq!(
            StorageError::canceled(None).to_string(),
            "Transfer canceled"
        );

        let validation = StorageError::from(ValidationError::NoKey);
        assert!(!validation.is_cancel_error());
    }

    #[test]
    fn not_found_is_detected_from_status() {
        let err = ServiceError::Server {
            status: 404,
            message: "NoSuchKey".into(),
        };
        assert!(err.is_not_found());
        assert!(!ServiceError::Provider("boom".into()).is_not_found());
    }
}
