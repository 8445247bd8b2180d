//! Download/upload orchestration on top of a [`StorageProvider`].
//!
//! Every transfer is validated synchronously: invalid input fails the call itself
//! and no task is started. Valid transfers run in the background and are observed
//! through the returned [`TransferTask`](crate::TransferTask) or
//! [`ResumableTransferTask`](crate::ResumableTransferTask).

mod download;
mod links;
mod types;
mod upload;

use std::sync::Arc;

use serde_json::json;
use stratus_core::{cross_log, AccessToken, Hub, Payload};

pub use types::*;

use crate::{config::StorageConfig, errors::StorageError, provider::StorageProvider};

/// Channel storage events are dispatched on.
pub const STORAGE_CHANNEL: &str = "storage";

/// Source reported in storage event capsules.
pub const STORAGE_SOURCE: &str = "Storage";

/// Object storage bound to a provider and a configuration.
///
/// Cheap to clone: clones share the provider and the hub.
#[derive(Debug, Clone)]
pub struct Storage {
    provider: Arc<dyn StorageProvider>,
    config: StorageConfig,
    hub: Option<Hub>,
}

impl Storage {
    /// Storage driving `provider` with `config`.
    pub fn new(provider: impl StorageProvider + 'static, config: StorageConfig) -> Self {
        Self::with_provider(Arc::new(provider), config)
    }

    /// Storage driving a shared provider.
    pub fn with_provider(provider: Arc<dyn StorageProvider>, config: StorageConfig) -> Self {
        Self {
            provider,
            config,
            hub: None,
        }
    }

    /// Storage over HTTP at the configured endpoint (or the region's endpoint).
    ///
    /// # Errors
    /// - [`ValidationError::NoEndpoint`](crate::ValidationError::NoEndpoint) if neither
    ///   an endpoint nor a region is configured.
    /// - [`ServiceError::Transport`](crate::ServiceError::Transport) if the HTTP client
    ///   cannot be built.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn http(config: StorageConfig) -> Result<Self, StorageError> {
        let endpoint = config
            .endpoint_url()
            .ok_or(crate::ValidationError::NoEndpoint)?;
        let provider = crate::provider::HttpStorageProvider::new(endpoint)?;
        Ok(Self::new(provider, config))
    }

    /// Report transfer outcomes on `hub`'s `storage` channel.
    #[must_use]
    pub fn with_hub(mut self, hub: Hub) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Replace the signed-in identity used for protected and private objects.
    #[must_use]
    pub fn with_identity_id(mut self, identity_id: impl Into<String>) -> Self {
        self.config.identity_id = Some(identity_id.into());
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// The hub outcomes are reported on, if any.
    pub fn hub(&self) -> Option<&Hub> {
        self.hub.as_ref()
    }
}

/// Which transfer an event reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Download,
    Upload,
}

impl Operation {
    fn event(self) -> &'static str {
        match self {
            Operation::Download => "download",
            Operation::Upload => "upload",
        }
    }

    fn method(self) -> &'static str {
        match self {
            Operation::Download => "get",
            Operation::Upload => "put",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Operation::Download => "Download",
            Operation::Upload => "Upload",
        }
    }
}

/// Settlement hook reporting a transfer's final outcome on `hub`.
pub(crate) fn reporter<T: 'static>(
    hub: Option<Hub>,
    operation: Operation,
    key: String,
) -> impl FnOnce(&Result<T, StorageError>) + Send + 'static {
    move |outcome| report(hub.as_ref(), operation, &key, outcome)
}

/// Dispatch the outcome of a settled transfer. Cancellations are not reported.
pub(crate) fn report<T>(
    hub: Option<&Hub>,
    operation: Operation,
    key: &str,
    outcome: &Result<T, StorageError>,
) {
    let Some(hub) = hub else {
        return;
    };

    let payload = match outcome {
        Ok(_) => Payload::new(operation.event())
            .with_data(json!({ "method": operation.method(), "result": "success", "key": key }))
            .with_message(format!("{} success for {key}", operation.label())),
        Err(err) if err.is_cancel_error() => return,
        Err(err) => Payload::new(format!("{}_failure", operation.event()))
            .with_data(json!({ "method": operation.method(), "result": "failed", "key": key }))
            .with_message(format!("{} failed with {err}", operation.label())),
    };

    cross_log!(debug, "Storage event {} for {}", payload.event, key);
    hub.dispatch_with(
        STORAGE_CHANNEL,
        payload,
        STORAGE_SOURCE,
        Some(AccessToken::internal()),
    );
}
