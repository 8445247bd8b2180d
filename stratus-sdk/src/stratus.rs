//! High-level facade for the Stratus SDK.
//!
//! ## Mental model
//! - [`Stratus`]: your entry point. Owns a [`Hub`] and, when configured, a [`Storage`].
//! - [`Hub`]: in-process events. SDK modules publish on protected channels such as
//!   `core` and `storage`; applications listen on them or use channels of their own.
//! - [`Storage`]: cancelable, resumable object transfers.
//!
//! ## Quick start
//! ```no_run
//! use stratus::{Capsule, ConfigToml, DownloadInput, Stratus};
//!
//! # async fn run() -> stratus::Result<()> {
//! let config = ConfigToml::from_str_with_defaults(r#"
//!     [storage]
//!     bucket = "photos"
//!     region = "eu-west-1"
//! "#)?;
//! let stratus = Stratus::from_config(config)?;
//!
//! let _off = stratus.hub().listen("storage", |capsule: &Capsule| {
//!     println!("{:?}", capsule.payload.message);
//! }, None);
//!
//! let task = stratus.storage()?.download(DownloadInput::new("cat.jpg"))?;
//! let cat = task.result().await?;
//! println!("{} bytes", cat.body.len());
//! # Ok(()) }
//! ```

use std::path::Path;

use serde_json::json;
use stratus_core::{cross_log, AccessToken, Hub, Payload};
use stratus_storage::Storage;

use crate::{errors::ConfigError, ConfigToml, Result};

/// Channel the facade reports lifecycle events on.
pub const CORE_CHANNEL: &str = "core";

/// High-level facade. Cheap to clone; clones share the hub and the storage provider.
#[derive(Clone, Debug)]
pub struct Stratus {
    hub: Hub,
    storage: Option<Storage>,
    config: ConfigToml,
}

impl Default for Stratus {
    fn default() -> Self {
        Self::new()
    }
}

impl Stratus {
    /// Construct with the embedded default configuration: the global hub, no storage.
    pub fn new() -> Self {
        Self {
            hub: Hub::global(),
            storage: None,
            config: ConfigToml::default(),
        }
    }

    /// Construct from a configuration.
    ///
    /// With a `[storage]` section, storage is served over HTTP from the configured
    /// endpoint or region. Dispatches `configured` on the `core` channel.
    ///
    /// # Errors
    /// - [`Error::Storage`](crate::Error::Storage) if the storage section names no
    ///   endpoint or region, or the HTTP client cannot be built.
    pub fn from_config(config: ConfigToml) -> Result<Self> {
        let hub = Hub::global();

        #[cfg(not(target_arch = "wasm32"))]
        let storage = config
            .storage
            .clone()
            .map(Storage::http)
            .transpose()?
            .map(|storage| storage.with_hub(hub.clone()));
        #[cfg(target_arch = "wasm32")]
        let storage = None;

        let stratus = Self {
            hub,
            storage,
            config,
        };
        stratus.announce();
        Ok(stratus)
    }

    /// Read `path` (overlaid on the defaults) and construct from it.
    ///
    /// # Errors
    /// - [`Error::Config`](crate::Error::Config) if the file cannot be read or parsed.
    /// - Anything [`from_config`](Self::from_config) fails with.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(ConfigToml::from_file(path)?)
    }

    /// Use `hub` instead of the global hub, for this facade and its storage.
    #[must_use]
    pub fn with_hub(mut self, hub: Hub) -> Self {
        self.storage = self.storage.map(|storage| storage.with_hub(hub.clone()));
        self.hub = hub;
        self
    }

    /// Use an explicitly built storage (custom provider, in-memory store).
    ///
    /// Transfer outcomes are reported on this facade's hub.
    #[must_use]
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage.with_hub(self.hub.clone()));
        self
    }

    /// The event hub.
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// The storage module.
    ///
    /// # Errors
    /// - [`ConfigError::MissingSection`] if storage was neither configured nor provided.
    pub fn storage(&self) -> Result<&Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("storage").into())
    }

    /// The configuration this facade was built from.
    pub fn config(&self) -> &ConfigToml {
        &self.config
    }

    fn announce(&self) {
        let mut modules = vec!["Hub"];
        if self.storage.is_some() {
            modules.push("Storage");
        }
        cross_log!(info, "Stratus configured with {}", modules.join(", "));

        self.hub.dispatch_with(
            CORE_CHANNEL,
            Payload::new("configured")
                .with_data(json!({ "modules": modules }))
                .with_message("Stratus configured"),
            "Core",
            Some(AccessToken::internal()),
        );
    }
}
