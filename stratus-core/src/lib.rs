#![doc = include_str!("../README.md")]
//!

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(any(), deny(clippy::unwrap_used))]

mod macros;

pub mod errors;
pub mod hub;

pub use errors::HubError;
pub use hub::{
    AccessToken, Capsule, Channel, Hub, HubCallback, HubCapsuleHandler, Listener, Payload,
    Unsubscribe, DEFAULT_HUB_NAME, PROTECTED_CHANNELS,
};

// Used by `cross_log!` so that dependents don't need their own logging crate.
#[doc(hidden)]
#[cfg(target_arch = "wasm32")]
pub use log as __log;
#[doc(hidden)]
#[cfg(not(target_arch = "wasm32"))]
pub use tracing as __tracing;
