//! Global, resettable [`Stratus`] instance.
//!
//! Applications that configure the SDK once at startup can reach it from anywhere
//! with [`global`]. Reads are lock-free and return a cheap clone; replacing or
//! clearing the slot never invalidates clones handed out earlier.
//!
//! ```
//! # use stratus::{configure, global, reset_global, ConfigToml};
//! let configured = configure(ConfigToml::default())?;
//! assert_eq!(global().hub().name(), configured.hub().name());
//!
//! reset_global();
//! let fresh = global(); // built from defaults on demand
//! # Ok::<(), stratus::Error>(())
//! ```

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;

use crate::{ConfigToml, Result, Stratus};

/// Process-wide slot for the optional default instance.
static GLOBAL_STRATUS: OnceLock<ArcSwapOption<Stratus>> = OnceLock::new();

#[inline]
fn slot() -> &'static ArcSwapOption<Stratus> {
    GLOBAL_STRATUS.get_or_init(|| ArcSwapOption::from(None))
}

/// Build a [`Stratus`] from `config` and publish it as the global instance.
///
/// # Errors
/// - Whatever [`Stratus::from_config`] fails with. The global slot is left untouched.
pub fn configure(config: ConfigToml) -> Result<Stratus> {
    let stratus = Stratus::from_config(config)?;
    set_global(stratus.clone());
    Ok(stratus)
}

/// Get-or-init the global instance.
///
/// Without a prior [`configure`] or [`set_global`], an instance without storage is
/// created on first use.
pub fn global() -> Stratus {
    if let Some(current) = slot().load_full() {
        return current.as_ref().clone();
    }

    let fresh = Stratus::new();
    slot().store(Some(Arc::new(fresh.clone())));
    fresh
}

/// Replace the global instance.
pub fn set_global(stratus: Stratus) {
    slot().store(Some(Arc::new(stratus)));
}

/// Clear the global instance; the next [`global`] call builds a fresh one.
pub fn reset_global() {
    slot().store(None);
}
