//! Unified error types for the `stratus` crate.
//!
//! Every fallible call on the facade returns [`Error`], which wraps the error of
//! the module that failed. Lower-level errors convert into it via `From`, so `?`
//! works across module boundaries.

use thiserror::Error;

use stratus_core::HubError;
use stratus_storage::{ServiceError, StorageError, ValidationError};

use crate::toml_merge::MergeError;

/// The crate's top-level error type.
///
/// - [`Error::Hub`]: a hub channel could not be built (invalid pattern).
/// - [`Error::Storage`]: validation, provider, cancellation or local I/O failures.
/// - [`Error::Config`]: the configuration could not be read or is incomplete.
/// - [`Error::Logging`]: the tracing subscriber could not be installed.
#[derive(Debug, Error)]
pub enum Error {
    /// Hub operation failed.
    #[error("Hub error: {0}")]
    Hub(#[from] HubError),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration is unreadable or incomplete.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

impl Error {
    /// Whether this error comes from a canceled transfer.
    pub fn is_cancel_error(&self) -> bool {
        matches!(self, Error::Storage(err) if err.is_cancel_error())
    }
}

/// Errors that can occur while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file did not exist or could not be read.
    #[error("config file not found: {0}")]
    NotFound(#[from] std::io::Error),

    /// The TOML was syntactically invalid or does not describe a configuration.
    #[error("config file is not valid TOML: {0}")]
    Invalid(#[from] toml::de::Error),

    /// Failed to merge defaults with overrides.
    #[error("failed to merge embedded and user TOML: {0}")]
    Merge(#[from] MergeError),

    /// A module was used that has no section in the configuration.
    #[error("no [{0}] section in the configuration")]
    MissingSection(&'static str),
}

/// Errors that can occur while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A level or module directive could not be parsed.
    #[error("invalid log directive `{directive}`: {reason}")]
    InvalidDirective {
        /// The rejected directive.
        directive: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("failed to initialize tracing: {0}")]
    Init(String),
}

/// Convenient alias for results in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// --- Staircase conversions into the top-level error ---

macro_rules! impl_from_for_error {
    ($from_type:ty, $to_variant:path) => {
        impl From<$from_type> for Error {
            fn from(err: $from_type) -> Self {
                $to_variant(err.into())
            }
        }
    };
}

// Storage errors
impl_from_for_error!(ValidationError, Error::Storage);
impl_from_for_error!(ServiceError, Error::Storage);

// Config errors
impl_from_for_error!(toml::de::Error, Error::Config);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_level_errors_climb_the_staircase() {
        let err: Error = ValidationError::NoBucket.into();
        assert!(matches!(
            err,
            Error::Storage(StorageError::Validation(ValidationError::NoBucket))
        ));

        let err: Error = ConfigError::MissingSection("storage").into();
        assert_eq!(
            err.to_string(),
            "Configuration error: no [storage] section in the configuration"
        );
    }

    #[test]
    fn cancel_errors_are_recognized_through_the_facade() {
        let canceled: Error = StorageError::Canceled { reason: None }.into();
        assert!(canceled.is_cancel_error());
        let other: Error = ValidationError::NoKey.into();
        assert!(!other.is_cancel_error());
    }
}
