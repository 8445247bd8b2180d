//! Error types for the event hub.
//!
//! Dispatching never fails: listener failures are contained by the hub and only
//! logged. The only fallible hub operation is building a pattern channel from
//! source text.

use thiserror::Error;

/// Errors produced while configuring hub listeners.
#[derive(Debug, Error)]
pub enum HubError {
    /// The channel pattern is not a valid regular expression.
    #[error("Invalid channel pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
