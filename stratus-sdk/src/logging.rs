//! Tracing initialization from the `[logging]` section.
//!
//! Call it once, early, so configuration and transfer logs aren't lost. `RUST_LOG`
//! takes precedence over the configured levels when it is set.

use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    EnvFilter,
};

use crate::{config::LoggingToml, errors::LoggingError};

/// Install a global `fmt` subscriber filtered by `config` (or `RUST_LOG`).
///
/// # Errors
/// - [`LoggingError::InvalidDirective`] if a configured level cannot be parsed.
/// - [`LoggingError::Init`] if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingToml) -> Result<(), LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => env_filter(config)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

/// The filter described by `config`, ignoring the environment.
///
/// # Errors
/// - [`LoggingError::InvalidDirective`] for a `level` that isn't a plain level, or a
///   module entry without a `target=level` form.
pub fn env_filter(config: &LoggingToml) -> Result<EnvFilter, LoggingError> {
    let level = config
        .level
        .parse::<LevelFilter>()
        .map_err(|err| invalid(&config.level, &err.to_string()))?;
    let mut filter = EnvFilter::new("").add_directive(level.into());

    for module_level in &config.module_levels {
        if !module_level.contains('=') {
            return Err(invalid(module_level, "expected `target=level`"));
        }
        filter = filter.add_directive(directive(module_level)?);
    }
    Ok(filter)
}

fn directive(raw: &str) -> Result<Directive, LoggingError> {
    raw.parse::<Directive>()
        .map_err(|err| invalid(raw, &err.to_string()))
}

fn invalid(directive: &str, reason: &str) -> LoggingError {
    LoggingError::InvalidDirective {
        directive: directive.to_string(),
        reason: reason.to_string(),
    }
}
