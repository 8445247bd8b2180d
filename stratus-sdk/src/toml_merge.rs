//! Deep merge of a user TOML document over the embedded defaults.
//!
//! Tables merge key by key. Every other value, arrays included, is replaced by the
//! user's value as long as both sides have the same TOML type.

use thiserror::Error;
use toml::{Table, Value};

/// A user value has a different TOML type than the default it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("incompatible types at `{path}`: expected {expected}, found {found}")]
pub struct MergeError {
    /// Dotted path of the offending key, e.g. `storage.chunk_size`.
    pub path: String,
    /// Type of the default value.
    pub expected: &'static str,
    /// Type of the user value.
    pub found: &'static str,
}

/// Overlay `user` onto `defaults`.
pub(crate) fn merge(mut defaults: Table, user: Table) -> Result<Table, MergeError> {
    merge_into(&mut defaults, user, "")?;
    Ok(defaults)
}

fn merge_into(base: &mut Table, overlay: Table, prefix: &str) -> Result<(), MergeError> {
    for (key, incoming) in overlay {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        let merged = match base.remove(&key) {
            None => incoming,
            Some(Value::Table(mut existing)) => match incoming {
                Value::Table(inner) => {
                    merge_into(&mut existing, inner, &path)?;
                    Value::Table(existing)
                }
                other => return Err(mismatch(path, "table", &other)),
            },
            Some(existing) if existing.same_type(&incoming) => incoming,
            Some(existing) => return Err(mismatch(path, existing.type_str(), &incoming)),
        };
        base.insert(key, merged);
    }
    Ok(())
}

fn mismatch(path: String, expected: &'static str, found: &Value) -> MergeError {
    MergeError {
        path,
        expected,
        found: found.type_str(),
    }
}
