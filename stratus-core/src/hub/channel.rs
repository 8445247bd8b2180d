use std::fmt::{self, Display};

use regex::Regex;

use crate::errors::HubError;

/// Where a listener is attached: an exact channel name, or a regular expression
/// matched against the `message` of every dispatched payload.
///
/// Patterns are identified by their source text, so two `Regex` values built from
/// the same source refer to the same pattern channel.
#[derive(Debug, Clone)]
pub enum Channel {
    /// Exact-match channel such as `"auth"` or `"storage"`.
    Name(String),
    /// Pattern channel; receives every dispatch whose `message` matches.
    Pattern(Regex),
}

impl Channel {
    /// Exact-match channel.
    pub fn name(name: impl Into<String>) -> Self {
        Channel::Name(name.into())
    }

    /// Compile `source` into a pattern channel.
    ///
    /// # Errors
    /// - [`HubError::InvalidPattern`] if `source` is not a valid regular expression.
    pub fn pattern(source: &str) -> Result<Self, HubError> {
        Ok(Channel::Pattern(Regex::new(source)?))
    }

    /// Whether this is a pattern channel.
    pub fn is_pattern(&self) -> bool {
        matches!(self, Channel::Pattern(_))
    }

    /// The channel name, or the pattern source text.
    pub fn as_str(&self) -> &str {
        match self {
            Channel::Name(name) => name,
            Channel::Pattern(pattern) => pattern.as_str(),
        }
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Channel::Name(a), Channel::Name(b)) => a == b,
            (Channel::Pattern(a), Channel::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Channel {}

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Name(name) => f.write_str(name),
            Channel::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
        }
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Channel::Name(name.to_string())
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Channel::Name(name)
    }
}

impl From<&String> for Channel {
    fn from(name: &String) -> Self {
        Channel::Name(name.clone())
    }
}

impl From<Regex> for Channel {
    fn from(pattern: Regex) -> Self {
        Channel::Pattern(pattern)
    }
}

impl From<&Regex> for Channel {
    fn from(pattern: &Regex) -> Self {
        Channel::Pattern(pattern.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_never_patterns() {
        let channel = Channel::from("^order-(\\d+)$");
        assert!(!channel.is_pattern());
        assert_eq!(channel.as_str(), "^order-(\\d+)$");
    }

    #[test]
    fn patterns_compare_by_source() {
        let a = Channel::pattern("^order-(\\d+)$").unwrap();
        let b = Channel::from(Regex::new("^order-(\\d+)$").unwrap());
        assert_eq!(a, b);
        assert_ne!(a, Channel::name("^order-(\\d+)$"));
        assert_eq!(a.to_string(), "/^order-(\\d+)$/");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = Channel::pattern("order-(").unwrap_err();
        assert!(matches!(err, HubError::InvalidPattern(_)));
    }
}
