use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// What a publisher sends on a channel.
///
/// `message` is optional for exact-match listeners, but pattern listeners only
/// ever see payloads that carry one: patterns are matched against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Event name, e.g. `"signIn"` or `"download"`.
    pub event: String,
    /// Arbitrary event data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Free-form text used for pattern matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Payload {
    /// Payload with only an event name.
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: None,
            message: None,
        }
    }

    /// Attach event data.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Attach a message for pattern listeners.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The envelope delivered to a listener for one dispatch.
///
/// A capsule is built once per dispatch. Pattern listeners receive their own copy
/// with `pattern_info` holding the capture groups of their match.
#[derive(Debug, Clone, PartialEq)]
pub struct Capsule {
    /// Channel the payload was dispatched on.
    pub channel: String,
    /// Copy of the dispatched payload.
    pub payload: Payload,
    /// Who dispatched it; empty when the publisher gave no source.
    pub source: String,
    /// Capture groups of the pattern match (empty for exact-match delivery).
    pub pattern_info: Vec<String>,
}

impl Capsule {
    pub(crate) fn new(channel: &str, payload: Payload, source: &str) -> Self {
        Self {
            channel: channel.to_string(),
            payload,
            source: source.to_string(),
            pattern_info: Vec::new(),
        }
    }

    /// Deserialize `payload.data` into `T`.
    ///
    /// Returns `None` when there is no data or it does not have the shape of `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        let data = self.payload.data.as_ref()?;
        T::deserialize(data).ok()
    }
}
