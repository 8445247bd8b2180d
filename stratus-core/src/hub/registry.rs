//! Listener bookkeeping for one hub.
//!
//! Two indexes are kept: exact-match listener lists keyed by channel name, and a
//! single ordered list of pattern entries. Both preserve registration order, which
//! is also delivery order.

use std::collections::HashMap;

use regex::Regex;

use super::{Channel, HubCallback};
use crate::cross_log;

/// Name given to listeners registered without one.
pub(crate) const DEFAULT_LISTENER_NAME: &str = "noname";

/// Unique (per hub) id of a single registration.
pub(crate) type RegistrationId = u64;

#[derive(Debug, Clone)]
pub(crate) struct ListenerEntry {
    pub(crate) id: RegistrationId,
    pub(crate) name: String,
    pub(crate) callback: HubCallback,
}

#[derive(Debug, Clone)]
pub(crate) struct PatternEntry {
    pub(crate) id: RegistrationId,
    pub(crate) pattern: Regex,
    pub(crate) callback: HubCallback,
}

/// Listeners that one dispatch delivers to, copied out of the registry so that
/// callbacks can register or unregister while the dispatch is running.
#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    pub(crate) listeners: Vec<ListenerEntry>,
    pub(crate) patterns: Vec<PatternEntry>,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    listeners: HashMap<String, Vec<ListenerEntry>>,
    patterns: Vec<PatternEntry>,
    next_id: RegistrationId,
}

impl Registry {
    /// Append a registration and return its id.
    pub(crate) fn register(
        &mut self,
        channel: &Channel,
        callback: HubCallback,
        name: Option<&str>,
    ) -> RegistrationId {
        let id = self.next_id;
        self.next_id += 1;

        match channel {
            Channel::Pattern(pattern) => self.patterns.push(PatternEntry {
                id,
                pattern: pattern.clone(),
                callback,
            }),
            Channel::Name(channel) => {
                self.listeners
                    .entry(channel.clone())
                    .or_default()
                    .push(ListenerEntry {
                        id,
                        name: name.unwrap_or(DEFAULT_LISTENER_NAME).to_string(),
                        callback,
                    });
            }
        }

        id
    }

    /// Remove by callback identity (names) or by pattern source text (patterns).
    ///
    /// For a pattern channel only the first entry with the same source is removed,
    /// whichever callback it holds. For a named channel every entry holding
    /// `callback` is removed.
    pub(crate) fn unregister(&mut self, channel: &Channel, callback: &HubCallback) {
        match channel {
            Channel::Pattern(pattern) => {
                let Some(position) = self
                    .patterns
                    .iter()
                    .position(|entry| entry.pattern.as_str() == pattern.as_str())
                else {
                    cross_log!(warn, "No listeners for {}", channel);
                    return;
                };
                self.patterns.remove(position);
            }
            Channel::Name(name) => {
                let Some(holder) = self.listeners.get_mut(name) else {
                    cross_log!(warn, "No listeners for {}", channel);
                    return;
                };
                holder.retain(|entry| !entry.callback.ptr_eq(callback));
            }
        }
    }

    /// Remove exactly one registration. Returns `false` if it was already gone.
    pub(crate) fn unregister_id(&mut self, channel: &Channel, id: RegistrationId) -> bool {
        match channel {
            Channel::Pattern(_) => {
                let before = self.patterns.len();
                self.patterns.retain(|entry| entry.id != id);
                before != self.patterns.len()
            }
            Channel::Name(name) => match self.listeners.get_mut(name) {
                Some(holder) => {
                    let before = holder.len();
                    holder.retain(|entry| entry.id != id);
                    before != holder.len()
                }
                None => false,
            },
        }
    }

    /// Copy out everything a dispatch on `channel` may deliver to.
    pub(crate) fn snapshot(&self, channel: &str) -> Snapshot {
        Snapshot {
            listeners: self.listeners.get(channel).cloned().unwrap_or_default(),
            patterns: self.patterns.clone(),
        }
    }

    pub(crate) fn listener_count(&self, channel: &str) -> usize {
        self.listeners.get(channel).map_or(0, Vec::len)
    }

    pub(crate) fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}
