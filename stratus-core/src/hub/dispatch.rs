//! Delivery of one capsule to the listeners of a [`Snapshot`].
//!
//! Delivery is synchronous and never fails: a panicking listener is logged and the
//! remaining listeners still run.

use std::panic::{self, AssertUnwindSafe};

use super::{
    registry::{ListenerEntry, PatternEntry, Snapshot},
    Capsule, HubCallback,
};
use crate::cross_log;

/// Deliver `capsule` to exact-match listeners first, then to matching patterns.
pub(crate) fn publish(snapshot: &Snapshot, capsule: &Capsule) {
    to_listeners(&snapshot.listeners, capsule);

    if snapshot.patterns.is_empty() {
        return;
    }

    let Some(message) = capsule
        .payload
        .message
        .as_deref()
        .filter(|message| !message.is_empty())
    else {
        cross_log!(
            warn,
            "Cannot perform pattern matching without a message key"
        );
        return;
    };

    to_patterns(&snapshot.patterns, capsule, message);
}

fn to_listeners(listeners: &[ListenerEntry], capsule: &Capsule) {
    for listener in listeners {
        cross_log!(
            debug,
            "Dispatching to {} ({}) with {:?}",
            capsule.channel,
            listener.name,
            capsule.payload
        );
        invoke(&listener.callback, capsule);
    }
}

fn to_patterns(patterns: &[PatternEntry], capsule: &Capsule, message: &str) {
    for entry in patterns {
        let Some(captures) = entry.pattern.captures(message) else {
            continue;
        };

        let pattern_info = captures
            .iter()
            .skip(1)
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect();

        let dispatching = Capsule {
            pattern_info,
            ..capsule.clone()
        };

        cross_log!(
            debug,
            "Dispatching to pattern /{}/ with {:?}",
            entry.pattern.as_str(),
            dispatching.payload
        );
        invoke(&entry.callback, &dispatching);
    }
}

/// Run one callback, containing any panic it raises.
fn invoke(callback: &HubCallback, capsule: &Capsule) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback.call(capsule)));

    if let Err(cause) = outcome {
        let reason = cause
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| cause.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        cross_log!(
            error,
            "Hub listener on {} failed: {}",
            capsule.channel,
            reason
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::hub::{registry::Registry, Channel, Payload};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, tag: &'static str) -> HubCallback {
        let log = Arc::clone(log);
        HubCallback::new(move |capsule| {
            log.lock()
                .unwrap()
                .push(format!("{tag}:{}", capsule.pattern_info.join(",")));
        })
    }

    #[test]
    fn exact_listeners_run_before_patterns() {
        let log = Log::default();
        let mut registry = Registry::default();
        registry.register(
            &Channel::pattern("^order-(\\d+)$").unwrap(),
            recorder(&log, "pattern"),
            None,
        );
        registry.register(&Channel::name("core"), recorder(&log, "exact"), None);

        let capsule = Capsule::new("core", Payload::new("x").with_message("order-42"), "");
        publish(&registry.snapshot("core"), &capsule);

        assert_eq!(*log.lock().unwrap(), ["exact:", "pattern:42"]);
    }

    #[test]
    fn missing_message_skips_patterns_only() {
        let log = Log::default();
        let mut registry = Registry::default();
        registry.register(&Channel::pattern(".*").unwrap(), recorder(&log, "pattern"), None);
        registry.register(&Channel::name("core"), recorder(&log, "exact"), None);

        let capsule = Capsule::new("core", Payload::new("x"), "");
        publish(&registry.snapshot("core"), &capsule);

        assert_eq!(*log.lock().unwrap(), ["exact:"]);
    }

    #[test]
    fn empty_message_skips_patterns_only() {
        let log = Log::default();
        let mut registry = Registry::default();
        registry.register(&Channel::pattern(".*").unwrap(), recorder(&log, "pattern"), None);
        registry.register(&Channel::name("core"), recorder(&log, "exact"), None);

        let capsule = Capsule::new("core", Payload::new("x").with_message(""), "");
        publish(&registry.snapshot("core"), &capsule);

        assert_eq!(*log.lock().unwrap(), ["exact:"]);
    }

    #[test]
    fn unmatched_optional_groups_are_empty() {
        let log = Log::default();
        let mut registry = Registry::default();
        registry.register(
            &Channel::pattern("^(a)?(b)(c)?$").unwrap(),
            recorder(&log, "p"),
            None,
        );

        let capsule = Capsule::new("any", Payload::new("x").with_message("b"), "");
        publish(&registry.snapshot("any"), &capsule);

        assert_eq!(*log.lock().unwrap(), ["p:,b,"]);
    }

    #[test]
    fn panicking_listener_does_not_stop_delivery() {
        let log = Log::default();
        let mut registry = Registry::default();
        let channel = Channel::name("api");
        registry.register(&channel, recorder(&log, "before"), None);
        registry.register(&channel, HubCallback::new(|_| panic!("listener failure")), None);
        registry.register(&channel, recorder(&log, "after"), None);

        publish(
            &registry.snapshot("api"),
            &Capsule::new("api", Payload::new("x"), ""),
        );

        assert_eq!(*log.lock().unwrap(), ["before:", "after:"]);
    }
}
