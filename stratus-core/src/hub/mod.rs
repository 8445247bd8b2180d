//! In-process publish/subscribe hub.
//!
//! ## Mental model
//! - A [`Hub`] is a named bus. [`Hub::global`] is the shared default bus every SDK
//!   module dispatches on; [`Hub::new`] creates private buses.
//! - Listeners subscribe to a [`Channel`]: an exact name, or a regular expression
//!   matched against the payload `message`.
//! - [`Hub::dispatch`] delivers synchronously, in registration order, exact-match
//!   listeners first. A panicking listener is logged and never reaches the publisher.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use regex::Regex;
//! use stratus_core::hub::{Capsule, Hub, Payload};
//!
//! let hub = Hub::new("orders");
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! hub.listen(Regex::new(r"^order-(\d+)$").unwrap(), move |capsule: &Capsule| {
//!     sink.lock().unwrap().extend(capsule.pattern_info.clone());
//! }, None);
//!
//! hub.dispatch("core", Payload::new("placed").with_message("order-42"));
//! assert_eq!(*seen.lock().unwrap(), ["42"]);
//! ```

mod capsule;
mod channel;
mod dispatch;
mod listener;
mod registry;

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak},
};

pub use capsule::{Capsule, Payload};
pub use channel::Channel;
pub use listener::{HubCallback, HubCapsuleHandler, Listener};

use registry::{Registry, RegistrationId};

use crate::cross_log;

/// Name of the process-wide default hub.
pub const DEFAULT_HUB_NAME: &str = "__default__";

/// Channels reserved for SDK modules.
///
/// Dispatching on one of them without the internal [`AccessToken`] logs a warning.
/// The dispatch still goes through: the protection is advisory.
pub const PROTECTED_CHANNELS: [&str; 9] = [
    "core",
    "auth",
    "api",
    "analytics",
    "interactions",
    "pubsub",
    "storage",
    "ui",
    "xr",
];

static DEFAULT_HUB: OnceLock<Hub> = OnceLock::new();

/// Marker presented by SDK modules when dispatching on protected channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessToken(());

impl AccessToken {
    /// The token used by Stratus modules themselves.
    #[doc(hidden)]
    pub const fn internal() -> Self {
        AccessToken(())
    }
}

struct HubInner {
    name: String,
    registry: Mutex<Registry>,
}

impl HubInner {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Callbacks never run under this lock, so a poisoned registry is still consistent.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A named event bus. Clones share the same listeners.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

impl Hub {
    /// Create an independent (private) bus.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(HubInner {
                name: name.into(),
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// The process-wide default bus, named [`DEFAULT_HUB_NAME`].
    ///
    /// Created on first use and kept for the lifetime of the process.
    pub fn global() -> Hub {
        DEFAULT_HUB.get_or_init(|| Hub::new(DEFAULT_HUB_NAME)).clone()
    }

    /// Name given at construction.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Subscribe `listener` to `channel`.
    ///
    /// `listener` is a closure, a [`HubCallback`], or a legacy handler wrapped with
    /// [`Listener::legacy`]. `name` defaults to `"noname"` and only shows up in logs.
    ///
    /// The returned [`Unsubscribe`] removes exactly this registration. Dropping it
    /// keeps the listener registered for the lifetime of the hub.
    pub fn listen<C, L>(&self, channel: C, listener: L, name: Option<&str>) -> Unsubscribe
    where
        C: Into<Channel>,
        L: Into<Listener>,
    {
        let channel = channel.into();
        let listener = listener.into();

        if matches!(listener, Listener::Legacy(_)) {
            cross_log!(
                warn,
                "WARNING onHubCapsule is Deprecated. Please pass in a callback."
            );
        }

        let id = self
            .inner
            .registry()
            .register(&channel, listener.into_callback(), name);

        Unsubscribe {
            hub: Arc::downgrade(&self.inner),
            channel,
            id,
        }
    }

    /// Dispatch `payload` on `channel` with an empty source.
    pub fn dispatch(&self, channel: &str, payload: Payload) {
        self.publish(channel, payload, "", None);
    }

    /// Dispatch with an explicit `source`, optionally presenting an [`AccessToken`].
    pub fn dispatch_with(
        &self,
        channel: &str,
        payload: Payload,
        source: &str,
        access: Option<AccessToken>,
    ) {
        self.publish(channel, payload, source, access);
    }

    /// Remove every registration of `callback` on a named channel, or the first
    /// pattern registration with the same source text.
    #[deprecated(note = "call `unsubscribe` on the handle returned by `Hub::listen` instead")]
    pub fn remove<C: Into<Channel>>(&self, channel: C, callback: &HubCallback) {
        self.inner.registry().unregister(&channel.into(), callback);
    }

    /// Number of exact-match listeners currently registered on `channel`.
    pub fn listener_count(&self, channel: &str) -> usize {
        self.inner.registry().listener_count(channel)
    }

    /// Number of pattern listeners currently registered.
    pub fn pattern_count(&self) -> usize {
        self.inner.registry().pattern_count()
    }

    fn publish(&self, channel: &str, payload: Payload, source: &str, access: Option<AccessToken>) {
        if PROTECTED_CHANNELS.contains(&channel) && access != Some(AccessToken::internal()) {
            cross_log!(
                warn,
                "WARNING: {} is protected and dispatching on it can have unintended consequences",
                channel
            );
        }

        let capsule = Capsule::new(channel, payload, source);
        // The lock is released before any callback runs.
        let snapshot = self.inner.registry().snapshot(channel);
        dispatch::publish(&snapshot, &capsule);
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub").field("name", &self.inner.name).finish()
    }
}

/// Handle removing one registration made with [`Hub::listen`].
#[derive(Debug)]
pub struct Unsubscribe {
    hub: Weak<HubInner>,
    channel: Channel,
    id: RegistrationId,
}

impl Unsubscribe {
    /// The channel this registration listens on.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Remove the registration. No-op if the hub is gone.
    pub fn unsubscribe(self) {
        let Some(hub) = self.hub.upgrade() else {
            return;
        };
        if !hub.registry().unregister_id(&self.channel, self.id) {
            cross_log!(warn, "No listeners for {}", self.channel);
        }
    }
}

impl fmt::Debug for HubInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubInner").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    fn counter(hub: &Hub, channel: &str) -> (Arc<AtomicUsize>, Unsubscribe) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let off = hub.listen(
            channel,
            move |_: &Capsule| {
                c.fetch_add(1, Ordering::SeqCst);
            },
            None,
        );
        (count, off)
    }

    #[test]
    fn listen_then_dispatch_delivers_capsule() {
        let hub = Hub::new("test");
        let received = Arc::new(Mutex::new(Vec::<Capsule>::new()));
        let sink = Arc::clone(&received);
        hub.listen(
            "auth",
            move |capsule: &Capsule| sink.lock().unwrap().push(capsule.clone()),
            Some("t1"),
        );

        hub.dispatch("auth", Payload::new("signIn").with_data(json!({})));

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].payload.event, "signIn");
        assert_eq!(received[0].channel, "auth");
        assert_eq!(received[0].source, "");
        assert!(received[0].pattern_info.is_empty());
    }

    #[test]
    fn unsubscribe_removes_only_that_registration() {
        let hub = Hub::new("test");
        let (first, off_first) = counter(&hub, "core");
        let (second, _off_second) = counter(&hub, "core");

        off_first.unsubscribe();
        hub.dispatch_with("core", Payload::new("x"), "", Some(AccessToken::internal()));

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(hub.listener_count("core"), 1);
    }

    #[test]
    fn unsubscribe_pattern_keeps_other_patterns_with_same_source() {
        let hub = Hub::new("test");
        let source = "^job-(\\w+)$";
        let (a, off_a) = counter_pattern(&hub, source);
        let (b, _off_b) = counter_pattern(&hub, source);

        off_a.unsubscribe();
        hub.dispatch("jobs", Payload::new("x").with_message("job-abc"));

        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    fn counter_pattern(hub: &Hub, source: &str) -> (Arc<AtomicUsize>, Unsubscribe) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let off = hub.listen(
            Channel::pattern(source).unwrap(),
            move |_: &Capsule| {
                c.fetch_add(1, Ordering::SeqCst);
            },
            None,
        );
        (count, off)
    }

    #[test]
    fn unsubscribe_after_hub_dropped_is_harmless() {
        let hub = Hub::new("short-lived");
        let (_, off) = counter(&hub, "core");
        drop(hub);
        off.unsubscribe();
    }

    #[test]
    #[allow(deprecated)]
    fn remove_uses_callback_identity() {
        let hub = Hub::new("test");
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let callback = HubCallback::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        hub.listen("ui", callback.clone(), None);
        hub.listen("ui", HubCallback::new(|_| {}), None);

        hub.remove("ui", &callback);
        hub.dispatch("ui", Payload::new("x"));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(hub.listener_count("ui"), 1);
    }

    struct LegacyHandler(Arc<AtomicUsize>);

    impl HubCapsuleHandler for LegacyHandler {
        fn on_hub_capsule(&self, _capsule: &Capsule) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn legacy_handlers_are_still_delivered() {
        let hub = Hub::new("test");
        let count = Arc::new(AtomicUsize::new(0));
        hub.listen("analytics", Listener::legacy(LegacyHandler(Arc::clone(&count))), None);

        hub.dispatch("analytics", Payload::new("record"));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_registered_during_dispatch_waits_for_next_dispatch() {
        let hub = Hub::new("test");
        let late = Arc::new(AtomicUsize::new(0));

        let inner_hub = hub.clone();
        let late_count = Arc::clone(&late);
        hub.listen(
            "core",
            move |_: &Capsule| {
                let c = Arc::clone(&late_count);
                inner_hub.listen(
                    "core",
                    move |_: &Capsule| {
                        c.fetch_add(1, Ordering::SeqCst);
                    },
                    Some("late"),
                );
            },
            None,
        );

        hub.dispatch("core", Payload::new("first"));
        assert_eq!(late.load(Ordering::SeqCst), 0);

        hub.dispatch("core", Payload::new("second"));
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn global_hub_is_shared() {
        let a = Hub::global();
        let b = Hub::global();
        assert_eq!(a.name(), DEFAULT_HUB_NAME);
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }
}
