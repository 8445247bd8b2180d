use std::{fmt, sync::Arc};

use super::Capsule;

/// A shareable listener callback.
///
/// Identity matters: [`Hub::remove`](super::Hub::remove) drops registrations whose
/// callback is the *same* `HubCallback` (a clone of it), not an equal closure.
#[derive(Clone)]
pub struct HubCallback(Arc<dyn Fn(&Capsule) + Send + Sync>);

impl HubCallback {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Capsule) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Whether both handles point to the same callback.
    pub fn ptr_eq(&self, other: &HubCallback) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn call(&self, capsule: &Capsule) {
        (self.0)(capsule);
    }
}

impl fmt::Debug for HubCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HubCallback")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Object-style listener kept for compatibility with older integrations.
///
/// Prefer passing a closure to [`Hub::listen`](super::Hub::listen).
pub trait HubCapsuleHandler: Send + Sync {
    /// Called once per delivered capsule.
    fn on_hub_capsule(&self, capsule: &Capsule);
}

/// What [`Hub::listen`](super::Hub::listen) accepts.
///
/// Closures and [`HubCallback`]s convert into [`Listener::Direct`]. Handler objects
/// must be wrapped explicitly with [`Listener::legacy`].
#[derive(Clone)]
pub enum Listener {
    /// Plain callback.
    Direct(HubCallback),
    /// Deprecated handler object; its `on_hub_capsule` becomes the callback.
    Legacy(Arc<dyn HubCapsuleHandler>),
}

impl Listener {
    /// Wrap a legacy handler object.
    pub fn legacy<H: HubCapsuleHandler + 'static>(handler: H) -> Self {
        Listener::Legacy(Arc::new(handler))
    }

    /// The callback actually stored in the registry.
    pub(crate) fn into_callback(self) -> HubCallback {
        match self {
            Listener::Direct(callback) => callback,
            Listener::Legacy(handler) => {
                HubCallback::new(move |capsule| handler.on_hub_capsule(capsule))
            }
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Direct(callback) => f.debug_tuple("Direct").field(callback).finish(),
            Listener::Legacy(_) => f.debug_tuple("Legacy").finish(),
        }
    }
}

impl From<HubCallback> for Listener {
    fn from(callback: HubCallback) -> Self {
        Listener::Direct(callback)
    }
}

impl<F> From<F> for Listener
where
    F: Fn(&Capsule) + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Listener::Direct(HubCallback::new(f))
    }
}
