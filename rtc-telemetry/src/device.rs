//! Device-level watching
//!
//! A device binding holds a single subscription: the device's "new transport"
//! notification. Everything else is delegated to whoever handles the transport.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::listeners::Subscription;
use crate::native::{DeviceSignal, MediaDevice, MediaTransport, ObjectKey};

pub(crate) struct DeviceBinding {
    key: ObjectKey,
    subscription: Mutex<Option<Subscription>>,
}

impl DeviceBinding {
    /// Start forwarding every transport the device creates to `on_transport`
    pub(crate) fn bind<D, F>(device: &Arc<D>, on_transport: F) -> Self
    where
        D: MediaDevice + ?Sized + 'static,
        F: Fn(Arc<dyn MediaTransport>) + Send + Sync + 'static,
    {
        let subscription = Subscription::attach(device, move |signal: &DeviceSignal| match signal {
            DeviceSignal::NewTransport(transport) => on_transport(Arc::clone(transport)),
        });
        Self {
            key: ObjectKey::of(device),
            subscription: Mutex::new(Some(subscription)),
        }
    }

    pub(crate) fn key(&self) -> ObjectKey {
        self.key
    }

    /// Detach from the device; returns false if already detached
    pub(crate) fn unbind(&self) -> bool {
        let subscription = self.subscription.lock().take();
        match subscription {
            Some(mut subscription) => {
                subscription.cancel();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_bound(&self) -> bool {
        self.subscription.lock().is_some()
    }
}
