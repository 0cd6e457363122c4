//! Caller-facing telemetry collector
//!
//! Provides a synchronous API for registering peer connections, SFU transports
//! and devices. Events are delivered to the sink on the thread that delivered
//! the native signal.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use telemetry_events::{EventSink, PayloadProvider};

use crate::binding::{Binding, BindingId, PeerConnectionBinding, TransportBinding};
use crate::config::CollectorConfig;
use crate::context::EventContext;
use crate::device::DeviceBinding;
use crate::error::Result;
use crate::monitor::{MonitorFactory, TickMonitorFactory};
use crate::native::{MediaDevice, MediaTransport, ObjectKey, PeerConnection};
use crate::registry::{BindingRegistry, Registration, RegistryStats, Removal};

/// State shared with device bindings, which register transports on their own
struct Shared {
    registry: BindingRegistry,
    events: Arc<EventContext>,
    config: CollectorConfig,
    monitors: RwLock<Arc<dyn MonitorFactory>>,
}

impl Shared {
    fn resolve_id(&self, id: Option<BindingId>) -> BindingId {
        id.unwrap_or_else(|| BindingId::new(self.config.generate_id()))
    }

    fn add_peer_connection(
        &self,
        connection: Arc<dyn PeerConnection>,
        id: Option<BindingId>,
    ) -> Result<Registration> {
        let key = ObjectKey::of(&connection);
        let monitors = Arc::clone(&*self.monitors.read());
        self.registry.add(key, self.resolve_id(id), |id| {
            let binding: Arc<dyn Binding> = PeerConnectionBinding::new(
                id,
                connection,
                Arc::clone(&self.events),
                &*monitors,
                &self.config,
            );
            binding
        })
    }

    fn add_transport(
        &self,
        transport: Arc<dyn MediaTransport>,
        id: Option<BindingId>,
    ) -> Result<Registration> {
        let key = ObjectKey::of(&transport);
        let monitors = Arc::clone(&*self.monitors.read());
        self.registry.add(key, self.resolve_id(id), |id| {
            let binding: Arc<dyn Binding> = TransportBinding::new(
                id,
                transport,
                Arc::clone(&self.events),
                &*monitors,
                &self.config,
            );
            binding
        })
    }
}

/// Entry point for observing real-time media objects
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use rtc_telemetry::TelemetryCollector;
/// use telemetry_events::ChannelSink;
///
/// let (sink, events) = ChannelSink::new();
/// let collector = TelemetryCollector::new(Arc::new(sink));
///
/// // `connection` is the host's implementation of `PeerConnection`
/// let registration = collector.add_peer_connection(connection, None)?;
/// println!("Observing {}", registration.id());
///
/// for envelope in events.try_iter() {
///     println!("{}", envelope);
/// }
/// ```
pub struct TelemetryCollector {
    shared: Arc<Shared>,

    /// Device bindings keyed by device identity
    devices: Mutex<HashMap<ObjectKey, DeviceBinding>>,
}

impl TelemetryCollector {
    /// Create a collector with the default configuration
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_config(sink, CollectorConfig::default())
    }

    /// Create a collector with a custom configuration
    pub fn with_config(sink: Arc<dyn EventSink>, config: CollectorConfig) -> Self {
        let factory: Arc<dyn MonitorFactory> = Arc::new(TickMonitorFactory::new());
        Self {
            shared: Arc::new(Shared {
                registry: BindingRegistry::new(),
                events: Arc::new(EventContext::new(sink, PayloadProvider::default())),
                config,
                monitors: RwLock::new(factory),
            }),
            devices: Mutex::new(HashMap::new()),
        }
    }

    /// Use `factory` for the monitors of bindings created from now on
    pub fn with_monitor_factory(self, factory: Arc<dyn MonitorFactory>) -> Self {
        *self.shared.monitors.write() = factory;
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.shared.config
    }

    /// Start observing a peer connection
    ///
    /// Without an `id`, one is generated. Registering the same connection
    /// again returns [`Registration::Existing`] and emits nothing.
    pub fn add_peer_connection(
        &self,
        connection: Arc<dyn PeerConnection>,
        id: Option<BindingId>,
    ) -> Result<Registration> {
        self.shared.add_peer_connection(connection, id)
    }

    /// Stop observing a peer connection without emitting anything
    pub fn remove_peer_connection<T>(&self, connection: &Arc<T>) -> Removal
    where
        T: PeerConnection + ?Sized,
    {
        self.shared.registry.remove(ObjectKey::of(connection))
    }

    /// Start observing an SFU transport
    pub fn add_transport(
        &self,
        transport: Arc<dyn MediaTransport>,
        id: Option<BindingId>,
    ) -> Result<Registration> {
        self.shared.add_transport(transport, id)
    }

    /// Stop observing an SFU transport without emitting anything
    pub fn remove_transport<T>(&self, transport: &Arc<T>) -> Removal
    where
        T: MediaTransport + ?Sized,
    {
        self.shared.registry.remove(ObjectKey::of(transport))
    }

    /// Observe every transport `device` creates from now on
    ///
    /// Returns false if the device is already being watched.
    pub fn add_device<T>(&self, device: &Arc<T>) -> bool
    where
        T: MediaDevice + ?Sized + 'static,
    {
        let key = ObjectKey::of(device);
        if self.devices.lock().contains_key(&key) {
            tracing::warn!(device = %key, "Device is already registered; ignoring");
            return false;
        }

        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let binding = DeviceBinding::bind(device, move |transport| {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            if let Err(e) = shared.add_transport(transport, None) {
                tracing::warn!("Failed to register transport from device: {}", e);
            }
        });

        let mut devices = self.devices.lock();
        if devices.contains_key(&key) {
            drop(devices);
            binding.unbind();
            tracing::warn!(device = %key, "Device registered concurrently; ignoring");
            return false;
        }
        devices.insert(binding.key(), binding);
        tracing::debug!(device = %key, "Device registered");
        true
    }

    /// Stop watching a device; transports it already created stay registered
    pub fn remove_device<T>(&self, device: &Arc<T>) -> bool
    where
        T: MediaDevice + ?Sized,
    {
        let key = ObjectKey::of(device);
        let binding = self.devices.lock().remove(&key);
        match binding {
            Some(binding) => binding.unbind(),
            None => {
                tracing::warn!(device = %key, "Device is not registered; nothing to remove");
                false
            }
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.lock().len()
    }

    /// Replace the payload provider; applies from the next event on
    pub fn set_payload_provider(&self, provider: PayloadProvider) {
        self.shared.events.set_provider(provider);
    }

    pub fn payload_provider(&self) -> PayloadProvider {
        self.shared.events.provider()
    }

    /// Ids of all active bindings, sorted
    pub fn binding_ids(&self) -> Vec<BindingId> {
        self.shared.registry.ids()
    }

    pub fn binding(&self, id: &BindingId) -> Option<Arc<dyn Binding>> {
        self.shared.registry.get(id)
    }

    /// The id of the binding observing `object`, if any
    pub fn binding_id_for<T: ?Sized>(&self, object: &Arc<T>) -> Option<BindingId> {
        self.shared.registry.id_for(ObjectKey::of(object))
    }

    /// Whether `object` currently has an active binding
    pub fn is_bound<T: ?Sized>(&self, object: &Arc<T>) -> bool {
        self.shared.registry.contains(ObjectKey::of(object))
    }

    pub fn len(&self) -> usize {
        self.shared.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RegistryStats {
        self.shared.registry.stats()
    }

    /// Detach from every device and unbind every binding, silently
    ///
    /// Called automatically on drop.
    pub fn shutdown(&self) {
        let devices: Vec<_> = self.devices.lock().drain().map(|(_, binding)| binding).collect();
        for device in &devices {
            device.unbind();
        }
        let bindings = self.shared.registry.unbind_all();
        tracing::debug!(
            "TelemetryCollector shut down: {} bindings, {} devices released",
            bindings,
            devices.len()
        );
    }
}

impl Drop for TelemetryCollector {
    fn drop(&mut self) {
        self.shutdown();
    }
}
