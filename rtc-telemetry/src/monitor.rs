//! Per-connection monitor contract
//!
//! Statistics polling lives outside this crate. A binding only needs two things
//! from the monitor it owns: a notification after every statistics collection
//! (used to re-check producer tracks) and a way to close it when the binding
//! goes away.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::listeners::ListenerSet;
use crate::native::{Listener, ListenerId, MediaTransport, PeerConnection, SignalSource};

/// Delivered to monitor listeners after each statistics collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsTick {
    /// Number of collections completed by this monitor, starting at 1
    pub sequence: u64,
}

/// The statistics collaborator owned by one binding
pub trait ConnectionMonitor: SignalSource<StatsTick> {
    /// Stop collecting and release any resources; later calls are no-ops
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Creates the monitor a new binding will own
pub trait MonitorFactory: Send + Sync {
    fn peer_connection_monitor(
        &self,
        connection_id: &str,
        connection: &Arc<dyn PeerConnection>,
    ) -> Arc<dyn ConnectionMonitor>;

    fn transport_monitor(
        &self,
        connection_id: &str,
        transport: &Arc<dyn MediaTransport>,
    ) -> Arc<dyn ConnectionMonitor>;
}

// ============================================================================
// TickMonitor - host-driven monitor
// ============================================================================

/// A monitor the host drives by calling [`TickMonitor::tick`] after each poll
#[derive(Debug, Default)]
pub struct TickMonitor {
    listeners: ListenerSet<StatsTick>,
    sequence: AtomicU64,
    closed: AtomicBool,
}

impl TickMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify listeners that a statistics collection finished
    ///
    /// Does nothing once the monitor is closed.
    pub fn tick(&self) {
        if self.is_closed() {
            return;
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.listeners.emit(&StatsTick { sequence });
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl SignalSource<StatsTick> for TickMonitor {
    fn subscribe(&self, listener: Listener<StatsTick>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}

impl ConnectionMonitor for TickMonitor {
    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.listeners.clear();
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Default factory: one [`TickMonitor`] per binding, reachable by binding id
#[derive(Debug, Default)]
pub struct TickMonitorFactory {
    monitors: Mutex<HashMap<String, Weak<TickMonitor>>>,
}

impl TickMonitorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(&self, connection_id: &str) -> Arc<TickMonitor> {
        let monitor = Arc::new(TickMonitor::new());
        let mut monitors = self.monitors.lock();
        monitors.retain(|_, weak| weak.strong_count() > 0);
        monitors.insert(connection_id.to_string(), Arc::downgrade(&monitor));
        monitor
    }

    /// The live monitor for a binding, if it has not been released
    pub fn monitor(&self, connection_id: &str) -> Option<Arc<TickMonitor>> {
        self.monitors.lock().get(connection_id)?.upgrade()
    }

    /// Tick one binding's monitor; returns false if it is gone or closed
    pub fn tick(&self, connection_id: &str) -> bool {
        match self.monitor(connection_id) {
            Some(monitor) if !monitor.is_closed() => {
                monitor.tick();
                true
            }
            _ => false,
        }
    }

    /// Tick every live monitor
    pub fn tick_all(&self) {
        let monitors: Vec<_> = self
            .monitors
            .lock()
            .values()
            .filter_map(Weak::upgrade)
            .collect();
        for monitor in monitors {
            monitor.tick();
        }
    }
}

impl MonitorFactory for TickMonitorFactory {
    fn peer_connection_monitor(
        &self,
        connection_id: &str,
        _connection: &Arc<dyn PeerConnection>,
    ) -> Arc<dyn ConnectionMonitor> {
        self.create(connection_id)
    }

    fn transport_monitor(
        &self,
        connection_id: &str,
        _transport: &Arc<dyn MediaTransport>,
    ) -> Arc<dyn ConnectionMonitor> {
        self.create(connection_id)
    }
}
