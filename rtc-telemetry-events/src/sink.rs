//! Event sinks
//!
//! The binding layer only ever calls [`EventSink::add_event`]; metadata and
//! issues are produced by collaborators outside this workspace and default to
//! no-ops here.

use std::sync::{mpsc, Arc};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::catalog::EventKind;
use crate::envelope::Envelope;

/// Destination for shaped envelopes
///
/// Delivery order is the order of `add_event` calls; no other ordering is
/// promised. Implementations must not block for long, since they run inline
/// with the platform callback that produced the event.
pub trait EventSink: Send + Sync {
    fn add_event(&self, envelope: Envelope);

    fn add_meta_data(&self, _envelope: Envelope) {}

    fn add_issue(&self, _envelope: Envelope) {}
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn add_event(&self, envelope: Envelope) {
        (**self).add_event(envelope)
    }

    fn add_meta_data(&self, envelope: Envelope) {
        (**self).add_meta_data(envelope)
    }

    fn add_issue(&self, envelope: Envelope) {
        (**self).add_issue(envelope)
    }
}

// ============================================================================
// MemorySink - ordered in-memory buffer
// ============================================================================

/// Buffers every envelope in delivery order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Envelope>>,
    meta_data: Mutex<Vec<Envelope>>,
    issues: Mutex<Vec<Envelope>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all buffered events
    pub fn events(&self) -> Vec<Envelope> {
        self.events.lock().clone()
    }

    /// Kinds of all buffered events, in order
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|e| e.kind()).collect()
    }

    /// Events whose payload names the given connection
    pub fn events_for(&self, connection_id: &str) -> Vec<Envelope> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.connection_id() == Some(connection_id))
            .cloned()
            .collect()
    }

    /// Take all buffered events, leaving the buffer empty
    pub fn drain(&self) -> Vec<Envelope> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn meta_data(&self) -> Vec<Envelope> {
        self.meta_data.lock().clone()
    }

    pub fn issues(&self) -> Vec<Envelope> {
        self.issues.lock().clone()
    }
}

impl EventSink for MemorySink {
    fn add_event(&self, envelope: Envelope) {
        self.events.lock().push(envelope);
    }

    fn add_meta_data(&self, envelope: Envelope) {
        self.meta_data.lock().push(envelope);
    }

    fn add_issue(&self, envelope: Envelope) {
        self.issues.lock().push(envelope);
    }
}

// ============================================================================
// ChannelSink - sync channel with a blocking iterator
// ============================================================================

/// Forwards events over a std channel to an [`EventIterator`]
pub struct ChannelSink {
    tx: mpsc::Sender<Envelope>,
}

impl ChannelSink {
    /// Create a sink and the iterator that receives its events
    pub fn new() -> (Self, EventIterator) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, EventIterator::new(Arc::new(std::sync::Mutex::new(rx))))
    }
}

impl EventSink for ChannelSink {
    fn add_event(&self, envelope: Envelope) {
        if self.tx.send(envelope).is_err() {
            tracing::debug!("Event receiver dropped, discarding event");
        }
    }
}

/// Blocking iterator over delivered envelopes
///
/// Blocks on `next()` until an event is available or every sender is gone.
/// Use `try_recv()` for non-blocking access.
pub struct EventIterator {
    rx: Arc<std::sync::Mutex<mpsc::Receiver<Envelope>>>,
}

impl EventIterator {
    pub(crate) fn new(rx: Arc<std::sync::Mutex<mpsc::Receiver<Envelope>>>) -> Self {
        Self { rx }
    }

    /// Block until an event is available
    ///
    /// Returns `None` if the channel is closed.
    pub fn recv(&self) -> Option<Envelope> {
        self.rx.lock().ok()?.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Envelope> {
        self.rx.lock().ok()?.try_recv().ok()
    }

    /// Block until an event is available or timeout expires
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Envelope> {
        self.rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    /// Non-blocking iterator over currently available events
    pub fn try_iter(&self) -> TryIterator<'_> {
        TryIterator { inner: self }
    }
}

impl Iterator for EventIterator {
    type Item = Envelope;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

impl Clone for EventIterator {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

/// Non-blocking iterator over currently available events
pub struct TryIterator<'a> {
    inner: &'a EventIterator,
}

impl<'a> Iterator for TryIterator<'a> {
    type Item = Envelope;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_recv()
    }
}

// ============================================================================
// BroadcastSink - fan-out to async receivers
// ============================================================================

/// Fans events out to any number of `tokio` broadcast receivers
///
/// Slow receivers lag rather than block the producer; events sent while no
/// receiver is subscribed are dropped.
pub struct BroadcastSink {
    tx: broadcast::Sender<Envelope>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventSink for BroadcastSink {
    fn add_event(&self, envelope: Envelope) {
        if let Err(broadcast::error::SendError(envelope)) = self.tx.send(envelope) {
            tracing::trace!(kind = %envelope.kind(), "No broadcast receivers, dropping event");
        }
    }
}
