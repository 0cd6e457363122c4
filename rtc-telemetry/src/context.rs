//! Shared emission state
//!
//! Every binding and watcher emits through an `EventContext`, which reads the
//! current payload provider on each emission. Replacing the provider therefore
//! takes effect on the very next event, for every binding at once.

use std::sync::Arc;

use parking_lot::RwLock;
use telemetry_events::{EventInput, EventSink, PayloadProvider};

use crate::monitor::ConnectionMonitor;

pub(crate) struct EventContext {
    sink: Arc<dyn EventSink>,
    provider: RwLock<PayloadProvider>,
}

impl EventContext {
    pub(crate) fn new(sink: Arc<dyn EventSink>, provider: PayloadProvider) -> Self {
        Self {
            sink,
            provider: RwLock::new(provider),
        }
    }

    /// Shape `input` with the current provider and hand it to the sink
    ///
    /// The provider lock is released before the sink runs, so a sink may
    /// replace the provider from inside `add_event`.
    pub(crate) fn emit(&self, input: EventInput) {
        let envelope = self.provider.read().envelope(input);
        tracing::trace!(%envelope, "Emitting event");
        self.sink.add_event(envelope);
    }

    pub(crate) fn set_provider(&self, provider: PayloadProvider) {
        *self.provider.write() = provider;
    }

    pub(crate) fn provider(&self) -> PayloadProvider {
        self.provider.read().clone()
    }
}

/// What a binding shares with the child watchers it creates
pub(crate) struct Scope {
    pub(crate) connection_id: String,
    pub(crate) events: Arc<EventContext>,
    pub(crate) monitor: Arc<dyn ConnectionMonitor>,
    pub(crate) watch_producer_tracks: bool,
}

impl Scope {
    pub(crate) fn emit(&self, input: EventInput) {
        self.events.emit(input);
    }
}
