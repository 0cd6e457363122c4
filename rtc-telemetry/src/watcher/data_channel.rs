use std::sync::{Arc, Weak};

use telemetry_events::{DataChannelError, DataChannelEvent, EventInput};

use super::{ChildKey, ChildWatcher, CloseMode, ParentLink, WatcherCore};
use crate::context::Scope;
use crate::listeners::Subscription;
use crate::native::{DataChannel, DataChannelSignal, ObjectKey};

/// Watches one data channel of a peer connection
///
/// Channels have no stable id before negotiation, so they are keyed by object
/// identity.
pub(crate) struct DataChannelWatcher {
    this: Weak<Self>,
    core: WatcherCore,
    channel: Arc<dyn DataChannel>,
}

impl DataChannelWatcher {
    pub(crate) fn new(scope: Arc<Scope>, channel: Arc<dyn DataChannel>, parent: ParentLink) -> Arc<Self> {
        let key = ChildKey::DataChannel(ObjectKey::of(&channel));
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: WatcherCore::new(key, scope, Some(parent)),
            channel,
        })
    }

    fn event(&self) -> DataChannelEvent {
        DataChannelEvent {
            connection_id: self.core.connection_id(),
            label: self.channel.label(),
            channel_id: self.channel.id(),
            ready_state: self.channel.ready_state(),
            protocol: self.channel.protocol(),
        }
    }

    fn handle(&self, signal: &DataChannelSignal) {
        match signal {
            DataChannelSignal::Open => self.core.emit(EventInput::DataChannelOpen(self.event())),
            DataChannelSignal::Close => self.close(CloseMode::Emit),
            DataChannelSignal::Error(error) => {
                self.core.emit(EventInput::DataChannelError(DataChannelError {
                    channel: self.event(),
                    error: error.clone(),
                }))
            }
        }
    }
}

impl ChildWatcher for DataChannelWatcher {
    fn key(&self) -> &ChildKey {
        self.core.key()
    }

    fn start(&self) {
        if self.core.is_closed() {
            return;
        }
        self.core.emit(EventInput::DataChannelAdded(self.event()));

        let this = self.this.clone();
        self.core.hold(Subscription::attach(
            &self.channel,
            move |signal: &DataChannelSignal| {
                if let Some(watcher) = this.upgrade() {
                    watcher.handle(signal);
                }
            },
        ));
    }

    fn close(&self, mode: CloseMode) {
        self.core
            .close(mode, || EventInput::DataChannelClosed(self.event()));
    }

    fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}
