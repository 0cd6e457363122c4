//! Child entity watchers
//!
//! A watcher ties one child object (track, data channel, producer, consumer,
//! data producer, data consumer) to the event stream. Its lifetime is nested
//! inside the binding that discovered it:
//!
//! ```text
//! discovery ──start()──▶ watching ──native close──▶ closed (terminal event, leaves parent)
//!                           │
//!                           └──parent closes──▶ closed (terminal event or silent, by CloseMode)
//! ```
//!
//! Closing is idempotent. Whichever trigger arrives first wins; the other finds
//! the watcher already detached and does nothing.

mod data_channel;
mod data_producer;
mod media;
mod track;

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use telemetry_events::EventInput;

use crate::context::Scope;
use crate::listeners::{Attachment, Subscription};
use crate::native::ObjectKey;

pub(crate) use data_channel::DataChannelWatcher;
pub(crate) use data_producer::{DataConsumerWatcher, DataProducerWatcher};
pub(crate) use media::{ConsumerWatcher, ProducerWatcher};
pub(crate) use track::{TrackOwner, TrackSlot, TrackWatcher};

/// Identity of a child within its parent binding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ChildKey {
    Track(String),
    DataChannel(ObjectKey),
    Producer(String),
    Consumer(String),
    DataProducer(String),
    DataConsumer(String),
}

/// Whether closing a watcher emits its terminal event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseMode {
    /// The child (or its parent) really closed
    Emit,
    /// Observation stopped; the child may still be alive
    Silent,
}

pub(crate) trait ChildWatcher: Send + Sync {
    fn key(&self) -> &ChildKey;

    /// Announce the child and install its handlers
    fn start(&self);

    /// Detach every handler; emits the terminal event once in `Emit` mode
    fn close(&self, mode: CloseMode);

    fn is_closed(&self) -> bool;
}

/// The open children of one binding, in discovery order
#[derive(Default)]
pub(crate) struct Children {
    entries: Mutex<Vec<Arc<dyn ChildWatcher>>>,
}

impl Children {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a watcher unless one with the same key is already present
    pub(crate) fn insert(&self, watcher: Arc<dyn ChildWatcher>) -> bool {
        let mut entries = self.entries.lock();
        if entries.iter().any(|w| w.key() == watcher.key()) {
            return false;
        }
        entries.push(watcher);
        true
    }

    pub(crate) fn remove(&self, key: &ChildKey) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|w| w.key() != key);
        entries.len() != before
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &ChildKey) -> bool {
        self.entries.lock().iter().any(|w| w.key() == key)
    }

    /// Remove and return every watcher, oldest first
    pub(crate) fn take_all(&self) -> Vec<Arc<dyn ChildWatcher>> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Back-reference from a watcher to the collection that holds it
pub(crate) struct ParentLink {
    children: Weak<Children>,
}

impl ParentLink {
    pub(crate) fn new(children: &Arc<Children>) -> Self {
        Self {
            children: Arc::downgrade(children),
        }
    }

    pub(crate) fn release(&self, key: &ChildKey) {
        if let Some(children) = self.children.upgrade() {
            children.remove(key);
        }
    }
}

/// State every watcher shares: its key, its scope and its subscriptions
pub(crate) struct WatcherCore {
    key: ChildKey,
    scope: Arc<Scope>,
    attachment: Attachment,
    parent: Option<ParentLink>,
}

impl WatcherCore {
    pub(crate) fn new(key: ChildKey, scope: Arc<Scope>, parent: Option<ParentLink>) -> Self {
        Self {
            key,
            scope,
            attachment: Attachment::new(),
            parent,
        }
    }

    pub(crate) fn key(&self) -> &ChildKey {
        &self.key
    }

    pub(crate) fn scope(&self) -> &Arc<Scope> {
        &self.scope
    }

    pub(crate) fn connection_id(&self) -> String {
        self.scope.connection_id.clone()
    }

    pub(crate) fn emit(&self, input: EventInput) {
        self.scope.emit(input);
    }

    pub(crate) fn hold(&self, subscription: Subscription) -> bool {
        self.attachment.hold(subscription)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.attachment.is_detached()
    }

    /// Detach, leave the parent and emit `terminal` in `Emit` mode
    ///
    /// `teardown` runs after the handlers are gone and before the terminal
    /// event. Returns false if the watcher was already closed.
    pub(crate) fn close_with(
        &self,
        mode: CloseMode,
        teardown: impl FnOnce(),
        terminal: impl FnOnce() -> EventInput,
    ) -> bool {
        if !self.attachment.detach() {
            return false;
        }
        if let Some(parent) = &self.parent {
            parent.release(&self.key);
        }
        teardown();
        if mode == CloseMode::Emit {
            self.scope.emit(terminal());
        }
        tracing::debug!(
            connection_id = %self.scope.connection_id,
            child = ?self.key,
            ?mode,
            "Child watcher closed"
        );
        true
    }

    pub(crate) fn close(&self, mode: CloseMode, terminal: impl FnOnce() -> EventInput) -> bool {
        self.close_with(mode, || {}, terminal)
    }
}
