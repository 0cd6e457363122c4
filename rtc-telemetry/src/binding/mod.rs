//! Connection bindings
//!
//! A binding owns every subscription made on behalf of one top-level object (a
//! peer connection or an SFU transport) together with that object's monitor and
//! the watchers of its children.
//!
//! ```text
//! Unbound ──bind()──▶ Bound ──native close──▶ Closed (children's terminal events, then connection-closed)
//!    │                  │
//!    └──────────────────┴──unbind()──────────▶ Closed (silent)
//! ```
//!
//! Transitions are monotonic. Every path into `Closed` goes through
//! [`BindingCore::shutdown`], which runs once no matter how many triggers race
//! for it.

mod peer_connection;
mod transport;

use std::sync::Arc;

use parking_lot::Mutex;
use telemetry_events::{ConnectionClosed, EventInput};

use crate::context::Scope;
use crate::listeners::{Attachment, Subscription};
use crate::native::ObjectKey;
use crate::watcher::{ChildWatcher, Children, CloseMode, ParentLink};

pub use peer_connection::PeerConnectionBinding;
pub use transport::TransportBinding;

/// Identifier of a binding, reported as `connectionId` in every event
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(String);

impl BindingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BindingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BindingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for BindingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle state of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    Bound,
    Closed,
}

/// Which kind of object a binding observes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    PeerConnection,
    Transport,
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingKind::PeerConnection => write!(f, "peer-connection"),
            BindingKind::Transport => write!(f, "transport"),
        }
    }
}

/// Callback run once when a binding reaches `Closed`
pub type CloseHook = Box<dyn FnOnce(&BindingId) + Send>;

/// The subscription owner for one peer connection or transport
pub trait Binding: Send + Sync {
    fn id(&self) -> &BindingId;

    /// Identity of the observed object
    fn object_key(&self) -> ObjectKey;

    fn kind(&self) -> BindingKind;

    fn state(&self) -> BindingState;

    /// Emit `connection-opened` and start listening; no-op unless `Unbound`
    fn bind(&self);

    /// Stop observing without emitting anything; later calls are no-ops
    fn unbind(&self);

    /// Run `hook` when the binding closes, or right away if it already has
    fn on_close(&self, hook: CloseHook);

    /// Number of children currently being watched
    fn child_count(&self) -> usize;
}

/// Shared lifecycle machinery of both binding variants
pub(crate) struct BindingCore {
    id: BindingId,
    key: ObjectKey,
    kind: BindingKind,
    scope: Arc<Scope>,
    state: Mutex<BindingState>,
    attachment: Attachment,
    children: Arc<Children>,
    hooks: Mutex<Vec<CloseHook>>,
}

impl BindingCore {
    pub(crate) fn new(id: BindingId, key: ObjectKey, kind: BindingKind, scope: Arc<Scope>) -> Self {
        Self {
            id,
            key,
            kind,
            scope,
            state: Mutex::new(BindingState::Unbound),
            attachment: Attachment::new(),
            children: Arc::new(Children::new()),
            hooks: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn id(&self) -> &BindingId {
        &self.id
    }

    pub(crate) fn key(&self) -> ObjectKey {
        self.key
    }

    pub(crate) fn kind(&self) -> BindingKind {
        self.kind
    }

    pub(crate) fn scope(&self) -> &Arc<Scope> {
        &self.scope
    }

    pub(crate) fn state(&self) -> BindingState {
        *self.state.lock()
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.state() == BindingState::Bound
    }

    pub(crate) fn emit(&self, input: EventInput) {
        self.scope.emit(input);
    }

    /// Move from `Unbound` to `Bound`; false if that already happened
    pub(crate) fn begin_bind(&self) -> bool {
        let mut state = self.state.lock();
        if *state != BindingState::Unbound {
            return false;
        }
        *state = BindingState::Bound;
        tracing::debug!(id = %self.id, kind = %self.kind, "Binding bound");
        true
    }

    pub(crate) fn hold(&self, subscription: Subscription) -> bool {
        self.attachment.hold(subscription)
    }

    pub(crate) fn parent_link(&self) -> ParentLink {
        ParentLink::new(&self.children)
    }

    /// Start watching a newly discovered child
    ///
    /// Returns false if a child with the same key is already watched or the
    /// binding is no longer bound.
    pub(crate) fn adopt(&self, watcher: Arc<dyn ChildWatcher>) -> bool {
        if !self.is_bound() || !self.children.insert(Arc::clone(&watcher)) {
            return false;
        }
        tracing::trace!(id = %self.id, child = ?watcher.key(), "Watching child");
        watcher.start();
        true
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Close the binding; only the first call does anything
    ///
    /// In `Emit` mode each open child emits its terminal event, in discovery
    /// order, followed by `connection-closed`.
    pub(crate) fn shutdown(&self, mode: CloseMode) -> bool {
        {
            let mut state = self.state.lock();
            if *state == BindingState::Closed {
                return false;
            }
            *state = BindingState::Closed;
        }

        tracing::trace!(id = %self.id, subscriptions = self.attachment.len(), "Detaching binding");
        self.attachment.detach();
        for child in self.children.take_all() {
            if !child.is_closed() {
                child.close(mode);
            }
        }
        if mode == CloseMode::Emit {
            self.emit(EventInput::ConnectionClosed(ConnectionClosed {
                connection_id: self.id.to_string(),
            }));
        }
        self.scope.monitor.close();
        tracing::debug!(id = %self.id, kind = %self.kind, ?mode, "Binding closed");

        let hooks = std::mem::take(&mut *self.hooks.lock());
        for hook in hooks {
            hook(&self.id);
        }
        true
    }

    pub(crate) fn on_close(&self, hook: CloseHook) {
        {
            let mut hooks = self.hooks.lock();
            if self.state() != BindingState::Closed {
                hooks.push(hook);
                return;
            }
        }
        hook(&self.id);
    }
}
