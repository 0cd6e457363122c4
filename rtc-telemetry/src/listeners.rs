//! Listener bookkeeping
//!
//! - `ListenerSet`: an ordered listener list for anything that emits signals
//! - `Subscription`: an owned handle that detaches one listener exactly once

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::native::{Listener, ListenerId, SignalSource};

// ============================================================================
// ListenerSet
// ============================================================================

/// Ordered set of listeners for one signal type
///
/// Dispatch works on a snapshot, so listeners may add or remove listeners
/// (including themselves) while being called. A listener removed during a
/// dispatch is not called for the remainder of that dispatch.
pub struct ListenerSet<S> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Listener<S>)>>,
}

impl<S> ListenerSet<S> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, listener: Listener<S>) -> ListenerId {
        let id = ListenerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    /// Remove a listener, returning whether it was registered
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.lock().iter().any(|(existing, _)| *existing == id)
    }

    /// Call every listener with `signal`, in registration order
    pub fn emit(&self, signal: &S) {
        let snapshot: Vec<_> = self.listeners.lock().clone();
        for (id, listener) in snapshot {
            if self.contains(id) {
                listener(signal);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    pub fn clear(&self) {
        self.listeners.lock().clear();
    }
}

impl<S> Default for ListenerSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for ListenerSet<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<S: Send + Sync> SignalSource<S> for ListenerSet<S> {
    fn subscribe(&self, listener: Listener<S>) -> ListenerId {
        self.add(listener)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.remove(id);
    }
}

// ============================================================================
// Subscription
// ============================================================================

type Detach = Box<dyn FnOnce() + Send>;

/// Owned registration of one listener on one signal source
///
/// Cancelling detaches the listener; a second cancel does nothing. Dropping
/// the handle cancels it, so a listener can only outlive its handle through
/// `mem::forget`.
#[must_use = "dropping a Subscription detaches its listener immediately"]
pub struct Subscription {
    detach: Option<Detach>,
}

impl Subscription {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Register `listener` on `source` and own the registration
    ///
    /// The handle keeps only a weak reference to the source; if the source is
    /// gone by the time the handle is cancelled there is nothing to detach.
    pub fn attach<T, S>(source: &Arc<T>, listener: impl Fn(&S) + Send + Sync + 'static) -> Self
    where
        T: SignalSource<S> + ?Sized + 'static,
        S: 'static,
    {
        let id = source.subscribe(Arc::new(listener));
        let source: Weak<T> = Arc::downgrade(source);
        Self::new(move || {
            if let Some(source) = source.upgrade() {
                source.unsubscribe(id);
            }
        })
    }

    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ============================================================================
// Attachment - the set of subscriptions held by one watcher or binding
// ============================================================================

#[derive(Default)]
struct AttachmentState {
    detached: bool,
    subscriptions: Vec<Subscription>,
}

/// Subscriptions owned by one watcher or binding, released together
///
/// Once detached, any subscription handed to [`Attachment::hold`] is cancelled
/// on the spot, so nothing can be attached after teardown.
#[derive(Default)]
pub(crate) struct Attachment {
    state: Mutex<AttachmentState>,
}

impl Attachment {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Keep a subscription alive until detach; returns false if already detached
    pub(crate) fn hold(&self, subscription: Subscription) -> bool {
        let mut state = self.state.lock();
        if state.detached {
            drop(state);
            drop(subscription);
            return false;
        }
        state.subscriptions.push(subscription);
        true
    }

    /// Cancel every held subscription
    ///
    /// Returns true only for the call that performed the detach. Subscriptions
    /// are cancelled after the lock is released.
    pub(crate) fn detach(&self) -> bool {
        let subscriptions = {
            let mut state = self.state.lock();
            if state.detached {
                return false;
            }
            state.detached = true;
            std::mem::take(&mut state.subscriptions)
        };
        drop(subscriptions);
        true
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.state.lock().detached
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().subscriptions.len()
    }
}
