//! Media track watching

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use telemetry_events::{EventInput, TrackAdded, TrackDescriptor, TrackEvent, TrackReadyState};

use super::{ChildKey, ChildWatcher, CloseMode, ParentLink, WatcherCore};
use crate::context::Scope;
use crate::listeners::Subscription;
use crate::native::{MediaTrack, TrackSignal};

/// What a track hangs off, reported in every track event
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TrackOwner {
    Connection,
    Producer(String),
    Consumer(String),
}

impl TrackOwner {
    fn producer_id(&self) -> Option<String> {
        match self {
            TrackOwner::Producer(id) => Some(id.clone()),
            _ => None,
        }
    }

    fn consumer_id(&self) -> Option<String> {
        match self {
            TrackOwner::Consumer(id) => Some(id.clone()),
            _ => None,
        }
    }
}

pub(crate) struct TrackWatcher {
    this: Weak<Self>,
    core: WatcherCore,
    track: Arc<dyn MediaTrack>,
    owner: TrackOwner,
}

impl TrackWatcher {
    pub(crate) fn new(
        scope: Arc<Scope>,
        track: Arc<dyn MediaTrack>,
        owner: TrackOwner,
        parent: Option<ParentLink>,
    ) -> Arc<Self> {
        let key = ChildKey::Track(track.id());
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: WatcherCore::new(key, scope, parent),
            track,
            owner,
        })
    }

    pub(crate) fn track_id(&self) -> String {
        self.track.id()
    }

    fn descriptor(&self) -> TrackDescriptor {
        TrackDescriptor {
            track_id: self.track.id(),
            kind: self.track.kind(),
            label: self.track.label(),
            muted: self.track.muted(),
            enabled: self.track.enabled(),
            ready_state: self.track.ready_state(),
            content_hint: self.track.content_hint(),
        }
    }

    fn event(&self) -> TrackEvent {
        TrackEvent {
            connection_id: self.core.connection_id(),
            producer_id: self.owner.producer_id(),
            consumer_id: self.owner.consumer_id(),
            track: self.descriptor(),
        }
    }

    fn added(&self) -> TrackAdded {
        TrackAdded {
            connection_id: self.core.connection_id(),
            producer_id: self.owner.producer_id(),
            consumer_id: self.owner.consumer_id(),
            track: self.descriptor(),
            constraints: self.track.constraints(),
            capabilities: self.track.capabilities(),
            settings: self.track.settings(),
        }
    }

    fn handle(&self, signal: &TrackSignal) {
        match signal {
            TrackSignal::Ended => self.close(CloseMode::Emit),
            TrackSignal::Mute => self.core.emit(EventInput::TrackMuted(self.event())),
            TrackSignal::Unmute => self.core.emit(EventInput::TrackUnmuted(self.event())),
        }
    }
}

impl ChildWatcher for TrackWatcher {
    fn key(&self) -> &ChildKey {
        self.core.key()
    }

    fn start(&self) {
        if self.core.is_closed() {
            return;
        }
        self.core.emit(EventInput::TrackAdded(self.added()));

        let this = self.this.clone();
        self.core
            .hold(Subscription::attach(&self.track, move |signal: &TrackSignal| {
                if let Some(watcher) = this.upgrade() {
                    watcher.handle(signal);
                }
            }));
    }

    fn close(&self, mode: CloseMode) {
        self.core
            .close(mode, || EventInput::TrackRemoved(self.event()));
    }

    fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}

// ============================================================================
// TrackSlot - the current track of a producer or consumer
// ============================================================================

#[derive(Default)]
struct SlotState {
    last_track_id: Option<String>,
    watcher: Option<Arc<TrackWatcher>>,
    retired: bool,
}

/// Holds the watcher for whichever track an SFU child currently carries
///
/// Observing the same track id again is a no-op. A different id retires the
/// old watcher silently and starts a new one.
pub(crate) struct TrackSlot {
    scope: Arc<Scope>,
    owner: TrackOwner,
    state: Mutex<SlotState>,
}

impl TrackSlot {
    pub(crate) fn new(scope: Arc<Scope>, owner: TrackOwner) -> Self {
        Self {
            scope,
            owner,
            state: Mutex::new(SlotState::default()),
        }
    }

    /// Record the owner's current track; returns true if a new watcher started
    pub(crate) fn observe(&self, track: Option<Arc<dyn MediaTrack>>) -> bool {
        let next_id = track.as_ref().map(|track| track.id());
        let live = track.filter(|track| track.ready_state() != TrackReadyState::Ended);

        let (previous, next) = {
            let mut state = self.state.lock();
            if state.retired || state.last_track_id == next_id {
                return false;
            }
            state.last_track_id = next_id;
            let next = live.map(|track| {
                TrackWatcher::new(Arc::clone(&self.scope), track, self.owner.clone(), None)
            });
            (std::mem::replace(&mut state.watcher, next.clone()), next)
        };

        if let Some(previous) = previous {
            tracing::debug!(
                connection_id = %self.scope.connection_id,
                owner = ?self.owner,
                track_id = %previous.track_id(),
                "Retiring replaced track"
            );
            previous.close(CloseMode::Silent);
        }
        match next {
            Some(watcher) => {
                watcher.start();
                true
            }
            None => false,
        }
    }

    pub(crate) fn current_track_id(&self) -> Option<String> {
        self.state.lock().last_track_id.clone()
    }

    /// Stop watching for good; later observations are ignored
    pub(crate) fn retire(&self) {
        let watcher = {
            let mut state = self.state.lock();
            state.retired = true;
            state.watcher.take()
        };
        if let Some(watcher) = watcher {
            watcher.close(CloseMode::Silent);
        }
    }
}
