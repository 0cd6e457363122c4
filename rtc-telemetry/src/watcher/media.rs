//! Producer and consumer watching
//!
//! Both carry a media track, watched through a [`TrackSlot`] owned by the
//! producer or consumer. The track is a grandchild of the transport: when its
//! owner closes, the track watcher is detached without an event of its own.

use std::sync::{Arc, Weak};

use telemetry_events::{ConsumerEvent, EventInput, ProducerEvent};

use super::{ChildKey, ChildWatcher, CloseMode, ParentLink, TrackOwner, TrackSlot, WatcherCore};
use crate::context::Scope;
use crate::listeners::Subscription;
use crate::monitor::StatsTick;
use crate::native::{Consumer, ConsumerSignal, Producer, ProducerSignal};

// ============================================================================
// Producer
// ============================================================================

pub(crate) struct ProducerWatcher {
    this: Weak<Self>,
    core: WatcherCore,
    producer: Arc<dyn Producer>,
    track: TrackSlot,
}

impl ProducerWatcher {
    pub(crate) fn new(scope: Arc<Scope>, producer: Arc<dyn Producer>, parent: ParentLink) -> Arc<Self> {
        let producer_id = producer.id();
        let track = TrackSlot::new(Arc::clone(&scope), TrackOwner::Producer(producer_id.clone()));
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: WatcherCore::new(ChildKey::Producer(producer_id), scope, Some(parent)),
            producer,
            track,
        })
    }

    fn event(&self) -> ProducerEvent {
        ProducerEvent {
            connection_id: self.core.connection_id(),
            producer_id: self.producer.id(),
            track_id: self.track.current_track_id(),
            kind: self.producer.kind(),
            paused: self.producer.paused(),
        }
    }

    /// Pick up the producer's current track, if it changed
    fn refresh_track(&self) {
        if !self.core.is_closed() {
            self.track.observe(self.producer.track());
        }
    }

    fn handle(&self, signal: &ProducerSignal) {
        match signal {
            ProducerSignal::Pause => self.core.emit(EventInput::ProducerPaused(self.event())),
            ProducerSignal::Resume => self.core.emit(EventInput::ProducerResumed(self.event())),
            ProducerSignal::TrackReplaced => self.refresh_track(),
            ProducerSignal::Close => self.close(CloseMode::Emit),
        }
    }
}

impl ChildWatcher for ProducerWatcher {
    fn key(&self) -> &ChildKey {
        self.core.key()
    }

    fn start(&self) {
        if self.core.is_closed() {
            return;
        }
        let current = self.producer.track();
        self.core.emit(EventInput::ProducerAdded(ProducerEvent {
            track_id: current.as_ref().map(|track| track.id()),
            ..self.event()
        }));
        self.track.observe(current);

        let this = self.this.clone();
        self.core.hold(Subscription::attach(
            &self.producer,
            move |signal: &ProducerSignal| {
                if let Some(watcher) = this.upgrade() {
                    watcher.handle(signal);
                }
            },
        ));

        if self.core.scope().watch_producer_tracks {
            let this = self.this.clone();
            self.core.hold(Subscription::attach(
                &self.core.scope().monitor,
                move |_: &StatsTick| {
                    if let Some(watcher) = this.upgrade() {
                        watcher.refresh_track();
                    }
                },
            ));
        }
    }

    fn close(&self, mode: CloseMode) {
        self.core.close_with(
            mode,
            || self.track.retire(),
            || EventInput::ProducerRemoved(self.event()),
        );
    }

    fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}

// ============================================================================
// Consumer
// ============================================================================

pub(crate) struct ConsumerWatcher {
    this: Weak<Self>,
    core: WatcherCore,
    consumer: Arc<dyn Consumer>,
    track: TrackSlot,
}

impl ConsumerWatcher {
    pub(crate) fn new(scope: Arc<Scope>, consumer: Arc<dyn Consumer>, parent: ParentLink) -> Arc<Self> {
        let consumer_id = consumer.id();
        let track = TrackSlot::new(Arc::clone(&scope), TrackOwner::Consumer(consumer_id.clone()));
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: WatcherCore::new(ChildKey::Consumer(consumer_id), scope, Some(parent)),
            consumer,
            track,
        })
    }

    fn event(&self) -> ConsumerEvent {
        ConsumerEvent {
            connection_id: self.core.connection_id(),
            consumer_id: self.consumer.id(),
            producer_id: self.consumer.producer_id(),
            track_id: Some(self.consumer.track().id()),
            kind: self.consumer.kind(),
            paused: self.consumer.paused(),
        }
    }

    fn handle(&self, signal: &ConsumerSignal) {
        match signal {
            ConsumerSignal::Pause => self.core.emit(EventInput::ConsumerPaused(self.event())),
            ConsumerSignal::Resume => self.core.emit(EventInput::ConsumerResumed(self.event())),
            ConsumerSignal::Close => self.close(CloseMode::Emit),
        }
    }
}

impl ChildWatcher for ConsumerWatcher {
    fn key(&self) -> &ChildKey {
        self.core.key()
    }

    fn start(&self) {
        if self.core.is_closed() {
            return;
        }
        self.core.emit(EventInput::ConsumerAdded(self.event()));
        self.track.observe(Some(self.consumer.track()));

        let this = self.this.clone();
        self.core.hold(Subscription::attach(
            &self.consumer,
            move |signal: &ConsumerSignal| {
                if let Some(watcher) = this.upgrade() {
                    watcher.handle(signal);
                }
            },
        ));
    }

    fn close(&self, mode: CloseMode) {
        self.core.close_with(
            mode,
            || self.track.retire(),
            || EventInput::ConsumerRemoved(self.event()),
        );
    }

    fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}
