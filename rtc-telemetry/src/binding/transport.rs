use std::sync::{Arc, Weak};

use telemetry_events::{
    ConnectionOpened, ConnectionStateChanged, EventInput, IceGatheringStateChanged,
};

use super::{Binding, BindingCore, BindingId, BindingKind, BindingState, CloseHook};
use crate::config::CollectorConfig;
use crate::context::{EventContext, Scope};
use crate::listeners::Subscription;
use crate::monitor::MonitorFactory;
use crate::native::{
    Consumer, DataConsumer, DataProducer, MediaTransport, ObjectKey, Producer, TransportSignal,
};
use crate::watcher::{
    CloseMode, ConsumerWatcher, DataConsumerWatcher, DataProducerWatcher, ProducerWatcher,
};

/// Binding over an SFU transport
///
/// Emits the same connection-level vocabulary as
/// [`PeerConnectionBinding`](super::PeerConnectionBinding). Closing is driven
/// by the transport's own close notification rather than its connection state.
pub struct TransportBinding {
    this: Weak<Self>,
    core: BindingCore,
    transport: Arc<dyn MediaTransport>,
    scan_existing: bool,
    close_if_already_closed: bool,
}

impl TransportBinding {
    pub(crate) fn new(
        id: BindingId,
        transport: Arc<dyn MediaTransport>,
        events: Arc<EventContext>,
        monitors: &dyn MonitorFactory,
        config: &CollectorConfig,
    ) -> Arc<Self> {
        let scope = Arc::new(Scope {
            connection_id: id.to_string(),
            events,
            monitor: monitors.transport_monitor(id.as_str(), &transport),
            watch_producer_tracks: config.watch_producer_tracks_on_stats,
        });
        let key = ObjectKey::of(&transport);
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: BindingCore::new(id, key, BindingKind::Transport, scope),
            transport,
            scan_existing: config.scan_existing_children,
            close_if_already_closed: config.close_if_already_closed,
        })
    }

    /// The platform's own identifier for the transport
    pub fn transport_id(&self) -> String {
        self.transport.id()
    }

    fn opened(&self) -> ConnectionOpened {
        ConnectionOpened {
            connection_id: self.core.id().to_string(),
            connection_state: Some(self.transport.connection_state()),
            ice_connection_state: None,
            ice_gathering_state: Some(self.transport.ice_gathering_state()),
            signaling_state: None,
            direction: Some(self.transport.direction()),
        }
    }

    fn watch_producer(&self, producer: Arc<dyn Producer>) {
        if producer.closed() {
            return;
        }
        let scope = Arc::clone(self.core.scope());
        self.core
            .adopt(ProducerWatcher::new(scope, producer, self.core.parent_link()));
    }

    fn watch_consumer(&self, consumer: Arc<dyn Consumer>) {
        if consumer.closed() {
            return;
        }
        let scope = Arc::clone(self.core.scope());
        self.core
            .adopt(ConsumerWatcher::new(scope, consumer, self.core.parent_link()));
    }

    fn watch_data_producer(&self, producer: Arc<dyn DataProducer>) {
        if producer.closed() {
            return;
        }
        let scope = Arc::clone(self.core.scope());
        self.core
            .adopt(DataProducerWatcher::new(scope, producer, self.core.parent_link()));
    }

    fn watch_data_consumer(&self, consumer: Arc<dyn DataConsumer>) {
        if consumer.closed() {
            return;
        }
        let scope = Arc::clone(self.core.scope());
        self.core
            .adopt(DataConsumerWatcher::new(scope, consumer, self.core.parent_link()));
    }

    fn scan(&self) {
        for producer in self.transport.producers() {
            self.watch_producer(producer);
        }
        for consumer in self.transport.consumers() {
            self.watch_consumer(consumer);
        }
        for producer in self.transport.data_producers() {
            self.watch_data_producer(producer);
        }
        for consumer in self.transport.data_consumers() {
            self.watch_data_consumer(consumer);
        }
    }

    fn handle(&self, signal: &TransportSignal) {
        match signal {
            TransportSignal::ConnectionStateChange => {
                self.core
                    .emit(EventInput::ConnectionStateChanged(ConnectionStateChanged {
                        connection_id: self.core.id().to_string(),
                        connection_state: self.transport.connection_state(),
                    }))
            }
            TransportSignal::IceGatheringStateChange => {
                self.core
                    .emit(EventInput::IceGatheringStateChanged(IceGatheringStateChanged {
                        connection_id: self.core.id().to_string(),
                        ice_gathering_state: self.transport.ice_gathering_state(),
                    }))
            }
            TransportSignal::NewProducer(producer) => self.watch_producer(Arc::clone(producer)),
            TransportSignal::NewConsumer(consumer) => self.watch_consumer(Arc::clone(consumer)),
            TransportSignal::NewDataProducer(producer) => {
                self.watch_data_producer(Arc::clone(producer))
            }
            TransportSignal::NewDataConsumer(consumer) => {
                self.watch_data_consumer(Arc::clone(consumer))
            }
            TransportSignal::Close => {
                self.core.shutdown(CloseMode::Emit);
            }
        }
    }
}

impl Binding for TransportBinding {
    fn id(&self) -> &BindingId {
        self.core.id()
    }

    fn object_key(&self) -> ObjectKey {
        self.core.key()
    }

    fn kind(&self) -> BindingKind {
        self.core.kind()
    }

    fn state(&self) -> BindingState {
        self.core.state()
    }

    fn bind(&self) {
        if !self.core.begin_bind() {
            return;
        }
        self.core.emit(EventInput::ConnectionOpened(self.opened()));

        let this = self.this.clone();
        self.core.hold(Subscription::attach(
            &self.transport,
            move |signal: &TransportSignal| {
                if let Some(binding) = this.upgrade() {
                    binding.handle(signal);
                }
            },
        ));

        if self.scan_existing {
            self.scan();
        }

        if self.close_if_already_closed && self.transport.closed() {
            tracing::debug!(id = %self.core.id(), "Transport registered after close");
            self.core.shutdown(CloseMode::Emit);
        }
    }

    fn unbind(&self) {
        self.core.shutdown(CloseMode::Silent);
    }

    fn on_close(&self, hook: CloseHook) {
        self.core.on_close(hook);
    }

    fn child_count(&self) -> usize {
        self.core.child_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{
        MockConsumer, MockDataConsumer, MockDataProducer, MockProducer, MockTrack, MockTransport,
    };
    use crate::monitor::TickMonitorFactory;
    use rstest::rstest;
    use telemetry_events::{EventKind, MemorySink, PayloadProvider};

    fn bind(transport: Arc<MockTransport>) -> (Arc<MemorySink>, Arc<TransportBinding>) {
        let sink = Arc::new(MemorySink::new());
        let events = Arc::new(EventContext::new(sink.clone(), PayloadProvider::new()));
        let binding = TransportBinding::new(
            BindingId::new("t-1"),
            transport,
            events,
            &TickMonitorFactory::new(),
            &CollectorConfig::default(),
        );
        binding.bind();
        (sink, binding)
    }

    #[test]
    fn test_opened_has_transport_fields_only() {
        let (sink, binding) = bind(MockTransport::new());
        let opened = &sink.events()[0];

        assert_eq!(opened.kind(), EventKind::ConnectionOpened);
        assert_eq!(opened.payload()["connectionState"], "new");
        assert!(opened.payload()["signalingState"].is_null());
        assert!(opened.payload()["iceConnectionState"].is_null());
        assert_eq!(opened.field_str("direction"), Some("send"));
        assert_eq!(binding.transport_id(), "mock-transport");
    }

    #[test]
    fn test_closed_producers_are_not_scanned() {
        let closed = MockProducer::new("p0");
        closed.close();
        let transport = MockTransport::new()
            .with_producer(closed)
            .with_producer(MockProducer::new("p1"));
        let (sink, binding) = bind(transport);

        assert_eq!(sink.kinds(), vec![EventKind::ConnectionOpened, EventKind::ProducerAdded]);
        assert_eq!(binding.child_count(), 1);
    }

    #[rstest]
    #[case::consumer(
        TransportSignal::NewConsumer(MockConsumer::new("c1", MockTrack::audio("a1"))),
        vec![EventKind::ConsumerAdded, EventKind::TrackAdded],
        EventKind::ConsumerRemoved
    )]
    #[case::data_producer(
        TransportSignal::NewDataProducer(MockDataProducer::new("dp1")),
        vec![EventKind::DataProducerCreated],
        EventKind::DataProducerClosed
    )]
    #[case::data_consumer(
        TransportSignal::NewDataConsumer(MockDataConsumer::new("dc1")),
        vec![EventKind::DataConsumerCreated],
        EventKind::DataConsumerClosed
    )]
    fn test_new_child_then_transport_close(
        #[case] signal: TransportSignal,
        #[case] added: Vec<EventKind>,
        #[case] terminal: EventKind,
    ) {
        let transport = MockTransport::new();
        let (sink, binding) = bind(transport.clone());

        transport.fire(signal);
        assert_eq!(binding.child_count(), 1);
        transport.close();

        let mut expected = vec![EventKind::ConnectionOpened];
        expected.extend(added);
        expected.push(terminal);
        expected.push(EventKind::ConnectionClosed);
        assert_eq!(sink.kinds(), expected);
        assert_eq!(binding.state(), BindingState::Closed);
        assert_eq!(transport.listener_count(), 0);
    }

    #[test]
    fn test_state_change_does_not_close_transport() {
        let transport = MockTransport::new();
        let (sink, binding) = bind(transport.clone());

        transport.fire(TransportSignal::ConnectionStateChange);
        transport.fire(TransportSignal::IceGatheringStateChange);

        assert_eq!(
            sink.kinds(),
            vec![
                EventKind::ConnectionOpened,
                EventKind::ConnectionStateChanged,
                EventKind::IceGatheringStateChanged,
            ]
        );
        assert_eq!(binding.state(), BindingState::Bound);
    }
}
