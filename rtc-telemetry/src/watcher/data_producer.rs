//! Data producer and data consumer watching
//!
//! These only have a creation and a close; there is no pause state and no
//! track underneath.

use std::sync::{Arc, Weak};

use telemetry_events::{DataConsumerEvent, DataProducerEvent, EventInput};

use super::{ChildKey, ChildWatcher, CloseMode, ParentLink, WatcherCore};
use crate::context::Scope;
use crate::listeners::Subscription;
use crate::native::{DataConsumer, DataConsumerSignal, DataProducer, DataProducerSignal};

pub(crate) struct DataProducerWatcher {
    this: Weak<Self>,
    core: WatcherCore,
    producer: Arc<dyn DataProducer>,
}

impl DataProducerWatcher {
    pub(crate) fn new(
        scope: Arc<Scope>,
        producer: Arc<dyn DataProducer>,
        parent: ParentLink,
    ) -> Arc<Self> {
        let key = ChildKey::DataProducer(producer.id());
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: WatcherCore::new(key, scope, Some(parent)),
            producer,
        })
    }

    fn event(&self) -> DataProducerEvent {
        DataProducerEvent {
            connection_id: self.core.connection_id(),
            data_producer_id: self.producer.id(),
            label: self.producer.label(),
            protocol: self.producer.protocol(),
        }
    }
}

impl ChildWatcher for DataProducerWatcher {
    fn key(&self) -> &ChildKey {
        self.core.key()
    }

    fn start(&self) {
        if self.core.is_closed() {
            return;
        }
        self.core.emit(EventInput::DataProducerCreated(self.event()));

        let this = self.this.clone();
        self.core.hold(Subscription::attach(
            &self.producer,
            move |signal: &DataProducerSignal| match signal {
                DataProducerSignal::Close => {
                    if let Some(watcher) = this.upgrade() {
                        watcher.close(CloseMode::Emit);
                    }
                }
            },
        ));
    }

    fn close(&self, mode: CloseMode) {
        self.core
            .close(mode, || EventInput::DataProducerClosed(self.event()));
    }

    fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}

pub(crate) struct DataConsumerWatcher {
    this: Weak<Self>,
    core: WatcherCore,
    consumer: Arc<dyn DataConsumer>,
}

impl DataConsumerWatcher {
    pub(crate) fn new(
        scope: Arc<Scope>,
        consumer: Arc<dyn DataConsumer>,
        parent: ParentLink,
    ) -> Arc<Self> {
        let key = ChildKey::DataConsumer(consumer.id());
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: WatcherCore::new(key, scope, Some(parent)),
            consumer,
        })
    }

    fn event(&self) -> DataConsumerEvent {
        DataConsumerEvent {
            connection_id: self.core.connection_id(),
            data_consumer_id: self.consumer.id(),
            data_producer_id: self.consumer.data_producer_id(),
            label: self.consumer.label(),
            protocol: self.consumer.protocol(),
        }
    }
}

impl ChildWatcher for DataConsumerWatcher {
    fn key(&self) -> &ChildKey {
        self.core.key()
    }

    fn start(&self) {
        if self.core.is_closed() {
            return;
        }
        self.core.emit(EventInput::DataConsumerCreated(self.event()));

        let this = self.this.clone();
        self.core.hold(Subscription::attach(
            &self.consumer,
            move |signal: &DataConsumerSignal| match signal {
                DataConsumerSignal::Close => {
                    if let Some(watcher) = this.upgrade() {
                        watcher.close(CloseMode::Emit);
                    }
                }
            },
        ));
    }

    fn close(&self, mode: CloseMode) {
        self.core
            .close(mode, || EventInput::DataConsumerClosed(self.event()));
    }

    fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}
