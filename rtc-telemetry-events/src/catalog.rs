//! The event catalog
//!
//! Kinds are grouped by the object that emits them. Connection-level kinds are
//! shared by peer connections and SFU transports, so a consumer of the stream
//! cannot tell which technology produced an event.

use crate::payloads::*;

define_events! {
    // Connection lifecycle and state
    ConnectionOpened => "connection-opened": ConnectionOpened,
    ConnectionClosed => "connection-closed": ConnectionClosed,
    ConnectionStateChanged => "connection-state-changed": ConnectionStateChanged,
    IceConnectionStateChanged => "ice-connection-state-changed": IceConnectionStateChanged,
    IceGatheringStateChanged => "ice-gathering-state-changed": IceGatheringStateChanged,
    IceCandidate => "ice-candidate": IceCandidateEvent,
    IceCandidateError => "ice-candidate-error": IceCandidateError,
    NegotiationNeeded => "negotiation-needed": NegotiationNeeded,
    SignalingStateChanged => "signaling-state-changed": SignalingStateChanged,

    // Data channels
    DataChannelAdded => "data-channel-added": DataChannelEvent,
    DataChannelOpen => "data-channel-open": DataChannelEvent,
    DataChannelClosed => "data-channel-closed": DataChannelEvent,
    DataChannelError => "data-channel-error": DataChannelError,

    // Media tracks
    TrackAdded => "track-added": TrackAdded,
    TrackRemoved => "track-removed": TrackEvent,
    TrackMuted => "track-muted": TrackEvent,
    TrackUnmuted => "track-unmuted": TrackEvent,

    // SFU producers and consumers
    ProducerAdded => "producer-added": ProducerEvent,
    ProducerRemoved => "producer-removed": ProducerEvent,
    ProducerPaused => "producer-paused": ProducerEvent,
    ProducerResumed => "producer-resumed": ProducerEvent,
    ConsumerAdded => "consumer-added": ConsumerEvent,
    ConsumerRemoved => "consumer-removed": ConsumerEvent,
    ConsumerPaused => "consumer-paused": ConsumerEvent,
    ConsumerResumed => "consumer-resumed": ConsumerEvent,
    DataProducerCreated => "data-producer-created": DataProducerEvent,
    DataProducerClosed => "data-producer-closed": DataProducerEvent,
    DataConsumerCreated => "data-consumer-created": DataConsumerEvent,
    DataConsumerClosed => "data-consumer-closed": DataConsumerEvent,
}

impl EventKind {
    /// Whether this kind ends the lifecycle of the object that emitted it
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::ConnectionClosed
                | EventKind::DataChannelClosed
                | EventKind::TrackRemoved
                | EventKind::ProducerRemoved
                | EventKind::ConsumerRemoved
                | EventKind::DataProducerClosed
                | EventKind::DataConsumerClosed
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for PayloadProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PayloadProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadProvider")
            .field("kinds", &EventKind::ALL.len())
            .finish()
    }
}
