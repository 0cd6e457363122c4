//! Contract for the platform objects being observed
//!
//! The host implements these traits over its real peer connections, SFU
//! transports and their children. The telemetry layer never owns or destroys
//! these objects: it holds `Arc` handles, subscribes to their signals and
//! identifies them by pointer identity ([`ObjectKey`]).
//!
//! Signals carry only what the platform delivers with the callback. State-change
//! signals carry nothing; the binding reads the current state from the object
//! when the signal fires, the same way a browser event handler would.

use std::sync::Arc;

use telemetry_events::{
    ConnectionState, DataChannelState, IceConnectionState, IceGatheringState, IceCandidateInfo,
    SignalingState, TrackKind, TrackProperties, TrackReadyState, TransportDirection,
};

/// Handle returned by a signal source for a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// A callback registered on a signal source
pub type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Something that delivers signals of type `S` to registered listeners
///
/// `unsubscribe` with an unknown or already removed id must be a no-op.
pub trait SignalSource<S>: Send + Sync {
    fn subscribe(&self, listener: Listener<S>) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId);
}

/// Identity of a platform object, derived from its `Arc` allocation
///
/// Two handles compare equal only if they point to the same object, regardless
/// of the object's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(usize);

impl ObjectKey {
    pub fn of<T: ?Sized>(object: &Arc<T>) -> Self {
        Self(Arc::as_ptr(object) as *const () as usize)
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj-{:#x}", self.0)
    }
}

// ============================================================================
// Peer connection
// ============================================================================

/// Partially populated candidate error as delivered by the platform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IceCandidateErrorInfo {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub url: Option<String>,
    pub error_code: Option<u16>,
    pub error_text: Option<String>,
}

pub enum PeerConnectionSignal {
    ConnectionStateChange,
    IceConnectionStateChange,
    IceGatheringStateChange,
    /// `None` marks the end of candidate gathering
    IceCandidate(Option<IceCandidateInfo>),
    IceCandidateError(IceCandidateErrorInfo),
    NegotiationNeeded,
    SignalingStateChange,
    Track(Arc<dyn MediaTrack>),
    DataChannel(Arc<dyn DataChannel>),
}

pub trait PeerConnection: SignalSource<PeerConnectionSignal> {
    fn connection_state(&self) -> ConnectionState;

    fn ice_connection_state(&self) -> IceConnectionState;

    fn ice_gathering_state(&self) -> IceGatheringState;

    fn signaling_state(&self) -> SignalingState;

    /// Remote tracks already received before the connection was registered
    fn remote_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        Vec::new()
    }
}

// ============================================================================
// Tracks and data channels
// ============================================================================

pub enum TrackSignal {
    Ended,
    Mute,
    Unmute,
}

pub trait MediaTrack: SignalSource<TrackSignal> {
    fn id(&self) -> String;

    fn kind(&self) -> TrackKind;

    fn label(&self) -> String;

    fn muted(&self) -> bool;

    fn enabled(&self) -> bool;

    fn ready_state(&self) -> TrackReadyState;

    fn content_hint(&self) -> String {
        String::new()
    }

    fn constraints(&self) -> TrackProperties {
        TrackProperties::new()
    }

    fn capabilities(&self) -> TrackProperties {
        TrackProperties::new()
    }

    fn settings(&self) -> TrackProperties {
        TrackProperties::new()
    }
}

pub enum DataChannelSignal {
    Open,
    Close,
    Error(String),
}

pub trait DataChannel: SignalSource<DataChannelSignal> {
    fn label(&self) -> String;

    /// Negotiated SCTP stream id, unknown until the channel is negotiated
    fn id(&self) -> Option<u16>;

    fn ready_state(&self) -> DataChannelState;

    fn protocol(&self) -> String {
        String::new()
    }
}

// ============================================================================
// SFU transport and its children
// ============================================================================

pub enum TransportSignal {
    ConnectionStateChange,
    IceGatheringStateChange,
    NewProducer(Arc<dyn Producer>),
    NewConsumer(Arc<dyn Consumer>),
    NewDataProducer(Arc<dyn DataProducer>),
    NewDataConsumer(Arc<dyn DataConsumer>),
    Close,
}

pub trait MediaTransport: SignalSource<TransportSignal> {
    fn id(&self) -> String;

    fn direction(&self) -> TransportDirection;

    fn connection_state(&self) -> ConnectionState;

    fn ice_gathering_state(&self) -> IceGatheringState;

    fn closed(&self) -> bool;

    fn producers(&self) -> Vec<Arc<dyn Producer>> {
        Vec::new()
    }

    fn consumers(&self) -> Vec<Arc<dyn Consumer>> {
        Vec::new()
    }

    fn data_producers(&self) -> Vec<Arc<dyn DataProducer>> {
        Vec::new()
    }

    fn data_consumers(&self) -> Vec<Arc<dyn DataConsumer>> {
        Vec::new()
    }
}

pub enum ProducerSignal {
    Pause,
    Resume,
    /// The producer's track was swapped; read the new one from [`Producer::track`]
    TrackReplaced,
    Close,
}

pub trait Producer: SignalSource<ProducerSignal> {
    fn id(&self) -> String;

    fn kind(&self) -> TrackKind;

    /// The track currently being sent, if any
    fn track(&self) -> Option<Arc<dyn MediaTrack>>;

    fn paused(&self) -> bool;

    fn closed(&self) -> bool;
}

pub enum ConsumerSignal {
    Pause,
    Resume,
    Close,
}

pub trait Consumer: SignalSource<ConsumerSignal> {
    fn id(&self) -> String;

    fn producer_id(&self) -> String;

    fn kind(&self) -> TrackKind;

    fn track(&self) -> Arc<dyn MediaTrack>;

    fn paused(&self) -> bool;

    fn closed(&self) -> bool;
}

pub enum DataProducerSignal {
    Close,
}

pub trait DataProducer: SignalSource<DataProducerSignal> {
    fn id(&self) -> String;

    fn label(&self) -> String;

    fn protocol(&self) -> String;

    fn closed(&self) -> bool;
}

pub enum DataConsumerSignal {
    Close,
}

pub trait DataConsumer: SignalSource<DataConsumerSignal> {
    fn id(&self) -> String;

    fn data_producer_id(&self) -> String;

    fn label(&self) -> String;

    fn protocol(&self) -> String;

    fn closed(&self) -> bool;
}

// ============================================================================
// Device
// ============================================================================

pub enum DeviceSignal {
    NewTransport(Arc<dyn MediaTransport>),
}

/// A device-level object that creates SFU transports
pub trait MediaDevice: SignalSource<DeviceSignal> {}
