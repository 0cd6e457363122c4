//! In-memory platform objects for unit tests

use std::sync::Arc;

use parking_lot::Mutex;
use telemetry_events::{
    ConnectionState, DataChannelState, IceConnectionState, IceGatheringState, MemorySink,
    PayloadProvider, SignalingState, TrackKind, TrackReadyState, TransportDirection,
};

use crate::context::{EventContext, Scope};
use crate::listeners::ListenerSet;
use crate::monitor::TickMonitor;
use crate::native::*;

macro_rules! signal_source {
    ($ty:ty, $signal:ty) => {
        impl SignalSource<$signal> for $ty {
            fn subscribe(&self, listener: Listener<$signal>) -> ListenerId {
                self.listeners.add(listener)
            }

            fn unsubscribe(&self, id: ListenerId) {
                self.listeners.remove(id);
            }
        }

        impl $ty {
            pub(crate) fn fire(&self, signal: $signal) {
                self.listeners.emit(&signal);
            }

            pub(crate) fn listener_count(&self) -> usize {
                self.listeners.len()
            }
        }
    };
}

/// A scope over a fresh memory sink and tick monitor
pub(crate) fn scope(connection_id: &str) -> (Arc<MemorySink>, Arc<Scope>) {
    let (sink, scope, _monitor) = scope_with_monitor(connection_id, true);
    (sink, scope)
}

pub(crate) fn scope_with_monitor(
    connection_id: &str,
    watch_producer_tracks: bool,
) -> (Arc<MemorySink>, Arc<Scope>, Arc<TickMonitor>) {
    let sink = Arc::new(MemorySink::new());
    let monitor = Arc::new(TickMonitor::new());
    let scope = Arc::new(Scope {
        connection_id: connection_id.to_string(),
        events: Arc::new(EventContext::new(sink.clone(), PayloadProvider::new())),
        monitor: monitor.clone(),
        watch_producer_tracks,
    });
    (sink, scope, monitor)
}

// ============================================================================
// Tracks and data channels
// ============================================================================

pub(crate) struct MockTrack {
    id: String,
    kind: TrackKind,
    ready_state: Mutex<TrackReadyState>,
    muted: Mutex<bool>,
    listeners: ListenerSet<TrackSignal>,
}

impl MockTrack {
    pub(crate) fn new(id: &str, kind: TrackKind) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            kind,
            ready_state: Mutex::new(TrackReadyState::Live),
            muted: Mutex::new(false),
            listeners: ListenerSet::new(),
        })
    }

    pub(crate) fn video(id: &str) -> Arc<Self> {
        Self::new(id, TrackKind::Video)
    }

    pub(crate) fn audio(id: &str) -> Arc<Self> {
        Self::new(id, TrackKind::Audio)
    }

    pub(crate) fn set_ready_state(&self, state: TrackReadyState) {
        *self.ready_state.lock() = state;
    }

    pub(crate) fn end(&self) {
        self.set_ready_state(TrackReadyState::Ended);
        self.fire(TrackSignal::Ended);
    }
}

signal_source!(MockTrack, TrackSignal);

impl MediaTrack for MockTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> String {
        format!("{} {}", self.kind, self.id)
    }

    fn muted(&self) -> bool {
        *self.muted.lock()
    }

    fn enabled(&self) -> bool {
        true
    }

    fn ready_state(&self) -> TrackReadyState {
        *self.ready_state.lock()
    }
}

pub(crate) struct MockDataChannel {
    label: String,
    ready_state: Mutex<DataChannelState>,
    listeners: ListenerSet<DataChannelSignal>,
}

impl MockDataChannel {
    pub(crate) fn new(label: &str) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            ready_state: Mutex::new(DataChannelState::Connecting),
            listeners: ListenerSet::new(),
        })
    }

    pub(crate) fn open(&self) {
        *self.ready_state.lock() = DataChannelState::Open;
        self.fire(DataChannelSignal::Open);
    }

    pub(crate) fn close(&self) {
        *self.ready_state.lock() = DataChannelState::Closed;
        self.fire(DataChannelSignal::Close);
    }
}

signal_source!(MockDataChannel, DataChannelSignal);

impl DataChannel for MockDataChannel {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn id(&self) -> Option<u16> {
        match *self.ready_state.lock() {
            DataChannelState::Connecting => None,
            _ => Some(1),
        }
    }

    fn ready_state(&self) -> DataChannelState {
        *self.ready_state.lock()
    }
}

// ============================================================================
// Peer connection
// ============================================================================

pub(crate) struct MockPeerConnection {
    state: Mutex<ConnectionState>,
    tracks: Mutex<Vec<Arc<dyn MediaTrack>>>,
    listeners: ListenerSet<PeerConnectionSignal>,
}

impl MockPeerConnection {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ConnectionState::New),
            tracks: Mutex::new(Vec::new()),
            listeners: ListenerSet::new(),
        })
    }

    pub(crate) fn with_remote_track(self: Arc<Self>, track: Arc<dyn MediaTrack>) -> Arc<Self> {
        self.tracks.lock().push(track);
        self
    }

    pub(crate) fn with_state(self: Arc<Self>, state: ConnectionState) -> Arc<Self> {
        *self.state.lock() = state;
        self
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
        self.fire(PeerConnectionSignal::ConnectionStateChange);
    }
}

signal_source!(MockPeerConnection, PeerConnectionSignal);

impl PeerConnection for MockPeerConnection {
    fn connection_state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn ice_connection_state(&self) -> IceConnectionState {
        IceConnectionState::New
    }

    fn ice_gathering_state(&self) -> IceGatheringState {
        IceGatheringState::New
    }

    fn signaling_state(&self) -> SignalingState {
        SignalingState::Stable
    }

    fn remote_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks.lock().clone()
    }
}

// ============================================================================
// SFU objects
// ============================================================================

/// Id, pause and close flags shared by the SFU mocks
///
/// `T` holds whatever else a particular mock needs, such as its track.
pub(crate) struct MockHandle<S, T = ()> {
    id: String,
    extra: T,
    paused: Mutex<bool>,
    closed: Mutex<bool>,
    listeners: ListenerSet<S>,
}

impl<S, T> MockHandle<S, T> {
    fn with(id: &str, extra: T) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            extra,
            paused: Mutex::new(false),
            closed: Mutex::new(false),
            listeners: ListenerSet::new(),
        })
    }

    pub(crate) fn fire(&self, signal: S) {
        self.listeners.emit(&signal);
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn set_paused(&self, paused: bool, signal: S) {
        *self.paused.lock() = paused;
        self.fire(signal);
    }

    fn set_closed(&self, signal: S) {
        *self.closed.lock() = true;
        self.fire(signal);
    }
}

impl<S, T: Send + Sync> SignalSource<S> for MockHandle<S, T> {
    fn subscribe(&self, listener: Listener<S>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}

pub(crate) type MockProducer = MockHandle<ProducerSignal, Mutex<Option<Arc<dyn MediaTrack>>>>;

impl MockProducer {
    pub(crate) fn new(id: &str) -> Arc<Self> {
        Self::with(id, Mutex::new(None))
    }

    /// Swap the track without notifying anyone
    pub(crate) fn set_track(&self, track: Option<Arc<dyn MediaTrack>>) {
        *self.extra.lock() = track;
    }

    pub(crate) fn pause(&self) {
        self.set_paused(true, ProducerSignal::Pause);
    }

    pub(crate) fn resume(&self) {
        self.set_paused(false, ProducerSignal::Resume);
    }

    pub(crate) fn close(&self) {
        self.set_closed(ProducerSignal::Close);
    }
}

impl Producer for MockProducer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn track(&self) -> Option<Arc<dyn MediaTrack>> {
        self.extra.lock().clone()
    }

    fn paused(&self) -> bool {
        *self.paused.lock()
    }

    fn closed(&self) -> bool {
        *self.closed.lock()
    }
}

pub(crate) type MockConsumer = MockHandle<ConsumerSignal, Arc<dyn MediaTrack>>;

impl MockConsumer {
    pub(crate) fn new(id: &str, track: Arc<dyn MediaTrack>) -> Arc<Self> {
        Self::with(id, track)
    }

    pub(crate) fn pause(&self) {
        self.set_paused(true, ConsumerSignal::Pause);
    }

    pub(crate) fn resume(&self) {
        self.set_paused(false, ConsumerSignal::Resume);
    }

    pub(crate) fn close(&self) {
        self.set_closed(ConsumerSignal::Close);
    }
}

impl Consumer for MockConsumer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn producer_id(&self) -> String {
        format!("remote-{}", self.id)
    }

    fn kind(&self) -> TrackKind {
        self.extra.kind()
    }

    fn track(&self) -> Arc<dyn MediaTrack> {
        Arc::clone(&self.extra)
    }

    fn paused(&self) -> bool {
        *self.paused.lock()
    }

    fn closed(&self) -> bool {
        *self.closed.lock()
    }
}

pub(crate) type MockDataProducer = MockHandle<DataProducerSignal>;

impl MockDataProducer {
    pub(crate) fn new(id: &str) -> Arc<Self> {
        Self::with(id, ())
    }

    pub(crate) fn close(&self) {
        self.set_closed(DataProducerSignal::Close);
    }
}

impl DataProducer for MockDataProducer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn label(&self) -> String {
        "chat".to_string()
    }

    fn protocol(&self) -> String {
        String::new()
    }

    fn closed(&self) -> bool {
        *self.closed.lock()
    }
}

pub(crate) type MockDataConsumer = MockHandle<DataConsumerSignal>;

impl MockDataConsumer {
    pub(crate) fn new(id: &str) -> Arc<Self> {
        Self::with(id, ())
    }

    pub(crate) fn close(&self) {
        self.set_closed(DataConsumerSignal::Close);
    }
}

impl DataConsumer for MockDataConsumer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn data_producer_id(&self) -> String {
        format!("remote-{}", self.id)
    }

    fn label(&self) -> String {
        "chat".to_string()
    }

    fn protocol(&self) -> String {
        String::new()
    }

    fn closed(&self) -> bool {
        *self.closed.lock()
    }
}

pub(crate) type MockTransport = MockHandle<TransportSignal, Mutex<Vec<Arc<dyn Producer>>>>;

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Self::with("mock-transport", Mutex::new(Vec::new()))
    }

    pub(crate) fn with_producer(self: Arc<Self>, producer: Arc<dyn Producer>) -> Arc<Self> {
        self.extra.lock().push(producer);
        self
    }

    pub(crate) fn close(&self) {
        self.set_closed(TransportSignal::Close);
    }
}

impl MediaTransport for MockTransport {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn direction(&self) -> TransportDirection {
        TransportDirection::Send
    }

    fn connection_state(&self) -> ConnectionState {
        ConnectionState::New
    }

    fn ice_gathering_state(&self) -> IceGatheringState {
        IceGatheringState::New
    }

    fn closed(&self) -> bool {
        *self.closed.lock()
    }

    fn producers(&self) -> Vec<Arc<dyn Producer>> {
        self.extra.lock().clone()
    }
}

pub(crate) type MockDevice = MockHandle<DeviceSignal>;

impl MockDevice {
    pub(crate) fn new() -> Arc<Self> {
        Self::with("mock-device", ())
    }
}

impl MediaDevice for MockDevice {}
