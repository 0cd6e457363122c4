//! Scriptable platform objects for integration tests
//!
//! Each fake stores its observable state behind a mutex and delivers signals
//! through a [`ListenerSet`], the same way a host adapter would.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use rtc_telemetry::native::*;
use rtc_telemetry::ListenerSet;
use telemetry_events::{
    ConnectionState, DataChannelState, IceConnectionState, IceGatheringState, SignalingState,
    TrackKind, TrackReadyState, TransportDirection,
};

macro_rules! fake_signal_source {
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
            pub fn fire(&self, signal: $signal) {
                self.listeners.emit(&signal);
            }

            pub fn listener_count(&self) -> usize {
                self.listeners.len()
            }
        }
    };
}

// ============================================================================
// Tracks and data channels
// ============================================================================

pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    muted: Mutex<bool>,
    ready_state: Mutex<TrackReadyState>,
    listeners: ListenerSet<TrackSignal>,
}

impl FakeTrack {
    pub fn new(id: &str, kind: TrackKind) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            kind,
            muted: Mutex::new(false),
            ready_state: Mutex::new(TrackReadyState::Live),
            listeners: ListenerSet::new(),
        })
    }

    pub fn video(id: &str) -> Arc<Self> {
        Self::new(id, TrackKind::Video)
    }

    pub fn audio(id: &str) -> Arc<Self> {
        Self::new(id, TrackKind::Audio)
    }

    pub fn mute(&self) {
        *self.muted.lock() = true;
        self.fire(TrackSignal::Mute);
    }

    pub fn unmute(&self) {
        *self.muted.lock() = false;
        self.fire(TrackSignal::Unmute);
    }

    pub fn end(&self) {
        *self.ready_state.lock() = TrackReadyState::Ended;
        self.fire(TrackSignal::Ended);
    }
}

fake_signal_source!(FakeTrack, TrackSignal);

impl MediaTrack for FakeTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> String {
        format!("fake {} track", self.kind)
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

pub struct FakeDataChannel {
    label: String,
    state: Mutex<DataChannelState>,
    listeners: ListenerSet<DataChannelSignal>,
}

impl FakeDataChannel {
    pub fn new(label: &str) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            state: Mutex::new(DataChannelState::Connecting),
            listeners: ListenerSet::new(),
        })
    }

    pub fn open(&self) {
        *self.state.lock() = DataChannelState::Open;
        self.fire(DataChannelSignal::Open);
    }

    pub fn close(&self) {
        *self.state.lock() = DataChannelState::Closed;
        self.fire(DataChannelSignal::Close);
    }
}

fake_signal_source!(FakeDataChannel, DataChannelSignal);

impl DataChannel for FakeDataChannel {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn id(&self) -> Option<u16> {
        match *self.state.lock() {
            DataChannelState::Connecting => None,
            _ => Some(0),
        }
    }

    fn ready_state(&self) -> DataChannelState {
        *self.state.lock()
    }
}

// ============================================================================
// Peer connection
// ============================================================================

pub struct FakePeerConnection {
    connection_state: Mutex<ConnectionState>,
    ice_connection_state: Mutex<IceConnectionState>,
    remote_tracks: Mutex<Vec<Arc<dyn MediaTrack>>>,
    listeners: ListenerSet<PeerConnectionSignal>,
}

impl FakePeerConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connection_state: Mutex::new(ConnectionState::New),
            ice_connection_state: Mutex::new(IceConnectionState::New),
            remote_tracks: Mutex::new(Vec::new()),
            listeners: ListenerSet::new(),
        })
    }

    /// Deliver a remote track the way the platform's `track` event does
    pub fn receive_track(&self, track: Arc<dyn MediaTrack>) {
        self.remote_tracks.lock().push(Arc::clone(&track));
        self.fire(PeerConnectionSignal::Track(track));
    }

    pub fn receive_data_channel(&self, channel: Arc<dyn DataChannel>) {
        self.fire(PeerConnectionSignal::DataChannel(channel));
    }

    pub fn set_connection_state(&self, state: ConnectionState) {
        *self.connection_state.lock() = state;
        self.fire(PeerConnectionSignal::ConnectionStateChange);
    }

    pub fn set_ice_connection_state(&self, state: IceConnectionState) {
        *self.ice_connection_state.lock() = state;
        self.fire(PeerConnectionSignal::IceConnectionStateChange);
    }
}

fake_signal_source!(FakePeerConnection, PeerConnectionSignal);

impl PeerConnection for FakePeerConnection {
    fn connection_state(&self) -> ConnectionState {
        *self.connection_state.lock()
    }

    fn ice_connection_state(&self) -> IceConnectionState {
        *self.ice_connection_state.lock()
    }

    fn ice_gathering_state(&self) -> IceGatheringState {
        IceGatheringState::New
    }

    fn signaling_state(&self) -> SignalingState {
        SignalingState::Stable
    }

    fn remote_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.remote_tracks.lock().clone()
    }
}

// ============================================================================
// SFU objects
// ============================================================================

pub struct FakeProducer {
    id: String,
    kind: TrackKind,
    track: Mutex<Option<Arc<dyn MediaTrack>>>,
    paused: Mutex<bool>,
    closed: Mutex<bool>,
    listeners: ListenerSet<ProducerSignal>,
}

impl FakeProducer {
    pub fn new(id: &str, kind: TrackKind) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            kind,
            track: Mutex::new(None),
            paused: Mutex::new(false),
            closed: Mutex::new(false),
            listeners: ListenerSet::new(),
        })
    }

    /// Attach a track without any notification, like an SDK that only
    /// exposes the track as a property
    pub fn set_track(&self, track: Option<Arc<dyn MediaTrack>>) {
        *self.track.lock() = track;
    }

    pub fn replace_track(&self, track: Option<Arc<dyn MediaTrack>>) {
        self.set_track(track);
        self.fire(ProducerSignal::TrackReplaced);
    }

    pub fn pause(&self) {
        *self.paused.lock() = true;
        self.fire(ProducerSignal::Pause);
    }

    pub fn resume(&self) {
        *self.paused.lock() = false;
        self.fire(ProducerSignal::Resume);
    }

    pub fn close(&self) {
        *self.closed.lock() = true;
        self.fire(ProducerSignal::Close);
    }
}

fake_signal_source!(FakeProducer, ProducerSignal);

impl Producer for FakeProducer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn track(&self) -> Option<Arc<dyn MediaTrack>> {
        self.track.lock().clone()
    }

    fn paused(&self) -> bool {
        *self.paused.lock()
    }

    fn closed(&self) -> bool {
        *self.closed.lock()
    }
}

pub struct FakeConsumer {
    id: String,
    producer_id: String,
    track: Arc<dyn MediaTrack>,
    paused: Mutex<bool>,
    closed: Mutex<bool>,
    listeners: ListenerSet<ConsumerSignal>,
}

impl FakeConsumer {
    pub fn new(id: &str, producer_id: &str, track: Arc<dyn MediaTrack>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            producer_id: producer_id.to_string(),
            track,
            paused: Mutex::new(false),
            closed: Mutex::new(false),
            listeners: ListenerSet::new(),
        })
    }

    pub fn pause(&self) {
        *self.paused.lock() = true;
        self.fire(ConsumerSignal::Pause);
    }

    pub fn resume(&self) {
        *self.paused.lock() = false;
        self.fire(ConsumerSignal::Resume);
    }

    pub fn close(&self) {
        *self.closed.lock() = true;
        self.fire(ConsumerSignal::Close);
    }
}

fake_signal_source!(FakeConsumer, ConsumerSignal);

impl Consumer for FakeConsumer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn producer_id(&self) -> String {
        self.producer_id.clone()
    }

    fn kind(&self) -> TrackKind {
        self.track.kind()
    }

    fn track(&self) -> Arc<dyn MediaTrack> {
        Arc::clone(&self.track)
    }

    fn paused(&self) -> bool {
        *self.paused.lock()
    }

    fn closed(&self) -> bool {
        *self.closed.lock()
    }
}

pub struct FakeDataProducer {
    id: String,
    closed: Mutex<bool>,
    listeners: ListenerSet<DataProducerSignal>,
}

impl FakeDataProducer {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            closed: Mutex::new(false),
            listeners: ListenerSet::new(),
        })
    }

    pub fn close(&self) {
        *self.closed.lock() = true;
        self.fire(DataProducerSignal::Close);
    }
}

fake_signal_source!(FakeDataProducer, DataProducerSignal);

impl DataProducer for FakeDataProducer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn label(&self) -> String {
        "telemetry".to_string()
    }

    fn protocol(&self) -> String {
        "json".to_string()
    }

    fn closed(&self) -> bool {
        *self.closed.lock()
    }
}

pub struct FakeDataConsumer {
    id: String,
    data_producer_id: String,
    closed: Mutex<bool>,
    listeners: ListenerSet<DataConsumerSignal>,
}

impl FakeDataConsumer {
    pub fn new(id: &str, data_producer_id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            data_producer_id: data_producer_id.to_string(),
            closed: Mutex::new(false),
            listeners: ListenerSet::new(),
        })
    }

    pub fn close(&self) {
        *self.closed.lock() = true;
        self.fire(DataConsumerSignal::Close);
    }
}

fake_signal_source!(FakeDataConsumer, DataConsumerSignal);

impl DataConsumer for FakeDataConsumer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn data_producer_id(&self) -> String {
        self.data_producer_id.clone()
    }

    fn label(&self) -> String {
        "telemetry".to_string()
    }

    fn protocol(&self) -> String {
        "json".to_string()
    }

    fn closed(&self) -> bool {
        *self.closed.lock()
    }
}

/// An SFU transport whose child lists can be pre-populated
pub struct FakeTransport {
    id: String,
    direction: TransportDirection,
    connection_state: Mutex<ConnectionState>,
    closed: Mutex<bool>,
    producers: Mutex<Vec<Arc<dyn Producer>>>,
    consumers: Mutex<Vec<Arc<dyn Consumer>>>,
    data_producers: Mutex<Vec<Arc<dyn DataProducer>>>,
    data_consumers: Mutex<Vec<Arc<dyn DataConsumer>>>,
    listeners: ListenerSet<TransportSignal>,
}

impl FakeTransport {
    pub fn new(id: &str, direction: TransportDirection) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            direction,
            connection_state: Mutex::new(ConnectionState::New),
            closed: Mutex::new(false),
            producers: Mutex::new(Vec::new()),
            consumers: Mutex::new(Vec::new()),
            data_producers: Mutex::new(Vec::new()),
            data_consumers: Mutex::new(Vec::new()),
            listeners: ListenerSet::new(),
        })
    }

    pub fn send(id: &str) -> Arc<Self> {
        Self::new(id, TransportDirection::Send)
    }

    pub fn recv(id: &str) -> Arc<Self> {
        Self::new(id, TransportDirection::Recv)
    }

    /// Record a producer without announcing it
    pub fn push_producer(&self, producer: Arc<dyn Producer>) {
        self.producers.lock().push(producer);
    }

    pub fn push_consumer(&self, consumer: Arc<dyn Consumer>) {
        self.consumers.lock().push(consumer);
    }

    pub fn push_data_producer(&self, data_producer: Arc<dyn DataProducer>) {
        self.data_producers.lock().push(data_producer);
    }

    pub fn push_data_consumer(&self, data_consumer: Arc<dyn DataConsumer>) {
        self.data_consumers.lock().push(data_consumer);
    }

    pub fn produce(&self, producer: Arc<dyn Producer>) {
        self.push_producer(Arc::clone(&producer));
        self.fire(TransportSignal::NewProducer(producer));
    }

    pub fn consume(&self, consumer: Arc<dyn Consumer>) {
        self.push_consumer(Arc::clone(&consumer));
        self.fire(TransportSignal::NewConsumer(consumer));
    }

    pub fn set_connection_state(&self, state: ConnectionState) {
        *self.connection_state.lock() = state;
        self.fire(TransportSignal::ConnectionStateChange);
    }

    pub fn close(&self) {
        *self.closed.lock() = true;
        *self.connection_state.lock() = ConnectionState::Closed;
        self.fire(TransportSignal::Close);
    }
}

fake_signal_source!(FakeTransport, TransportSignal);

impl MediaTransport for FakeTransport {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn direction(&self) -> TransportDirection {
        self.direction
    }

    fn connection_state(&self) -> ConnectionState {
        *self.connection_state.lock()
    }

    fn ice_gathering_state(&self) -> IceGatheringState {
        IceGatheringState::Complete
    }

    fn closed(&self) -> bool {
        *self.closed.lock()
    }

    fn producers(&self) -> Vec<Arc<dyn Producer>> {
        self.producers.lock().clone()
    }

    fn consumers(&self) -> Vec<Arc<dyn Consumer>> {
        self.consumers.lock().clone()
    }

    fn data_producers(&self) -> Vec<Arc<dyn DataProducer>> {
        self.data_producers.lock().clone()
    }

    fn data_consumers(&self) -> Vec<Arc<dyn DataConsumer>> {
        self.data_consumers.lock().clone()
    }
}

pub struct FakeDevice {
    listeners: ListenerSet<DeviceSignal>,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: ListenerSet::new(),
        })
    }

    pub fn create_transport(&self, transport: Arc<dyn MediaTransport>) {
        self.fire(DeviceSignal::NewTransport(transport));
    }
}

fake_signal_source!(FakeDevice, DeviceSignal);

impl MediaDevice for FakeDevice {}
