use std::sync::{Arc, Weak};

use telemetry_events::{
    ConnectionOpened, ConnectionStateChanged, DataChannelState, EventInput, IceCandidateError,
    IceCandidateEvent, IceConnectionStateChanged, IceGatheringStateChanged, NegotiationNeeded,
    SignalingStateChanged, TrackReadyState,
};

use super::{Binding, BindingCore, BindingId, BindingKind, BindingState, CloseHook};
use crate::config::CollectorConfig;
use crate::context::{EventContext, Scope};
use crate::listeners::Subscription;
use crate::monitor::MonitorFactory;
use crate::native::{DataChannel, MediaTrack, ObjectKey, PeerConnection, PeerConnectionSignal};
use crate::watcher::{CloseMode, DataChannelWatcher, TrackOwner, TrackWatcher};

/// Binding over a raw WebRTC peer connection
///
/// Closes itself when the connection state reaches `closed`.
pub struct PeerConnectionBinding {
    this: Weak<Self>,
    core: BindingCore,
    connection: Arc<dyn PeerConnection>,
    scan_existing: bool,
    close_if_already_closed: bool,
}

impl PeerConnectionBinding {
    pub(crate) fn new(
        id: BindingId,
        connection: Arc<dyn PeerConnection>,
        events: Arc<EventContext>,
        monitors: &dyn MonitorFactory,
        config: &CollectorConfig,
    ) -> Arc<Self> {
        let scope = Arc::new(Scope {
            connection_id: id.to_string(),
            events,
            monitor: monitors.peer_connection_monitor(id.as_str(), &connection),
            watch_producer_tracks: config.watch_producer_tracks_on_stats,
        });
        let key = ObjectKey::of(&connection);
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: BindingCore::new(id, key, BindingKind::PeerConnection, scope),
            connection,
            scan_existing: config.scan_existing_children,
            close_if_already_closed: config.close_if_already_closed,
        })
    }

    fn connection_id(&self) -> String {
        self.core.id().to_string()
    }

    fn opened(&self) -> ConnectionOpened {
        ConnectionOpened {
            connection_id: self.connection_id(),
            connection_state: Some(self.connection.connection_state()),
            ice_connection_state: Some(self.connection.ice_connection_state()),
            ice_gathering_state: Some(self.connection.ice_gathering_state()),
            signaling_state: Some(self.connection.signaling_state()),
            direction: None,
        }
    }

    fn watch_track(&self, track: Arc<dyn MediaTrack>) {
        if track.ready_state() == TrackReadyState::Ended {
            tracing::trace!(id = %self.core.id(), track_id = %track.id(), "Skipping ended track");
            return;
        }
        let watcher = TrackWatcher::new(
            Arc::clone(self.core.scope()),
            track,
            TrackOwner::Connection,
            Some(self.core.parent_link()),
        );
        self.core.adopt(watcher);
    }

    fn watch_data_channel(&self, channel: Arc<dyn DataChannel>) {
        if channel.ready_state() == DataChannelState::Closed {
            return;
        }
        let watcher = DataChannelWatcher::new(
            Arc::clone(self.core.scope()),
            channel,
            self.core.parent_link(),
        );
        self.core.adopt(watcher);
    }

    fn handle(&self, signal: &PeerConnectionSignal) {
        let connection_id = self.connection_id();
        match signal {
            PeerConnectionSignal::ConnectionStateChange => {
                let connection_state = self.connection.connection_state();
                self.core
                    .emit(EventInput::ConnectionStateChanged(ConnectionStateChanged {
                        connection_id,
                        connection_state,
                    }));
                if connection_state.is_terminal() {
                    self.core.shutdown(CloseMode::Emit);
                }
            }
            PeerConnectionSignal::IceConnectionStateChange => {
                self.core
                    .emit(EventInput::IceConnectionStateChanged(IceConnectionStateChanged {
                        connection_id,
                        ice_connection_state: self.connection.ice_connection_state(),
                    }))
            }
            PeerConnectionSignal::IceGatheringStateChange => {
                self.core
                    .emit(EventInput::IceGatheringStateChanged(IceGatheringStateChanged {
                        connection_id,
                        ice_gathering_state: self.connection.ice_gathering_state(),
                    }))
            }
            PeerConnectionSignal::IceCandidate(candidate) => {
                self.core.emit(EventInput::IceCandidate(IceCandidateEvent {
                    connection_id,
                    candidate: candidate.clone(),
                }))
            }
            PeerConnectionSignal::IceCandidateError(error) => {
                self.core.emit(EventInput::IceCandidateError(IceCandidateError {
                    connection_id,
                    address: error.address.clone(),
                    port: error.port,
                    url: error.url.clone(),
                    error_code: error.error_code,
                    error_text: error.error_text.clone(),
                }))
            }
            PeerConnectionSignal::NegotiationNeeded => {
                self.core
                    .emit(EventInput::NegotiationNeeded(NegotiationNeeded { connection_id }))
            }
            PeerConnectionSignal::SignalingStateChange => {
                self.core
                    .emit(EventInput::SignalingStateChanged(SignalingStateChanged {
                        connection_id,
                        signaling_state: self.connection.signaling_state(),
                    }))
            }
            PeerConnectionSignal::Track(track) => self.watch_track(Arc::clone(track)),
            PeerConnectionSignal::DataChannel(channel) => {
                self.watch_data_channel(Arc::clone(channel))
            }
        }
    }
}

impl Binding for PeerConnectionBinding {
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
            &self.connection,
            move |signal: &PeerConnectionSignal| {
                if let Some(binding) = this.upgrade() {
                    binding.handle(signal);
                }
            },
        ));

        if self.scan_existing {
            for track in self.connection.remote_tracks() {
                self.watch_track(track);
            }
        }

        if self.close_if_already_closed && self.connection.connection_state().is_terminal() {
            tracing::debug!(id = %self.core.id(), "Peer connection registered after close");
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
