//! Typed event payloads
//!
//! Every payload carries the identifier of the connection (or transport) that
//! produced it. State-change payloads name the new value after the state being
//! reported, e.g. `iceGatheringState`.

use serde::{Deserialize, Serialize};

use crate::state::{
    ConnectionState, DataChannelState, IceConnectionState, IceGatheringState, SignalingState,
    TrackKind, TrackReadyState, TransportDirection,
};

/// Free-form platform dictionaries (constraints, capabilities, settings)
pub type TrackProperties = serde_json::Map<String, serde_json::Value>;

/// Access to the owning connection identifier of a payload
pub trait ConnectionScoped {
    fn connection_id(&self) -> &str;
}

macro_rules! connection_scoped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ConnectionScoped for $ty {
                fn connection_id(&self) -> &str {
                    &self.connection_id
                }
            }
        )*
    };
}

/// A connection or transport started being observed
///
/// Fields a source does not have are `null`. An SFU transport reports no
/// `iceConnectionState` or `signalingState`; a peer connection reports no
/// `direction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOpened {
    pub connection_id: String,
    pub connection_state: Option<ConnectionState>,
    pub ice_connection_state: Option<IceConnectionState>,
    pub ice_gathering_state: Option<IceGatheringState>,
    pub signaling_state: Option<SignalingState>,
    pub direction: Option<TransportDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionClosed {
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStateChanged {
    pub connection_id: String,
    pub connection_state: ConnectionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceConnectionStateChanged {
    pub connection_id: String,
    pub ice_connection_state: IceConnectionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceGatheringStateChanged {
    pub connection_id: String,
    pub ice_gathering_state: IceGatheringState,
}

/// A locally gathered ICE candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateInfo {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
    pub username_fragment: Option<String>,
}

/// Candidate discovery; `candidate` is `None` for the end-of-candidates marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateEvent {
    pub connection_id: String,
    pub candidate: Option<IceCandidateInfo>,
}

/// A failed candidate gathering attempt
///
/// Platforms populate these fields inconsistently, so all of them are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateError {
    pub connection_id: String,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub url: Option<String>,
    pub error_code: Option<u16>,
    pub error_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationNeeded {
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalingStateChanged {
    pub connection_id: String,
    pub signaling_state: SignalingState,
}

/// Data channel snapshot, shared by added/open/closed events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataChannelEvent {
    pub connection_id: String,
    pub label: String,
    pub channel_id: Option<u16>,
    pub ready_state: DataChannelState,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataChannelError {
    #[serde(flatten)]
    pub channel: DataChannelEvent,
    pub error: String,
}

/// The fields every track event carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDescriptor {
    pub track_id: String,
    pub kind: TrackKind,
    pub label: String,
    pub muted: bool,
    pub enabled: bool,
    pub ready_state: TrackReadyState,
    pub content_hint: String,
}

/// Track removed/muted/unmuted
///
/// `producer_id` or `consumer_id` is set when the track belongs to an SFU
/// producer or consumer rather than directly to a peer connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEvent {
    pub connection_id: String,
    pub producer_id: Option<String>,
    pub consumer_id: Option<String>,
    #[serde(flatten)]
    pub track: TrackDescriptor,
}

/// First observation of a track, with its full platform dictionaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAdded {
    pub connection_id: String,
    pub producer_id: Option<String>,
    pub consumer_id: Option<String>,
    #[serde(flatten)]
    pub track: TrackDescriptor,
    pub constraints: TrackProperties,
    pub capabilities: TrackProperties,
    pub settings: TrackProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerEvent {
    pub connection_id: String,
    pub producer_id: String,
    pub track_id: Option<String>,
    pub kind: TrackKind,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerEvent {
    pub connection_id: String,
    pub consumer_id: String,
    pub producer_id: String,
    pub track_id: Option<String>,
    pub kind: TrackKind,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProducerEvent {
    pub connection_id: String,
    pub data_producer_id: String,
    pub label: String,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataConsumerEvent {
    pub connection_id: String,
    pub data_consumer_id: String,
    pub data_producer_id: String,
    pub label: String,
    pub protocol: String,
}

connection_scoped!(
    ConnectionOpened,
    ConnectionClosed,
    ConnectionStateChanged,
    IceConnectionStateChanged,
    IceGatheringStateChanged,
    IceCandidateEvent,
    IceCandidateError,
    NegotiationNeeded,
    SignalingStateChanged,
    DataChannelEvent,
    TrackEvent,
    TrackAdded,
    ProducerEvent,
    ConsumerEvent,
    DataProducerEvent,
    DataConsumerEvent,
);

impl ConnectionScoped for DataChannelError {
    fn connection_id(&self) -> &str {
        &self.channel.connection_id
    }
}

impl TrackAdded {
    /// The event payload without the platform dictionaries
    pub fn to_track_event(&self) -> TrackEvent {
        TrackEvent {
            connection_id: self.connection_id.clone(),
            producer_id: self.producer_id.clone(),
            consumer_id: self.consumer_id.clone(),
            track: self.track.clone(),
        }
    }
}
