//! Native state vocabulary
//!
//! These mirror the string enumerations exposed by WebRTC peer connections and
//! SFU transports. They serialize to the same kebab-case strings the platform uses.

use serde::{Deserialize, Serialize};

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $value:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )*
        }

        impl $name {
            /// The platform string for this value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Aggregate connection state of a peer connection or transport
    pub enum ConnectionState {
        New => "new",
        Connecting => "connecting",
        Connected => "connected",
        Disconnected => "disconnected",
        Failed => "failed",
        Closed => "closed",
    }
}

string_enum! {
    /// ICE agent connection state
    pub enum IceConnectionState {
        New => "new",
        Checking => "checking",
        Connected => "connected",
        Completed => "completed",
        Disconnected => "disconnected",
        Failed => "failed",
        Closed => "closed",
    }
}

string_enum! {
    /// ICE candidate gathering state
    pub enum IceGatheringState {
        New => "new",
        Gathering => "gathering",
        Complete => "complete",
    }
}

string_enum! {
    /// Offer/answer negotiation state
    pub enum SignalingState {
        Stable => "stable",
        HaveLocalOffer => "have-local-offer",
        HaveRemoteOffer => "have-remote-offer",
        HaveLocalPranswer => "have-local-pranswer",
        HaveRemotePranswer => "have-remote-pranswer",
        Closed => "closed",
    }
}

string_enum! {
    /// Media kind of a track
    pub enum TrackKind {
        Audio => "audio",
        Video => "video",
    }
}

string_enum! {
    /// Ready state of a media track
    pub enum TrackReadyState {
        Live => "live",
        Ended => "ended",
    }
}

string_enum! {
    /// Ready state of a data channel
    pub enum DataChannelState {
        Connecting => "connecting",
        Open => "open",
        Closing => "closing",
        Closed => "closed",
    }
}

string_enum! {
    /// Direction of an SFU transport
    pub enum TransportDirection {
        Send => "send",
        Recv => "recv",
    }
}

impl ConnectionState {
    /// Whether no further transitions can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}
