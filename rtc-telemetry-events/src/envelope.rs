//! The uniform event envelope delivered to sinks

use serde::{Deserialize, Serialize};

use crate::catalog::EventKind;
use crate::provider::Payload;

/// An immutable `{kind, payload}` pair
///
/// Envelopes are only built by [`PayloadProvider::envelope`](crate::PayloadProvider::envelope),
/// which guarantees the payload was shaped by the transform registered for `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    kind: EventKind,
    payload: Payload,
}

impl Envelope {
    pub(crate) fn new(kind: EventKind, payload: Payload) -> Self {
        Self { kind, payload }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The `connectionId` field of the payload, if the transform kept it
    pub fn connection_id(&self) -> Option<&str> {
        self.payload.get("connectionId").and_then(|v| v.as_str())
    }

    /// A string field of the payload
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(|v| v.as_str())
    }

    pub fn into_parts(self) -> (EventKind, Payload) {
        (self.kind, self.payload)
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.connection_id() {
            Some(id) => write!(f, "{}({})", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}
