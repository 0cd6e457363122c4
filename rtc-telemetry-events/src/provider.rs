//! Payload shaping
//!
//! The [`PayloadProvider`](crate::PayloadProvider) type itself is generated in
//! `catalog.rs`; this module holds the transform plumbing it is built from.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::catalog::{EventInput, PayloadProvider};
use crate::envelope::Envelope;
use crate::error::{EventsError, Result};

/// The generic payload carried by an envelope
pub type Payload = serde_json::Map<String, Value>;

/// A shaping function from a typed input to a generic payload
pub type Transform<T> = Arc<dyn Fn(&T) -> Payload + Send + Sync>;

/// Serialize an input into a payload object
pub fn try_to_payload<T: Serialize + ?Sized>(input: &T) -> Result<Payload> {
    match serde_json::to_value(input)? {
        Value::Object(map) => Ok(map),
        other => Err(EventsError::NotAnObject(other.to_string())),
    }
}

/// Serialize an input into a payload object, falling back to an empty payload
///
/// Shaping never fails an emission: an input that cannot be rendered as an
/// object is logged and delivered with an empty payload.
pub fn to_payload<T: Serialize + ?Sized>(input: &T) -> Payload {
    try_to_payload(input).unwrap_or_else(|e| {
        tracing::warn!("Dropping payload that could not be shaped: {}", e);
        Payload::new()
    })
}

/// The default transform: the input, unmodified
pub fn identity<T: Serialize + 'static>() -> Transform<T> {
    Arc::new(|input: &T| to_payload(input))
}

impl PayloadProvider {
    /// Shape an input and wrap it in an envelope
    pub fn envelope(&self, input: EventInput) -> Envelope {
        let kind = input.kind();
        let payload = self.shape(&input);
        tracing::trace!(%kind, "Shaped event payload");
        Envelope::new(kind, payload)
    }
}
