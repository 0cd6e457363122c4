//! Error types for the rtc-telemetry-events crate.

/// Errors raised while naming or shaping events.
#[derive(Debug, thiserror::Error)]
pub enum EventsError {
    /// A string did not name any event kind
    #[error("Unknown event kind: {0}")]
    UnknownEventKind(String),

    /// A payload could not be serialized
    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A payload serialized to something other than a JSON object
    #[error("Payload is not an object: {0}")]
    NotAnObject(String),
}

/// Convenience type alias for Results using EventsError.
pub type Result<T> = std::result::Result<T, EventsError>;
