//! Error types for the rtc-telemetry crate.
//!
//! Most failure modes in this crate are not errors at all: registering an
//! object twice or removing one that was never registered is logged and
//! reported through [`Registration`](crate::Registration) and
//! [`Removal`](crate::Removal) instead.

use crate::binding::BindingId;
use crate::logging::LoggingError;

/// Errors that can occur in the telemetry collector
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A caller-supplied id is already used by a binding over a different object
    #[error("Binding id {id} is already in use by another object")]
    IdConflict {
        /// The conflicting id
        id: BindingId,
    },

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

/// Convenience type alias for Results using TelemetryError.
pub type Result<T> = std::result::Result<T, TelemetryError>;
