//! # rtc-telemetry-events
//!
//! The event vocabulary shared by every part of rtc-telemetry: a closed set of
//! event kinds, the typed payload each kind carries, the [`PayloadProvider`] that
//! shapes typed payloads into the generic envelope, and the [`EventSink`] contract
//! envelopes are delivered to.
//!
//! ## Architecture
//!
//! ```text
//! binding logic ──EventInput──▶ PayloadProvider ──Envelope──▶ EventSink
//!   (when)                       (what it looks like)          (where it goes)
//! ```
//!
//! The kind enum, the typed input union and the provider's transform table are
//! generated from a single declarative table in `catalog.rs`, so adding a kind
//! without a payload type or transform slot does not compile.
//!
//! ## Usage
//!
//! ```rust
//! use telemetry_events::{ConnectionClosed, EventInput, EventKind, PayloadProvider};
//!
//! let provider = PayloadProvider::new().with_connection_closed(|input| {
//!     let mut payload = telemetry_events::to_payload(input);
//!     payload.insert("redacted".into(), true.into());
//!     payload
//! });
//!
//! let envelope = provider.envelope(EventInput::ConnectionClosed(ConnectionClosed {
//!     connection_id: "pc-1".into(),
//! }));
//! assert_eq!(envelope.kind(), EventKind::ConnectionClosed);
//! assert_eq!(envelope.payload()["redacted"], true);
//! ```

#[macro_use]
mod macros;

mod catalog;
mod envelope;
mod error;
mod payloads;
mod provider;
mod sink;
mod state;

pub use catalog::{EventInput, EventKind, PayloadProvider};
pub use envelope::Envelope;
pub use error::{EventsError, Result};
pub use payloads::*;
pub use provider::{identity, to_payload, try_to_payload, Payload, Transform};
pub use sink::{BroadcastSink, ChannelSink, EventIterator, EventSink, MemorySink};
pub use state::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Envelope, EventInput, EventKind, EventSink, EventsError, MemorySink, Payload,
        PayloadProvider,
    };
}
