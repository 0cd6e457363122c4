//! # rtc-telemetry
//!
//! Lifecycle binding and event normalization for WebRTC peer connections and
//! SFU transports.
//!
//! ## Overview
//!
//! The collector observes live platform objects it does not own and turns their
//! callbacks into one ordered stream of typed [`Envelope`]s delivered to an
//! [`EventSink`]. Peer connections and SFU transports speak different native
//! vocabularies; downstream consumers see the same connection-level events for
//! both.
//!
//! ## Key Features
//!
//! - **Idempotent registration**: one binding per object identity; registering
//!   twice or removing something unknown is logged, not an error
//! - **Leak-free listeners**: every native subscription is owned by a handle that
//!   detaches exactly once
//! - **Cascading close**: a native close emits each open child's terminal event
//!   before the connection's own `connection-closed`
//! - **Shapeable payloads**: a swappable [`PayloadProvider`] can redact or enrich
//!   any event kind
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rtc_telemetry::{CollectorConfig, TelemetryCollector};
//! use telemetry_events::MemorySink;
//!
//! let sink = Arc::new(MemorySink::new());
//! let collector = TelemetryCollector::with_config(sink.clone(), CollectorConfig::from_env());
//!
//! // `connection` and `transport` implement the traits in `rtc_telemetry::native`
//! collector.add_peer_connection(connection, None)?;
//! collector.add_transport(transport, Some("send-transport".into()))?;
//!
//! for envelope in sink.events() {
//!     println!("{}", envelope);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! TelemetryCollector
//!   ├── DeviceBinding ──new transport──┐
//!   └── BindingRegistry ◀──────────────┘
//!         └── Binding (peer connection | transport), owns its ConnectionMonitor
//!               └── child watchers (track, data channel, producer, consumer, ...)
//!                     └── track watcher of a producer/consumer
//! ```
//!
//! Signals are handled synchronously on the thread that delivers them. No lock
//! is held while calling the sink or the native objects.

pub mod binding;
pub mod collector;
pub mod config;
pub mod error;
pub mod listeners;
pub mod logging;
pub mod monitor;
pub mod native;
pub mod registry;

mod context;
mod device;
mod watcher;

#[cfg(test)]
mod mock;

// Re-export main types for convenience
pub use binding::{
    Binding, BindingId, BindingKind, BindingState, CloseHook, PeerConnectionBinding,
    TransportBinding,
};
pub use collector::TelemetryCollector;
pub use config::CollectorConfig;
pub use error::{Result, TelemetryError};
pub use listeners::{ListenerSet, Subscription};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use monitor::{ConnectionMonitor, MonitorFactory, StatsTick, TickMonitor, TickMonitorFactory};
pub use native::ObjectKey;
pub use registry::{Registration, RegistryStats, Removal};

// Re-export the event vocabulary
pub use telemetry_events::{Envelope, EventInput, EventKind, EventSink, PayloadProvider};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::native::*;
    pub use crate::{
        Binding, BindingId, CollectorConfig, Registration, Removal, TelemetryCollector,
        TelemetryError,
    };
    pub use telemetry_events::prelude::*;
}
