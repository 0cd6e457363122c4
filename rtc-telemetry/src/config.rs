//! Configuration types for the rtc-telemetry crate
//!
//! These settings control how much a binding discovers on its own. None of them
//! change the event vocabulary or the ordering guarantees.

/// Configuration for the [`TelemetryCollector`](crate::TelemetryCollector)
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Watch children that already exist when a connection is registered
    /// Default: true
    pub scan_existing_children: bool,

    /// Re-check each producer's track after every statistics collection, to
    /// catch track replacements the platform does not signal
    /// Default: true
    pub watch_producer_tracks_on_stats: bool,

    /// Emit the closing sequence right away for objects registered after they
    /// already closed
    /// Default: true
    pub close_if_already_closed: bool,

    /// Prefix for generated binding ids
    /// Default: None
    pub id_prefix: Option<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            scan_existing_children: true,
            watch_producer_tracks_on_stats: true,
            close_if_already_closed: true,
            id_prefix: None,
        }
    }
}

impl CollectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_existing_children(mut self, enabled: bool) -> Self {
        self.scan_existing_children = enabled;
        self
    }

    pub fn with_watch_producer_tracks_on_stats(mut self, enabled: bool) -> Self {
        self.watch_producer_tracks_on_stats = enabled;
        self
    }

    pub fn with_close_if_already_closed(mut self, enabled: bool) -> Self {
        self.close_if_already_closed = enabled;
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    /// Build a configuration from environment variables
    ///
    /// - `RTC_TELEMETRY_SCAN_EXISTING`: true/false
    /// - `RTC_TELEMETRY_WATCH_PRODUCER_TRACKS`: true/false
    /// - `RTC_TELEMETRY_ID_PREFIX`: any string
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = parse_flag(&lookup, "RTC_TELEMETRY_SCAN_EXISTING") {
            config.scan_existing_children = value;
        }
        if let Some(value) = parse_flag(&lookup, "RTC_TELEMETRY_WATCH_PRODUCER_TRACKS") {
            config.watch_producer_tracks_on_stats = value;
        }
        if let Some(prefix) = lookup("RTC_TELEMETRY_ID_PREFIX").filter(|p| !p.is_empty()) {
            config.id_prefix = Some(prefix);
        }

        config
    }

    /// Generate a fresh binding id
    pub fn generate_id(&self) -> String {
        let id = uuid::Uuid::new_v4();
        match &self.id_prefix {
            Some(prefix) => format!("{}-{}", prefix, id),
            None => id.to_string(),
        }
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    let raw = lookup(name)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("Ignoring {}={:?}: expected true or false", name, raw);
            None
        }
    }
}
