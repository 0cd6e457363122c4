//! Declarative macros for the event catalog
//!
//! One table row per event kind generates the kind enum variant, the typed input
//! variant, the provider's transform slot and its builder method. Every dispatch
//! is an exhaustive `match`, so the compiler rejects a kind that is missing from
//! any of the generated pieces.

/// Generate `EventKind`, `EventInput` and `PayloadProvider` from a kind table
///
/// # Example
/// ```rust,ignore
/// define_events! {
///     ConnectionOpened => "connection-opened": ConnectionOpened,
///     ConnectionClosed => "connection-closed": ConnectionClosed,
/// }
/// ```
macro_rules! define_events {
    (
        $( $(#[$meta:meta])* $variant:ident => $name:literal : $input:ty ),* $(,)?
    ) => {
        paste::paste! {
            /// The closed set of event kinds emitted to a sink
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
                ::serde::Serialize, ::serde::Deserialize,
            )]
            pub enum EventKind {
                $(
                    $(#[$meta])*
                    #[serde(rename = $name)]
                    $variant,
                )*
            }

            impl EventKind {
                /// Every kind, in declaration order
                pub const ALL: &'static [EventKind] = &[$(EventKind::$variant),*];

                /// The wire name of this kind
                pub fn as_str(&self) -> &'static str {
                    match self {
                        $(EventKind::$variant => $name,)*
                    }
                }
            }

            impl ::std::str::FromStr for EventKind {
                type Err = $crate::error::EventsError;

                fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                    match s {
                        $($name => Ok(EventKind::$variant),)*
                        other => Err($crate::error::EventsError::UnknownEventKind(other.to_string())),
                    }
                }
            }

            /// A typed event payload, tagged by kind
            #[derive(Debug, Clone, PartialEq)]
            pub enum EventInput {
                $($variant($input),)*
            }

            impl EventInput {
                /// The kind this input is delivered as
                pub fn kind(&self) -> EventKind {
                    match self {
                        $(EventInput::$variant(_) => EventKind::$variant,)*
                    }
                }

                /// Identifier of the connection or transport that produced the event
                pub fn connection_id(&self) -> &str {
                    match self {
                        $(EventInput::$variant(value) => $crate::payloads::ConnectionScoped::connection_id(value),)*
                    }
                }
            }

            /// Per-kind payload transforms
            ///
            /// Each slot defaults to [`identity`](crate::identity), which serializes the
            /// typed input unmodified. Slots are replaced with the `with_<kind>` builders.
            #[derive(Clone)]
            pub struct PayloadProvider {
                $([<$variant:snake>]: $crate::provider::Transform<$input>,)*
            }

            impl PayloadProvider {
                /// Create a provider with every slot set to identity
                pub fn new() -> Self {
                    Self {
                        $([<$variant:snake>]: $crate::provider::identity::<$input>(),)*
                    }
                }

                $(
                    #[doc = concat!("Replace the transform applied to `", $name, "` payloads")]
                    pub fn [<with_ $variant:snake>]<F>(mut self, transform: F) -> Self
                    where
                        F: Fn(&$input) -> $crate::provider::Payload + Send + Sync + 'static,
                    {
                        self.[<$variant:snake>] = ::std::sync::Arc::new(transform);
                        self
                    }
                )*

                /// Restore the identity transform for one kind
                pub fn reset(&mut self, kind: EventKind) {
                    match kind {
                        $(EventKind::$variant => {
                            self.[<$variant:snake>] = $crate::provider::identity::<$input>();
                        })*
                    }
                }

                /// Apply the transform registered for the input's kind
                pub fn shape(&self, input: &EventInput) -> $crate::provider::Payload {
                    match input {
                        $(EventInput::$variant(value) => (self.[<$variant:snake>])(value),)*
                    }
                }
            }
        }
    };
}
