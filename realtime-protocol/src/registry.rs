//! Discriminator registry shared by the client and server event unions
//!
//! One line per variant declares its payload type and wire tag. The macro
//! expands that table into the tagged enum, a matching `*EventType` enum
//! with string conversions, and the typed decode dispatch, so the tag list,
//! the enum and the parser cannot drift apart.

macro_rules! event_registry {
    (
        $(#[$enum_meta:meta])*
        pub enum $event:ident / $kind:ident {
            $(
                $(#[$meta:meta])*
                $variant:ident($payload:ty) = $tag:literal,
            )+
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize)]
        #[serde(tag = "type")]
        pub enum $event {
            $(
                $(#[$meta])*
                #[serde(rename = $tag)]
                $variant($payload),
            )+
        }

        #[doc = concat!("Wire discriminator of [`", stringify!($event), "`]")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $kind {
            $( $variant, )+
        }

        impl $kind {
            /// Every registered discriminator, in declaration order
            pub const ALL: &'static [$kind] = &[$( $kind::$variant, )+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $tag, )+
                }
            }
        }

        impl std::fmt::Display for $kind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $kind {
            type Err = $crate::codec::CodecError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $tag => Ok(Self::$variant), )+
                    other => Err($crate::codec::CodecError::UnknownEventType(other.to_string())),
                }
            }
        }

        impl $event {
            /// Discriminator of this event
            pub fn event_type(&self) -> $kind {
                match self {
                    $( Self::$variant(_) => $kind::$variant, )+
                }
            }

            /// Correlation id, if the sender set one
            pub fn event_id(&self) -> Option<&str> {
                match self {
                    $( Self::$variant(e) => e.event_id.as_deref(), )+
                }
            }

            pub fn set_event_id(&mut self, id: impl Into<String>) {
                let id = Some(id.into());
                match self {
                    $( Self::$variant(e) => e.event_id = id, )+
                }
            }

            pub fn with_event_id(mut self, id: impl Into<String>) -> Self {
                self.set_event_id(id);
                self
            }

            /// Parse `data` as the payload registered for `kind`
            pub(crate) fn decode_as(kind: $kind, data: &[u8]) -> Result<Self, serde_json::Error> {
                match kind {
                    $( $kind::$variant => serde_json::from_slice::<$payload>(data).map(Self::$variant), )+
                }
            }
        }

        $(
            impl From<$payload> for $event {
                fn from(event: $payload) -> Self {
                    Self::$variant(event)
                }
            }
        )+
    };
}

pub(crate) use event_registry;
