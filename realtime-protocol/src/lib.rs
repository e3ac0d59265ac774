//! realtime-protocol: event model for the realtime conversation API
//!
//! Every message on the socket is one JSON object whose `"type"` field names
//! the event. This crate defines the outbound ([`ClientEvent`]) and inbound
//! ([`ServerEvent`]) unions, the payload schemas they carry, and the codecs
//! that move them on and off the wire.

pub mod client_event;
pub mod codec;
pub mod id;
mod registry;
pub mod server_event;
pub mod types;

// Re-export main types at crate root
pub use client_event::*;
pub use codec::{peek_event_type, ClientCodec, CodecError, ServerCodec, MAX_MESSAGE_SIZE};
pub use id::generate_id;
pub use server_event::*;
pub use types::*;
