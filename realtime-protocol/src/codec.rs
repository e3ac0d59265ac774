//! JSON codec for realtime events
//!
//! Each websocket text frame carries exactly one event, so there is no
//! framing layer here: encoding is a single serialize, decoding reads the
//! `"type"` discriminator first and then parses the registered payload.

use std::borrow::Cow;

use serde::Deserialize;

use crate::client_event::{ClientEvent, ClientEventType};
use crate::server_event::{ServerEvent, ServerEventType};

/// Default upper bound on a single message (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Protocol codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message has no \"type\" field")]
    MissingEventType,

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

#[derive(Deserialize)]
struct EventTag<'a> {
    #[serde(rename = "type", borrow, default)]
    kind: Option<Cow<'a, str>>,
}

/// Read the `"type"` discriminator of an encoded event without parsing
/// the rest of the payload
pub fn peek_event_type(data: &[u8]) -> Result<Cow<'_, str>, CodecError> {
    let tag: EventTag<'_> = serde_json::from_slice(data)?;
    tag.kind.ok_or(CodecError::MissingEventType)
}

/// Codec for ClientEvent (encoding) and ServerEvent (decoding)
/// Used by the client side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientCodec {
    max_message_size: Option<usize>,
}

impl ClientCodec {
    pub fn new() -> Self {
        Self {
            max_message_size: Some(MAX_MESSAGE_SIZE),
        }
    }

    /// `None` disables the size check
    pub fn with_max_message_size(max: Option<usize>) -> Self {
        Self {
            max_message_size: max,
        }
    }

    pub fn max_message_size(&self) -> Option<usize> {
        self.max_message_size
    }

    pub fn encode(&self, event: &ClientEvent) -> Result<Vec<u8>, CodecError> {
        encode_event(event, self.max_message_size)
    }

    pub fn decode(&self, data: &[u8]) -> Result<ServerEvent, CodecError> {
        check_size(data.len(), self.max_message_size)?;
        let kind: ServerEventType = peek_event_type(data)?.parse()?;
        Ok(ServerEvent::decode_as(kind, data)?)
    }
}

impl Default for ClientCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Codec for ServerEvent (encoding) and ClientEvent (decoding)
/// Used by the server side and by test doubles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerCodec {
    max_message_size: Option<usize>,
}

impl ServerCodec {
    pub fn new() -> Self {
        Self {
            max_message_size: Some(MAX_MESSAGE_SIZE),
        }
    }

    pub fn with_max_message_size(max: Option<usize>) -> Self {
        Self {
            max_message_size: max,
        }
    }

    pub fn encode(&self, event: &ServerEvent) -> Result<Vec<u8>, CodecError> {
        encode_event(event, self.max_message_size)
    }

    pub fn decode(&self, data: &[u8]) -> Result<ClientEvent, CodecError> {
        check_size(data.len(), self.max_message_size)?;
        let kind: ClientEventType = peek_event_type(data)?.parse()?;
        Ok(ClientEvent::decode_as(kind, data)?)
    }
}

impl Default for ServerCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn check_size(size: usize, max: Option<usize>) -> Result<(), CodecError> {
    match max {
        Some(max) if size > max => Err(CodecError::MessageTooLarge { size, max }),
        _ => Ok(()),
    }
}

fn encode_event<T: serde::Serialize>(item: &T, max: Option<usize>) -> Result<Vec<u8>, CodecError> {
    let data = serde_json::to_vec(item)?;
    check_size(data.len(), max)?;
    Ok(data)
}
