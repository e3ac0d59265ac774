//! Duplex message transport
//!
//! [`WebSocketDialer`] opens a [`WebSocketConn`]; everything above this
//! module only sees whole messages tagged text or binary. Control frames
//! never surface here.

pub mod async_ws;
pub mod blocking;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use tungstenite::http::{HeaderMap, HeaderName, HeaderValue, Response};
use tungstenite::Message;

use crate::context::Context;
use crate::error::{RealtimeError, Result};

/// Kind of a data message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Text,
    Binary,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Binary => f.write_str("binary"),
        }
    }
}

/// HTTP response of the upgrade handshake
#[derive(Debug, Clone)]
pub struct HandshakeResponse {
    pub status: u16,
    pub headers: HeaderMap,
}

impl<T> From<&Response<T>> for HandshakeResponse {
    fn from(response: &Response<T>) -> Self {
        Self {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
        }
    }
}

/// An open websocket
///
/// All methods take `&self`: a reader and a writer may use the same
/// connection concurrently.
#[async_trait]
pub trait WebSocketConn: Send + Sync {
    /// Wait for the next complete data message
    async fn read_message(&self, ctx: &Context) -> Result<(MessageType, Bytes)>;

    async fn write_message(&self, ctx: &Context, kind: MessageType, data: Bytes) -> Result<()>;

    /// Queue a ping frame; the pong is not awaited
    async fn ping(&self, ctx: &Context) -> Result<()>;

    /// Send a normal closure frame; later calls are no-ops
    async fn close(&self) -> Result<()>;

    fn response(&self) -> Option<&HandshakeResponse>;
}

#[async_trait]
pub trait WebSocketDialer: Send + Sync {
    /// Open a connection; `ctx` bounds the handshake only
    async fn dial(&self, ctx: &Context, url: &str, headers: &HeaderMap)
        -> Result<Box<dyn WebSocketConn>>;
}

/// Build the upgrade request for `url` with `headers` added
pub(crate) fn build_request(
    url: &str,
    headers: &HeaderMap,
) -> Result<tungstenite::handshake::client::Request> {
    use tungstenite::client::IntoClientRequest;

    let mut request = url
        .into_client_request()
        .map_err(|e| RealtimeError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    for (name, value) in headers {
        request.headers_mut().insert(name.clone(), value.clone());
    }
    Ok(request)
}

/// Parse a header pair supplied as strings
pub fn header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| RealtimeError::InvalidHeader {
            name: name.to_string(),
            message: e.to_string(),
        })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| RealtimeError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    Ok((header_name, header_value))
}

/// Convert an outbound payload to a websocket message
pub(crate) fn to_message(kind: MessageType, data: Bytes) -> Result<Message> {
    match kind {
        MessageType::Text => {
            let text = String::from_utf8(data.to_vec())?;
            Ok(Message::Text(text.into()))
        }
        MessageType::Binary => Ok(Message::Binary(data)),
    }
}

/// Data carried by an inbound message, or `None` for control frames
pub(crate) fn from_message(message: Message) -> Result<Option<(MessageType, Bytes)>> {
    match message {
        Message::Text(text) => Ok(Some((
            MessageType::Text,
            Bytes::copy_from_slice(text.as_bytes()),
        ))),
        Message::Binary(data) => Ok(Some((MessageType::Binary, data))),
        Message::Ping(_) | Message::Pong(_) => Ok(None),
        Message::Close(frame) => {
            let (code, reason) = frame
                .map(|cf| (u16::from(cf.code), cf.reason.to_string()))
                .unwrap_or((1005, String::new()));
            Err(RealtimeError::ConnectionClosed { code, reason }.permanent())
        }
        Message::Frame(_) => Err(RealtimeError::UnsupportedMessageType),
    }
}
