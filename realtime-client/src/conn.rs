//! Session connection
//!
//! [`Conn`] turns the websocket's text messages into typed events and back.
//! It holds no session state; [`ConnHandler`] drives the read side on a
//! background task.

mod handler;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use realtime_protocol::{ClientCodec, ClientEvent, ServerEvent};

use crate::context::Context;
use crate::error::{RealtimeError, Result};
use crate::logger::Logger;
use crate::ws::{HandshakeResponse, MessageType, WebSocketConn};

pub use handler::{CallbackHandler, ConnHandler, EventHandler, RunningHandler};

/// An open session with the realtime service
///
/// Share it behind an `Arc` to send from application code while a
/// [`ConnHandler`] reads.
pub struct Conn {
    conn: Box<dyn WebSocketConn>,
    logger: Arc<dyn Logger>,
    codec: ClientCodec,
}

impl Conn {
    pub fn new(conn: Box<dyn WebSocketConn>, logger: Arc<dyn Logger>) -> Self {
        // The transport already bounds inbound size
        Self {
            conn,
            logger,
            codec: ClientCodec::with_max_message_size(None),
        }
    }

    /// Encode `event` and send it as one text message
    pub async fn send_message(&self, ctx: &Context, event: &ClientEvent) -> Result<()> {
        let data = self.codec.encode(event)?;
        debug!(event_type = %event.event_type(), "Sending client event");
        self.send_message_raw(ctx, Bytes::from(data)).await
    }

    /// Send pre-encoded JSON as one text message
    pub async fn send_message_raw(&self, ctx: &Context, data: Bytes) -> Result<()> {
        self.conn.write_message(ctx, MessageType::Text, data).await
    }

    /// Next text message, undecoded
    pub async fn read_message_raw(&self, ctx: &Context) -> Result<Bytes> {
        let (kind, data) = self.conn.read_message(ctx).await?;
        if kind != MessageType::Text {
            return Err(RealtimeError::UnexpectedMessageType(kind));
        }
        Ok(data)
    }

    pub async fn read_message(&self, ctx: &Context) -> Result<ServerEvent> {
        let data = self.read_message_raw(ctx).await?;
        let event = self.codec.decode(&data)?;
        debug!(event_type = %event.event_type(), "Received server event");
        Ok(event)
    }

    pub async fn ping(&self, ctx: &Context) -> Result<()> {
        self.conn.ping(ctx).await
    }

    pub async fn close(&self) -> Result<()> {
        self.conn.close().await
    }

    pub fn response(&self) -> Option<&HandshakeResponse> {
        self.conn.response()
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }
}
