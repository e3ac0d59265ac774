//! Async transport on `tokio-tungstenite`
//!
//! The stream is split into independent read and write halves, each behind
//! its own lock, so the read loop never blocks senders. Reads select on the
//! context and are cancel-safe: a cancelled read leaves the connection
//! usable. A write that is cancelled mid-frame does not.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;
use tungstenite::http::HeaderMap;
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tungstenite::Message;

use realtime_protocol::MAX_MESSAGE_SIZE;

use super::{build_request, from_message, to_message, HandshakeResponse, MessageType};
use super::{WebSocketConn, WebSocketDialer};
use crate::context::Context;
use crate::error::{RealtimeError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct TungsteniteOptions {
    /// Largest inbound message accepted; `None` disables the limit
    pub read_limit: Option<usize>,
    /// Set `TCP_NODELAY` on the socket
    pub disable_nagle: bool,
}

impl Default for TungsteniteOptions {
    fn default() -> Self {
        Self {
            read_limit: Some(MAX_MESSAGE_SIZE),
            disable_nagle: true,
        }
    }
}

impl TungsteniteOptions {
    pub(crate) fn websocket_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        config.max_message_size = self.read_limit;
        config.max_frame_size = self.read_limit;
        config
    }
}

/// Default dialer
#[derive(Debug, Clone, Default)]
pub struct TungsteniteDialer {
    options: TungsteniteOptions,
}

impl TungsteniteDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TungsteniteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TungsteniteOptions {
        &self.options
    }
}

#[async_trait]
impl WebSocketDialer for TungsteniteDialer {
    async fn dial(
        &self,
        ctx: &Context,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<Box<dyn WebSocketConn>> {
        let request = build_request(url, headers)?;
        let config = self.options.websocket_config();

        let (stream, response) = ctx
            .run(tokio_tungstenite::connect_async_with_config(
                request,
                Some(config),
                self.options.disable_nagle,
            ))
            .await?
            .map_err(|source| RealtimeError::Dial {
                url: url.to_string(),
                source,
            })?;

        debug!(status = response.status().as_u16(), "WebSocket handshake complete");
        Ok(Box::new(TungsteniteConn::new(stream, HandshakeResponse::from(&response))))
    }
}

pub struct TungsteniteConn {
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    response: HandshakeResponse,
    closed: AtomicBool,
}

impl TungsteniteConn {
    fn new(stream: WsStream, response: HandshakeResponse) -> Self {
        let (sink, stream) = stream.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            response,
            closed: AtomicBool::new(false),
        }
    }

    async fn send(&self, ctx: &Context, message: Message) -> Result<()> {
        let mut sink = ctx.run(self.sink.lock()).await?;
        match ctx.run(sink.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(RealtimeError::classify_websocket_error(e).permanent()),
            // Partially written frame
            Err(e) => Err(e.permanent()),
        }
    }
}

#[async_trait]
impl WebSocketConn for TungsteniteConn {
    async fn read_message(&self, ctx: &Context) -> Result<(MessageType, Bytes)> {
        let mut stream = ctx.run(self.stream.lock()).await?;
        loop {
            let next = tokio::select! {
                biased;
                err = ctx.done() => return Err(err),
                next = stream.next() => next,
            };
            match next {
                Some(Ok(message)) => {
                    if let Some(data) = from_message(message)? {
                        return Ok(data);
                    }
                }
                Some(Err(e)) => return Err(RealtimeError::classify_websocket_error(e)),
                None => {
                    return Err(RealtimeError::ConnectionClosed {
                        code: 1006,
                        reason: "stream ended".into(),
                    }
                    .permanent())
                }
            }
        }
    }

    async fn write_message(&self, ctx: &Context, kind: MessageType, data: Bytes) -> Result<()> {
        let message = to_message(kind, data)?;
        self.send(ctx, message).await
    }

    async fn ping(&self, ctx: &Context) -> Result<()> {
        self.send(ctx, Message::Ping(Bytes::new())).await
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: String::new().into(),
        };
        let mut sink = self.sink.lock().await;
        match sink.send(Message::Close(Some(frame))).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(RealtimeError::classify_websocket_error(e).permanent()),
        }
    }

    fn response(&self) -> Option<&HandshakeResponse> {
        Some(&self.response)
    }
}
