//! Blocking transport on synchronous `tungstenite`
//!
//! The socket lives behind a lock and every operation runs on the blocking
//! thread pool. Reads poll with a short socket timeout and release the lock
//! between polls, so cancellation is noticed at the next poll boundary and a
//! concurrent writer waits at most one poll interval. Deadlines are exact:
//! the last poll is shortened to end on the deadline.

use std::io;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tungstenite::http::HeaderMap;
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::protocol::CloseFrame;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use realtime_protocol::MAX_MESSAGE_SIZE;

use super::async_ws::TungsteniteOptions;
use super::{build_request, from_message, to_message, HandshakeResponse, MessageType};
use super::{WebSocketConn, WebSocketDialer};
use crate::context::Context;
use crate::error::{is_retryable_io, RealtimeError, Result};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Default interval between cancellation checks while reading
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct BlockingOptions {
    /// Largest inbound message accepted; `None` disables the limit
    pub read_limit: Option<usize>,
    pub poll_interval: Duration,
    /// Redirects followed during the handshake
    pub max_redirects: u8,
}

impl Default for BlockingOptions {
    fn default() -> Self {
        Self {
            read_limit: Some(MAX_MESSAGE_SIZE),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_redirects: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockingDialer {
    options: BlockingOptions,
}

impl BlockingDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BlockingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BlockingOptions {
        &self.options
    }
}

#[async_trait]
impl WebSocketDialer for BlockingDialer {
    async fn dial(
        &self,
        ctx: &Context,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<Box<dyn WebSocketConn>> {
        if self.options.poll_interval.is_zero() {
            return Err(RealtimeError::config("poll interval must be non-zero"));
        }

        let request = build_request(url, headers)?;
        let config = TungsteniteOptions {
            read_limit: self.options.read_limit,
            disable_nagle: false,
        }
        .websocket_config();
        let max_redirects = self.options.max_redirects;

        let handle = tokio::task::spawn_blocking(move || {
            tungstenite::client::connect_with_config(request, Some(config), max_redirects)
        });
        let (socket, response) = ctx
            .run(handle)
            .await?
            .map_err(|e| RealtimeError::internal(e.to_string()))?
            .map_err(|source| RealtimeError::Dial {
                url: url.to_string(),
                source,
            })?;

        debug!(status = response.status().as_u16(), "WebSocket handshake complete");
        Ok(Box::new(BlockingConn {
            socket: Arc::new(Mutex::new(socket)),
            poll_interval: self.options.poll_interval,
            response: HandshakeResponse::from(&response),
            closed: AtomicBool::new(false),
        }))
    }
}

pub struct BlockingConn {
    socket: Arc<Mutex<Socket>>,
    poll_interval: Duration,
    response: HandshakeResponse,
    closed: AtomicBool,
}

impl BlockingConn {
    /// Run a write on the blocking pool; every failure is permanent
    async fn send(&self, ctx: &Context, message: Message) -> Result<()> {
        let socket = Arc::clone(&self.socket);
        let handle = tokio::task::spawn_blocking(move || socket.lock().send(message));
        match ctx.run(handle).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(RealtimeError::classify_websocket_error(e).permanent()),
            Ok(Err(e)) => Err(RealtimeError::internal(e.to_string()).permanent()),
            // The write keeps running on the pool; the frame state is unknown
            Err(e) => Err(e.permanent()),
        }
    }
}

#[async_trait]
impl WebSocketConn for BlockingConn {
    async fn read_message(&self, ctx: &Context) -> Result<(MessageType, Bytes)> {
        let socket = Arc::clone(&self.socket);
        let token = ctx.token().clone();
        let deadline = ctx.deadline().map(|d| d.into_std());
        let poll_interval = self.poll_interval;

        tokio::task::spawn_blocking(move || read_blocking(&socket, &token, deadline, poll_interval))
            .await
            .map_err(|e| RealtimeError::internal(e.to_string()))?
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
        let socket = Arc::clone(&self.socket);
        let result = tokio::task::spawn_blocking(move || {
            socket.lock().close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: String::new().into(),
            }))
        })
        .await
        .map_err(|e| RealtimeError::internal(e.to_string()))?;

        match result {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(tungstenite::Error::Io(e)) if is_retryable_io(&e) => Ok(()),
            Err(e) => Err(RealtimeError::classify_websocket_error(e).permanent()),
        }
    }

    fn response(&self) -> Option<&HandshakeResponse> {
        Some(&self.response)
    }
}

fn read_blocking(
    socket: &Mutex<Socket>,
    token: &CancellationToken,
    deadline: Option<Instant>,
    poll_interval: Duration,
) -> Result<(MessageType, Bytes)> {
    loop {
        if token.is_cancelled() {
            return Err(RealtimeError::Cancelled);
        }
        let timeout = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(RealtimeError::DeadlineExceeded);
                }
                remaining.min(poll_interval)
            }
            None => poll_interval,
        };

        let result = {
            let mut socket = socket.lock();
            set_read_timeout(&socket, timeout).map_err(|e| RealtimeError::Io(e).permanent())?;
            socket.read()
        };

        match result {
            Ok(message) => {
                if let Some(data) = from_message(message)? {
                    return Ok(data);
                }
            }
            Err(tungstenite::Error::Io(e)) if is_retryable_io(&e) => continue,
            Err(e) => return Err(RealtimeError::classify_websocket_error(e)),
        }
    }
}

fn set_read_timeout(socket: &Socket, timeout: Duration) -> io::Result<()> {
    match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(timeout)),
        MaybeTlsStream::Rustls(stream) => stream.get_ref().set_read_timeout(Some(timeout)),
        _ => Ok(()),
    }
}
