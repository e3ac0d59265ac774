//! realtime-client: WebSocket client for the realtime conversation API
//!
//! [`Client::connect`] dials the service and returns a [`Conn`] that sends
//! [`ClientEvent`]s and reads [`ServerEvent`]s. [`ConnHandler`] runs the read
//! loop on a background task and fans every inbound event out to the
//! registered [`EventHandler`]s in order.
//!
//! Two transports are provided: [`TungsteniteDialer`] (async, the default)
//! and [`BlockingDialer`] (a synchronous socket polled on the blocking pool).

pub mod client;
pub mod config;
pub mod conn;
pub mod context;
pub mod error;
pub mod logger;
pub mod ws;

pub use client::{Client, ConnectOptions, Intent};
pub use config::{ApiType, ClientConfig, FileConfig, TransportKind};
pub use conn::{CallbackHandler, Conn, ConnHandler, EventHandler, RunningHandler};
pub use context::Context;
pub use error::{RealtimeError, Result};
pub use logger::{Logger, NopLogger, TracingLogger};
pub use ws::blocking::{BlockingDialer, BlockingOptions};
pub use ws::async_ws::{TungsteniteDialer, TungsteniteOptions};
pub use ws::{HandshakeResponse, MessageType, WebSocketConn, WebSocketDialer};

pub use realtime_protocol::{ClientEvent, ClientEventType, ServerEvent, ServerEventType};
pub use realtime_utils::{init_logging, init_logging_with_config, LogConfig, LogOutput};
