//! Error types for the realtime client
//!
//! Every error is either *transient* (local to one operation, the channel is
//! still usable) or *permanent* (the channel is dead). Permanence is carried
//! by a single wrapper variant so the classification survives `?` and can be
//! checked without matching on the underlying cause.

use std::io;

use realtime_protocol::CodecError;
use tungstenite::error::CapacityError;

use crate::ws::MessageType;

/// Main error type for the realtime client
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    // === Classification ===

    /// The wrapped error left the connection unusable
    #[error(transparent)]
    Permanent(Box<RealtimeError>),

    // === Dial Errors ===

    #[error("Failed to connect to {url}: {source}")]
    Dial {
        url: String,
        source: tungstenite::Error,
    },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    // === Transport Errors ===

    #[error("WebSocket error: {0}")]
    WebSocket(tungstenite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed with code {code}: {reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Unsupported message type")]
    UnsupportedMessageType,

    #[error("Expected a text message, got {0}")]
    UnexpectedMessageType(MessageType),

    #[error("Text message is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    // === Protocol Errors ===

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    // === Context Errors ===

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    // === Handler Errors ===

    #[error("Event handler panicked: {0}")]
    HandlerPanicked(String),

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RealtimeError {
    /// Mark this error as permanent
    ///
    /// Wrapping an already-permanent error returns it unchanged.
    pub fn permanent(self) -> Self {
        match self {
            Self::Permanent(_) => self,
            other => Self::Permanent(Box::new(other)),
        }
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    pub fn is_transient(&self) -> bool {
        !self.is_permanent()
    }

    /// The underlying error with the permanence marker stripped
    pub fn cause(&self) -> &Self {
        match self {
            Self::Permanent(inner) => inner.cause(),
            other => other,
        }
    }

    pub fn into_cause(self) -> Self {
        match self {
            Self::Permanent(inner) => inner.into_cause(),
            other => other,
        }
    }

    /// Map a transport error onto the client taxonomy
    ///
    /// Only interrupted or timed-out I/O is transient; everything else
    /// (closed connection, protocol violation, TLS, capacity) kills the
    /// channel.
    pub fn classify_websocket_error(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Io(e) if is_retryable_io(&e) => Self::Io(e),
            tungstenite::Error::Io(e) => Self::Io(e).permanent(),
            tungstenite::Error::Capacity(CapacityError::MessageTooLong { size, max_size }) => {
                Self::MessageTooLarge {
                    size,
                    max: max_size,
                }
                .permanent()
            }
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::ConnectionClosed {
                    code: 1006,
                    reason: "connection closed".into(),
                }
                .permanent()
            }
            other => Self::WebSocket(other).permanent(),
        }
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub(crate) fn is_retryable_io(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

/// Result type alias using RealtimeError
pub type Result<T> = std::result::Result<T, RealtimeError>;
