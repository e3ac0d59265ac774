//! Scripted in-memory websocket for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::context::Context;
use crate::error::{RealtimeError, Result};
use crate::ws::{HandshakeResponse, MessageType, WebSocketConn};

/// Serves queued reads in order; once the queue is empty, reads wait for
/// more input or for the context to finish
#[derive(Default)]
pub(crate) struct ScriptedConn {
    inbound: Mutex<VecDeque<Result<(MessageType, Bytes)>>>,
    arrived: Notify,
    sent: Mutex<Vec<(MessageType, Bytes)>>,
    write_error: Mutex<Option<RealtimeError>>,
    pings: AtomicUsize,
    closes: AtomicUsize,
}

impl ScriptedConn {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push(&self, kind: MessageType, data: Bytes) {
        self.inbound.lock().push_back(Ok((kind, data)));
        self.arrived.notify_one();
    }

    pub(crate) fn push_text(&self, text: &str) {
        self.push(MessageType::Text, Bytes::copy_from_slice(text.as_bytes()));
    }

    pub(crate) fn push_error(&self, err: RealtimeError) {
        self.inbound.lock().push_back(Err(err));
        self.arrived.notify_one();
    }

    /// The next write fails with `err`, marked permanent
    pub(crate) fn fail_writes(&self, err: RealtimeError) {
        *self.write_error.lock() = Some(err);
    }

    pub(crate) fn sent(&self) -> Vec<(MessageType, Bytes)> {
        self.sent.lock().clone()
    }

    pub(crate) fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    pub(crate) fn close_calls(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSocketConn for Arc<ScriptedConn> {
    async fn read_message(&self, ctx: &Context) -> Result<(MessageType, Bytes)> {
        loop {
            let next = self.inbound.lock().pop_front();
            if let Some(next) = next {
                return next;
            }
            tokio::select! {
                biased;
                err = ctx.done() => return Err(err),
                _ = self.arrived.notified() => {}
            }
        }
    }

    async fn write_message(&self, _ctx: &Context, kind: MessageType, data: Bytes) -> Result<()> {
        if let Some(err) = self.write_error.lock().take() {
            return Err(err.permanent());
        }
        self.sent.lock().push((kind, data));
        Ok(())
    }

    async fn ping(&self, _ctx: &Context) -> Result<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn response(&self) -> Option<&HandshakeResponse> {
        None
    }
}
