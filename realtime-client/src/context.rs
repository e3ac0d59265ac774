//! Cancellation and deadlines for blocking operations
//!
//! A [`Context`] is a cancellation token plus an optional deadline. Children
//! derived with [`Context::with_cancel`] or [`Context::with_timeout`] are
//! cancelled with their parent but can be cancelled on their own, and never
//! outlive the parent's deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::RealtimeError;

#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context that can be cancelled independently of `self`
    pub fn with_cancel(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context expiring at `deadline`, or at the parent's deadline if
    /// that comes first
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this context is done, or `None` while it is still live
    pub fn err(&self) -> Option<RealtimeError> {
        if self.token.is_cancelled() {
            return Some(RealtimeError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(RealtimeError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes
    pub async fn done(&self) -> RealtimeError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => RealtimeError::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => RealtimeError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                RealtimeError::Cancelled
            }
        }
    }

    /// Run `fut` unless the context finishes first
    pub async fn run<F, T>(&self, fut: F) -> Result<T, RealtimeError>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => Ok(out),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
