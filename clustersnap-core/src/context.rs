//! Cancellable execution context passed into every gatherer.
//!
//! A [`GatherContext`] combines a cancellation token with an optional
//! deadline. Remote calls are wrapped with [`GatherContext::run`] so that a
//! cancelled or expired context makes the in-flight call return promptly with
//! a unit-scoped error.

use crate::{Result, error::GatherError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline scope for one gather run or one unit.
#[derive(Debug, Clone)]
pub struct GatherContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for GatherContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GatherContext {
    /// Creates a root context with no deadline.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derives a child context that is cancelled together with this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derives a child context whose deadline is at most `timeout` from now.
    ///
    /// An earlier deadline inherited from the parent is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(existing), Some(candidate)) => Some(existing.min(candidate)),
            (existing, None) => existing,
            (None, candidate) => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    /// Cancels this context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails fast when the context is already cancelled or past its deadline.
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(GatherError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(GatherError::Timeout {
                context: operation.to_string(),
            });
        }
        Ok(())
    }

    /// Runs `operation` bounded by this context.
    ///
    /// Cancellation wins over completion when both are ready.
    pub async fn run<F, T>(&self, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(operation)?;

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, future)
                    .await
                    .map_err(|_| GatherError::Timeout {
                        context: operation.to_string(),
                    })?,
                None => future.await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(GatherError::Cancelled),
            result = bounded => result,
        }
    }
}
