//! Cancellation and deadline signal
//!
//! Every pipeline entry point takes a [`Cancellation`]. It combines a
//! cooperative [`CancellationToken`] with an optional deadline; whichever
//! fires first stops the operation with [`Cancelled`].

use crate::error::{CancelReason, Cancelled};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A signal that never fires unless [`Cancellation::cancel`] is called
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token, typically a child of a server shutdown token
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Reason the signal has fired, if it has
    pub fn reason(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Requested);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Fail fast if the signal has already fired
    pub fn check(&self, stage: &'static str) -> Result<(), Cancelled> {
        match self.reason() {
            Some(reason) => Err(Cancelled { stage, reason }),
            None => Ok(()),
        }
    }

    /// Resolve once the token is cancelled or the deadline passes
    pub async fn fired(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => CancelReason::Requested,
                _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CancelReason::Requested
            }
        }
    }

    /// Drive `fut` to completion unless the signal fires first
    ///
    /// The future is dropped on cancellation.
    pub async fn run<F>(&self, stage: &'static str, fut: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        self.check(stage)?;
        tokio::select! {
            biased;
            reason = self.fired() => Err(Cancelled { stage, reason }),
            output = fut => Ok(output),
        }
    }
}
