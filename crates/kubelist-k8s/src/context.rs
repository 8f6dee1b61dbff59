//! Deadline and cancellation carried through every API call

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;

/// Caller context for a single API call: an optional deadline plus a
/// cancellation token shared with whoever started the invocation.
#[derive(Clone, Debug)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

impl CallContext {
    /// A context with no deadline
    pub fn background() -> Self {
        Self {
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: CancellationToken::new(),
        }
    }

    /// Derive a context that expires `timeout` from now, or earlier if this
    /// context already does. Cancelling the parent cancels the child.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.child_token(),
        }
    }

    /// Derive a context with its own deadline, ignoring the parent's.
    /// Cancellation still propagates from the parent.
    pub fn independent(&self, timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: self.cancel.child_token(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline (zero once it has passed)
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Drive an API future to completion, bounded by the deadline and
    /// aborted as soon as the context is cancelled.
    pub async fn run<T, F>(&self, call: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, kube::Error>>,
    {
        let bounded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                    Ok(result) => result.map_err(SessionError::from),
                    Err(_) => Err(SessionError::DeadlineExceeded),
                },
                None => call.await.map_err(SessionError::from),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SessionError::Cancelled),
            result = bounded => result,
        }
    }
}
