//! Cancellation and deadline handle threaded through every finder call.
//!
//! A [`QueryContext`] is cheap to clone and safe to share between coroutines.
//! Child contexts inherit their parent's cancellation and can only tighten
//! its deadline. The query core never inspects the context itself; it is
//! forwarded unchanged to the [`EntityStore`](crate::store::EntityStore), which
//! decides how to honour it.

use crate::query::error::CallError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct QueryContext {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    parent: Option<QueryContext>,
}

impl QueryContext {
    /// A root context: never cancelled unless [`cancel`](Self::cancel) is called, no deadline
    pub fn background() -> Self {
        Self::with_parts(None, None)
    }

    /// Child context that expires `timeout` from now
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context that expires at `deadline`, or at the parent's deadline if that is earlier
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline() {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self::with_parts(Some(deadline), Some(self.clone()))
    }

    /// Child context that can be cancelled without affecting this one
    pub fn child(&self) -> Self {
        Self::with_parts(self.deadline(), Some(self.clone()))
    }

    fn with_parts(deadline: Option<Instant>, parent: Option<QueryContext>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                deadline,
                parent,
            }),
        }
    }

    /// Cancel this context and every child derived from it
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if ctx.inner.cancelled.load(Ordering::Acquire) {
                return true;
            }
            current = ctx.inner.parent.as_ref();
        }
        false
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline; `Some(Duration::ZERO)` once it has passed
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// `Err` once the context is cancelled or past its deadline.
    ///
    /// Cancellation wins when both apply.
    pub fn check(&self) -> Result<(), CallError> {
        if self.is_cancelled() {
            return Err(CallError::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(CallError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}
