//! Deadline and cancellation carried through start and stop hooks.

use crate::error::{DbError, DbResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Context a container passes to lifecycle hooks.
///
/// Per-phase budgets are intersected with the context deadline, and cancelling
/// the token pre-empts whatever a hook is waiting on.
#[derive(Debug, Clone)]
pub struct LifecycleContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl LifecycleContext {
    /// No deadline, fresh cancellation token.
    pub fn new() -> Self {
        Self {
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().timeout(timeout)
    }

    /// Tighten the deadline to at most `timeout` from now.
    ///
    /// A timeout too large to represent as an instant sets no deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = earliest(self.deadline, Instant::now().checked_add(timeout));
        self
    }

    /// Share an external cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Child context: same deadline, token cancelled with the parent.
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            cancel: self.cancel.child_token(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `future` bounded by `budget` (if any), the context deadline, and the
    /// cancellation token, whichever comes first.
    pub async fn run<T, F>(&self, operation: &str, budget: Option<Duration>, future: F) -> DbResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        let budget_deadline = budget.and_then(|b| Instant::now().checked_add(b));
        let deadline = earliest(self.deadline, budget_deadline);

        if self.cancel.is_cancelled() {
            return Err(DbError::cancelled(operation));
        }

        match deadline {
            Some(deadline) => {
                // Report whichever bound is the binding one
                let timeout_ms = match (budget, budget_deadline) {
                    (Some(b), Some(bd)) if bd <= deadline => millis(b),
                    _ => millis(deadline.saturating_duration_since(Instant::now())),
                };
                tokio::select! {
                    result = future => result,
                    _ = tokio::time::sleep_until(deadline) => {
                        Err(DbError::timeout(operation, timeout_ms))
                    }
                    _ = self.cancel.cancelled() => Err(DbError::cancelled(operation)),
                }
            }
            None => {
                tokio::select! {
                    result = future => result,
                    _ = self.cancel.cancelled() => Err(DbError::cancelled(operation)),
                }
            }
        }
    }
}

fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for LifecycleContext {
    fn default() -> Self {
        Self::new()
    }
}
