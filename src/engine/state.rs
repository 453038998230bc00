//! Execution identity and state tracking.
//!
//! # Responsibilities
//! - Generate unique execution IDs for tracing
//! - Track each execution's lifecycle state
//! - Publish state changes for observation (tests, callers)

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

/// Global atomic counter for execution IDs.
/// Relaxed ordering is sufficient since we only need uniqueness.
static EXECUTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionId(u64);

impl ExecutionId {
    /// Generate a new unique execution ID.
    pub fn new() -> Self {
        Self(EXECUTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exec-{}", self.0)
    }
}

/// Lifecycle state of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Created, no network activity yet.
    Idle,
    /// Opening and configuring the transport connection.
    Connecting,
    /// Streaming the request body.
    Uploading,
    /// Waiting for / streaming the response.
    Downloading,
    /// Cancellation observed, winding down.
    Cancelling,
    /// Execution finished (successfully or after a swallowed failure).
    Completed,
    /// Execution cancelled; no further callbacks fire.
    Cancelled,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionState::Completed | ExecutionState::Cancelled)
    }
}

/// Publishes state transitions for one execution.
///
/// Terminal states stick: transitions requested after `Completed` or
/// `Cancelled` are dropped.
pub(crate) struct StateCell {
    id: ExecutionId,
    tx: watch::Sender<ExecutionState>,
}

impl StateCell {
    pub(crate) fn new(id: ExecutionId) -> (Self, watch::Receiver<ExecutionState>) {
        let (tx, rx) = watch::channel(ExecutionState::Idle);
        (Self { id, tx }, rx)
    }

    pub(crate) fn advance(&self, next: ExecutionState) {
        let current = *self.tx.borrow();
        if current == next || current.is_terminal() {
            return;
        }
        tracing::trace!(execution_id = %self.id, from = ?current, to = ?next, "execution state transition");
        let _ = self.tx.send(next);
    }
}
