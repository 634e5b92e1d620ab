//! # Worker lifecycle state.
//!
//! ```text
//!            dequeue              unit returns
//!   Idle ───────────────► Running ─────────────► Idle
//!     ▲                      │
//!     │      unit returns    │ interrupt()
//!     └──────────────── Cancelling
//!
//!   any ── stop() ──► Stopped   (terminal)
//! ```

use std::fmt;

/// Current state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No unit in progress; requests may be waiting.
    Idle,
    /// A unit (work, load or unload) is executing.
    Running,
    /// The running unit was interrupted and has not returned yet.
    Cancelling,
    /// `stop()` was called; the worker never runs another unit.
    Stopped,
}

impl WorkerState {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerState::Idle => "idle",
            WorkerState::Running => "running",
            WorkerState::Cancelling => "cancelling",
            WorkerState::Stopped => "stopped",
        }
    }

    /// True while a unit is executing.
    #[inline]
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkerState::Running | WorkerState::Cancelling)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
