//! # Queue disciplines
//!
//! A worker's discipline decides how enqueued requests accumulate and which of them
//! are eventually handed to the collaborator.
//!
//! ## Variants
//! - `Direct`: no queue; the request runs on the enqueuing thread.
//! - `Fifo`: every request runs, strictly in arrival order.
//! - `LatestOnly`: at most one request waits; a newer one replaces it.
//!
//! ## Invariants
//! - Requests of one worker never run in parallel.
//! - Replacement under `LatestOnly` is silent: the discarded request produces no event.

use std::fmt;

use serde::Deserialize;

/// Policy controlling how work requests are queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueDiscipline {
    /// Run inline on the caller's thread.
    ///
    /// Use when:
    /// - The collaborator answers in microseconds
    /// - The caller needs the result event before `emit` returns
    /// - Example: prompt token counting
    Direct,

    /// Unbounded first-in first-out queue.
    ///
    /// Use when:
    /// - Every request matters
    /// - Order matters
    /// - Example: chat turns, speech synthesis
    Fifo,

    /// Keep only the freshest waiting request.
    ///
    /// Use when:
    /// - A newer request makes older ones pointless
    /// - Example: interactive mask preview while the user drags
    LatestOnly,
}

impl QueueDiscipline {
    /// True if the discipline needs a dedicated worker thread.
    #[inline]
    pub fn is_threaded(&self) -> bool {
        !matches!(self, QueueDiscipline::Direct)
    }
}

impl fmt::Display for QueueDiscipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueueDiscipline::Direct => "direct",
            QueueDiscipline::Fifo => "fifo",
            QueueDiscipline::LatestOnly => "latest-only",
        })
    }
}
