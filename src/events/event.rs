//! # Events dispatched through the mediator.
//!
//! An [`Event`] pairs an [`EventCode`] with an immutable [`Payload`]. The payload sits
//! behind an `Arc`, so the mediator tap and every handler share one allocation.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Handlers for one `emit` see the same event in registration order; across emits and
//! threads, `seq` is the only ordering information.
//!
//! ## Example
//! ```rust
//! use workbus::{Event, EventCode, Payload};
//!
//! let ev = Event::new(EventCode::InterruptRequested, Payload::Target("generation".into()));
//!
//! assert_eq!(ev.code, EventCode::InterruptRequested);
//! assert!(matches!(ev.payload(), Payload::Target(name) if &**name == "generation"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use super::{CorrelationId, EventCode, Payload};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// A single occurrence on the bus.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `code`: what happened
/// - `payload`: shape determined by `code`
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub code: EventCode,
    payload: Arc<Payload>,
}

impl Event {
    /// Creates a new event with current timestamp and next sequence number.
    pub fn new(code: EventCode, payload: Payload) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            code,
            payload: Arc::new(payload),
        }
    }

    /// Creates an event without payload.
    #[inline]
    pub fn now(code: EventCode) -> Self {
        Self::new(code, Payload::None)
    }

    /// Borrows the payload.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Correlation id carried by the payload, if any.
    #[inline]
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.payload.correlation_id()
    }
}
