//! # Broadcast tap over every emitted event.
//!
//! [`Tap`] is a thin wrapper around [`tokio::sync::broadcast`] that the
//! [`Mediator`](crate::Mediator) feeds with a clone of each event after its
//! synchronous fan-out. Async consumers (UI bridges, tests, log writers) can
//! observe the bus without registering handlers for individual codes.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for emitted events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately (send clones internally).
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Tap {
    tx: broadcast::Sender<Event>,
}

impl Tap {
    /// Creates a new tap with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes a borrowed event by cloning it.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: &Event) {
        if self.tx.receiver_count() > 0 {
            let _ = self.tx.send(ev.clone());
        }
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
