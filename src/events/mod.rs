//! Bus vocabulary: codes, payloads, events and the broadcast tap.
//!
//! ## Contents
//! - [`EventCode`], [`Signal`] closed event classification
//! - [`Payload`] and its record types, one shape per code
//! - [`Event`] code + payload + ordering metadata
//! - [`Tap`] thin wrapper over `tokio::sync::broadcast` fed by the mediator
//!
//! ## Quick reference
//! - **Publishers**: callers of `Mediator::emit`, worker loops (results),
//!   the supervisor (shutdown outcome), the mediator itself (`HandlerPanicked`).
//! - **Consumers**: handlers registered on the mediator, receivers from `Mediator::subscribe`.

mod bus;
mod code;
mod event;
mod payload;

pub use bus::Tap;
pub use code::{EventCode, Signal};
pub use event::Event;
pub use payload::{
    Cancellation, CorrelationId, HandlerPanic, LoadFailure, ModelConfig, ModelInfo, Payload,
    WorkFailure,
};
