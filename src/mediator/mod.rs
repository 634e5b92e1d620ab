//! Pub/sub bus shared by every subsystem.
//!
//! - [`Mediator`] registry + synchronous dispatcher
//! - [`HandlerRef`] / [`HandlerId`] callables with identity for dedup
//! - [`RegistrationHandle`] receipt returned by `register`

mod handler;
#[allow(clippy::module_inception)]
mod mediator;

pub use handler::{HandlerId, HandlerRef};
pub use mediator::{Mediator, RegistrationHandle};
