//! Generic worker machinery shared by every family.
//!
//! - [`Worker`] thread, queue and lifecycle around one collaborator
//! - [`WorkerKind`] / [`Collaborator`] the two halves a family provides
//! - [`QueueDiscipline`] how requests accumulate
//! - [`WorkerState`] observable lifecycle state
//! - [`ManagedWorker`] object-safe view for the supervisor

mod collaborator;
mod core;
mod discipline;
mod mailbox;
mod runner;
mod state;

pub use collaborator::{Collaborator, WorkerKind};
pub use core::{ManagedWorker, Worker};
pub use discipline::QueueDiscipline;
pub use state::WorkerState;
