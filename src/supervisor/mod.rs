//! Worker set construction and lifecycle.
//!
//! - [`WorkerSupervisor`] owns every worker and drives startup/shutdown
//! - [`WorkerSupervisorBuilder`] collects the config, mediator and collaborators

mod builder;
#[allow(clippy::module_inception)]
mod supervisor;

pub use builder::WorkerSupervisorBuilder;
pub use supervisor::WorkerSupervisor;
