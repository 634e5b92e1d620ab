//! # Run a single unit against a collaborator.
//!
//! Executes one work, load or unload unit with panic isolation and turns the
//! outcome into exactly one result event.
//!
//! ## Event flow
//!
//! ```text
//! Work:
//!   run() → Ok(out)          → K(Completed)  completed(out)
//!   run() → Err(Canceled)    → K(Cancelled)  Payload::Cancelled
//!   run() → Err(e) / panic   → K(Failed)     Payload::Failed
//!
//! Load:
//!   load() → Ok(())          → K(Loaded)     Payload::Loaded
//!   load() → Err(e) / panic  → K(LoadFailed) Payload::LoadFailed
//!
//! Unload:
//!   unload() (panic logged)  → K(Unloaded)   Payload::Worker
//! ```
//!
//! ## Rules
//! - A panic inside the collaborator never unwinds into the worker loop.
//! - `Canceled` is a graceful exit, not a failure.
//! - Events are built here but dispatched by the caller, after the worker
//!   left the `Running` state.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::collaborator::{Collaborator, WorkerKind};
use crate::error::{LoadError, WorkError, panic_message};
use crate::events::{
    Cancellation, CorrelationId, Event, LoadFailure, ModelConfig, ModelInfo, Payload, Signal,
    WorkFailure,
};

type Engine<K> = Box<dyn Collaborator<K>>;

/// Runs one request; panics become [`WorkError::Panicked`].
pub(crate) async fn run_once<K: WorkerKind>(
    engine: &mut Engine<K>,
    request: K::Request,
    ctx: CancellationToken,
) -> Result<K::Output, WorkError> {
    match AssertUnwindSafe(engine.run(request, ctx)).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(WorkError::Panicked {
            info: panic_message(panic.as_ref()),
        }),
    }
}

/// Loads a model; panics become [`LoadError::Panicked`].
pub(crate) async fn load_once<K: WorkerKind>(
    engine: &mut Engine<K>,
    config: &ModelConfig,
) -> Result<(), LoadError> {
    match AssertUnwindSafe(engine.load(config)).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(LoadError::Panicked {
            info: panic_message(panic.as_ref()),
        }),
    }
}

/// Unloads the current model; a panic is logged and swallowed.
pub(crate) async fn unload_once<K: WorkerKind>(engine: &mut Engine<K>) {
    if let Err(panic) = AssertUnwindSafe(engine.unload()).catch_unwind().await {
        error!(
            worker = K::NAME,
            "collaborator panicked during unload: {}",
            panic_message(panic.as_ref())
        );
    }
}

/// Builds the result event of a work unit.
pub(crate) fn work_outcome<K: WorkerKind>(
    id: CorrelationId,
    res: Result<K::Output, WorkError>,
    elapsed: Duration,
) -> Event {
    let elapsed_ms = elapsed.as_millis() as u64;
    match res {
        Ok(out) => {
            info!(worker = K::NAME, %id, elapsed_ms, "unit completed");
            Event::new(K::code(Signal::Completed), K::completed(out))
        }
        Err(WorkError::Canceled) => {
            debug!(worker = K::NAME, %id, elapsed_ms, "unit cancelled");
            Event::new(
                K::code(Signal::Cancelled),
                Payload::Cancelled(Cancellation {
                    id,
                    worker: K::NAME,
                }),
            )
        }
        Err(e) => {
            error!(worker = K::NAME, %id, label = e.as_label(), "unit failed: {}", e.as_message());
            Event::new(
                K::code(Signal::Failed),
                Payload::Failed(WorkFailure {
                    id,
                    worker: K::NAME,
                    label: e.as_label(),
                    reason: e.to_string().into(),
                }),
            )
        }
    }
}

/// Builds the result event of a load unit.
pub(crate) fn load_outcome<K: WorkerKind>(
    config: &ModelConfig,
    res: Result<(), LoadError>,
) -> Event {
    match res {
        Ok(()) => Event::new(
            K::code(Signal::Loaded),
            Payload::Loaded(ModelInfo {
                worker: K::NAME,
                model: config.model.clone(),
            }),
        ),
        Err(e) => {
            warn!(
                worker = K::NAME,
                model = %config.model,
                label = e.as_label(),
                "model load failed: {}",
                e.as_message()
            );
            Event::new(
                K::code(Signal::LoadFailed),
                Payload::LoadFailed(LoadFailure {
                    worker: K::NAME,
                    model: config.model.clone(),
                    label: e.as_label(),
                    reason: e.to_string().into(),
                }),
            )
        }
    }
}

/// Builds the `Unloaded` event.
pub(crate) fn unloaded<K: WorkerKind>() -> Event {
    Event::new(K::code(Signal::Unloaded), Payload::Worker(K::NAME))
}
