//! # workbus
//!
//! **Workbus** is the concurrency backbone for applications that drive heavy,
//! long-running operations (image synthesis, text generation, speech, indexing)
//! from a single-threaded control surface.
//!
//! Callers never block on the work itself: they emit a request on the
//! [`Mediator`], a [`Worker`] queues it on its own thread, and the result comes
//! back later as another event.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller (UI, API, tests)
//!        │ emit(code, payload)                       ▲ handlers(result events)
//!        ▼                                           │
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Mediator                                                         │
//! │  - BTreeMap<EventCode, Vec<HandlerRef>> behind a RwLock           │
//! │  - snapshot → invoke in registration order → catch panics         │
//! │  - Tap (broadcast) for async observers                            │
//! └──────┬──────────────────┬──────────────────┬───────────────▲──────┘
//!        ▼                  ▼                  ▼               │
//!  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//!  │ Worker<Gen> │   │ Worker<Img> │   │ Worker<Tok> │         │
//!  │ Fifo        │   │ Fifo        │   │ Direct      │         │
//!  │ thread      │   │ thread      │   │ (inline)    │         │
//!  └─────┬───────┘   └─────┬───────┘   └─────┬───────┘         │
//!        ▼                 ▼                 ▼                 │
//!   Collaborator      Collaborator      Collaborator           │
//!   (load/run/unload, polled CancellationToken)                │
//!        └─────────── *Completed / *Failed / *Cancelled ───────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! WorkerSupervisor::builder(cfg).with_*(collaborator).build()
//!   └─► initialize(): construct once ─► wire() ─► start()
//!
//! worker thread loop {
//!   ├─► next job in arrival order (LatestOnly keeps one waiting request)
//!   ├─► Running, fresh child CancellationToken
//!   ├─► Collaborator::run(request, token)   (panics caught)
//!   ├─► Idle
//!   └─► emit K(Completed | Failed | Cancelled)
//! }
//!
//! shutdown(): emit ShutdownRequested ─► stop(remaining grace) each
//!             ─► AllStoppedWithin | GraceExceeded
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Bus**           | Register handlers, emit events, observe everything async.     | [`Mediator`], [`HandlerRef`], [`Event`]    |
//! | **Workers**       | One thread, one queue, one collaborator per family.           | [`Worker`], [`WorkerKind`], [`Collaborator`] |
//! | **Queueing**      | Direct, FIFO or latest-only request handling.                 | [`QueueDiscipline`]                        |
//! | **Supervision**   | Construct once, start, shut down within a grace period.       | [`WorkerSupervisor`]                       |
//! | **Errors**        | Typed errors for runtime, work, load and config.              | [`RuntimeError`], [`WorkError`], [`LoadError`] |
//! | **Configuration** | Explicit settings, optionally from TOML.                      | [`Config`]                                 |
//!
//! ## Logging
//! The crate logs through [`tracing`] and never installs a subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::mpsc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use workbus::workers::generation::{FinishReason, GeneratedText, GenerationKind, GenerationRequest};
//! use workbus::{
//!     Collaborator, Config, Event, EventCode, HandlerRef, LoadError, ModelConfig, Payload,
//!     Signal, WorkError, WorkerSupervisor,
//! };
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Collaborator<GenerationKind> for Echo {
//!     async fn load(&mut self, _cfg: &ModelConfig) -> Result<(), LoadError> {
//!         Ok(())
//!     }
//!
//!     async fn run(
//!         &mut self,
//!         req: GenerationRequest,
//!         ctx: CancellationToken,
//!     ) -> Result<GeneratedText, WorkError> {
//!         if ctx.is_cancelled() {
//!             return Err(WorkError::Canceled);
//!         }
//!         Ok(GeneratedText { id: req.id, text: req.prompt, tokens: 1, finish: FinishReason::EndOfText })
//!     }
//!
//!     async fn unload(&mut self) {}
//! }
//!
//! let sup = WorkerSupervisor::builder(Config::default())
//!     .with_generation(Box::new(Echo))
//!     .build();
//! sup.initialize().unwrap();
//!
//! let bus = sup.mediator();
//! let (tx, rx) = mpsc::channel();
//! let tx = std::sync::Mutex::new(tx);
//! bus.register(
//!     EventCode::Generation(Signal::Completed),
//!     HandlerRef::func(move |ev: &Event| {
//!         if let Payload::Generated(out) = ev.payload() {
//!             let _ = tx.lock().unwrap().send(out.text.clone());
//!         }
//!     }),
//! );
//!
//! bus.emit(EventCode::Generation(Signal::LoadRequested), Payload::Load(ModelConfig::new("echo", "/dev/null")));
//! bus.emit(EventCode::Generation(Signal::Requested), Payload::Generation(GenerationRequest::new("hi")));
//!
//! assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "hi");
//! sup.shutdown().unwrap();
//! ```

mod config;
mod error;
mod events;
mod mediator;
mod supervisor;
mod worker;

pub mod workers;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{ConfigError, LoadError, RuntimeError, WorkError};
pub use events::{
    Cancellation, CorrelationId, Event, EventCode, HandlerPanic, LoadFailure, ModelConfig,
    ModelInfo, Payload, Signal, WorkFailure,
};
pub use mediator::{HandlerId, HandlerRef, Mediator, RegistrationHandle};
pub use supervisor::{WorkerSupervisor, WorkerSupervisorBuilder};
pub use worker::{Collaborator, ManagedWorker, QueueDiscipline, Worker, WorkerKind, WorkerState};
pub use workers::{
    GenerationWorker, ImageWorker, IndexingWorker, MaskPreviewWorker, RecognitionWorker,
    SynthesisWorker, TokenCountWorker,
};
