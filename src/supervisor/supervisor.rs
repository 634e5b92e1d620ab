//! # WorkerSupervisor: constructs, wires and stops the fixed worker set.
//!
//! The [`WorkerSupervisor`] owns one worker per provided collaborator and the
//! [`Mediator`] they are wired to. It holds no business logic.
//!
//! ## Lifecycle
//! ```text
//! builder(cfg).with_*(collaborator)...build()
//!        │
//!        ▼
//! initialize()  (first call)
//!   ├─► Worker::new(...) for each provided collaborator   (exactly once)
//!   ├─► worker.wire()                                     (registrations)
//!   └─► worker.start()                                    (threads)
//! initialize()  (later calls)
//!   └─► worker.start()                                    (idempotent)
//!
//! shutdown()
//!   ├─► emit(ShutdownRequested)      → every worker stops taking work
//!   ├─► worker.stop(remaining grace) for each worker, shared deadline
//!   ├─ all stopped   → emit(AllStoppedWithin)                → Ok(())
//!   └─ some stuck    → emit(GraceExceeded, Payload::Stuck)   → Err(GraceExceeded)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use workbus::{Config, EventCode, Payload, WorkerSupervisor};
//! use workbus::workers::token_count::TokenCountRequest;
//! # use async_trait::async_trait;
//! # use tokio_util::sync::CancellationToken;
//! # use workbus::{Collaborator, LoadError, ModelConfig, Signal, WorkError};
//! # use workbus::workers::token_count::{TokenCount, TokenCountKind};
//! # struct Whitespace;
//! # #[async_trait]
//! # impl Collaborator<TokenCountKind> for Whitespace {
//! #     async fn load(&mut self, _cfg: &ModelConfig) -> Result<(), LoadError> { Ok(()) }
//! #     async fn run(&mut self, req: TokenCountRequest, _ctx: CancellationToken)
//! #         -> Result<TokenCount, WorkError> {
//! #         Ok(TokenCount { id: req.id, tokens: req.text.split_whitespace().count() })
//! #     }
//! #     async fn unload(&mut self) {}
//! # }
//!
//! let mut cfg = Config::default();
//! cfg.grace = Duration::from_secs(1);
//!
//! let sup = WorkerSupervisor::builder(cfg)
//!     .with_token_count(Box::new(Whitespace))
//!     .build();
//! sup.initialize().unwrap();
//!
//! let bus = sup.mediator();
//! bus.emit(
//!     EventCode::TokenCount(Signal::LoadRequested),
//!     Payload::Load(ModelConfig::new("ws", "/dev/null")),
//! );
//! assert!(sup.token_count().unwrap().is_loaded());
//!
//! sup.shutdown().unwrap();
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::builder::WorkerSupervisorBuilder;
use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{EventCode, Payload};
use crate::mediator::Mediator;
use crate::worker::{Collaborator, ManagedWorker, Worker, WorkerState};
use crate::workers::{
    GenerationKind, GenerationWorker, ImageKind, ImageWorker, IndexingKind, IndexingWorker,
    MaskPreviewKind, MaskPreviewWorker, RecognitionKind, RecognitionWorker, SynthesisKind,
    SynthesisWorker, TokenCountKind, TokenCountWorker,
};

/// Collaborators waiting for `initialize()`.
#[derive(Default)]
pub(super) struct Collaborators {
    pub generation: Option<Box<dyn Collaborator<GenerationKind>>>,
    pub image: Option<Box<dyn Collaborator<ImageKind>>>,
    pub mask_preview: Option<Box<dyn Collaborator<MaskPreviewKind>>>,
    pub synthesis: Option<Box<dyn Collaborator<SynthesisKind>>>,
    pub recognition: Option<Box<dyn Collaborator<RecognitionKind>>>,
    pub indexing: Option<Box<dyn Collaborator<IndexingKind>>>,
    pub token_count: Option<Box<dyn Collaborator<TokenCountKind>>>,
}

#[derive(Default)]
struct Workers {
    generation: Option<Arc<GenerationWorker>>,
    image: Option<Arc<ImageWorker>>,
    mask_preview: Option<Arc<MaskPreviewWorker>>,
    synthesis: Option<Arc<SynthesisWorker>>,
    recognition: Option<Arc<RecognitionWorker>>,
    indexing: Option<Arc<IndexingWorker>>,
    token_count: Option<Arc<TokenCountWorker>>,
}

impl Workers {
    fn construct(pending: Collaborators, mediator: &Arc<Mediator>, cfg: &Config) -> Self {
        Self {
            generation: pending.generation.map(|c| Worker::new(c, Arc::clone(mediator), cfg)),
            image: pending.image.map(|c| Worker::new(c, Arc::clone(mediator), cfg)),
            mask_preview: pending.mask_preview.map(|c| Worker::new(c, Arc::clone(mediator), cfg)),
            synthesis: pending.synthesis.map(|c| Worker::new(c, Arc::clone(mediator), cfg)),
            recognition: pending.recognition.map(|c| Worker::new(c, Arc::clone(mediator), cfg)),
            indexing: pending.indexing.map(|c| Worker::new(c, Arc::clone(mediator), cfg)),
            token_count: pending.token_count.map(|c| Worker::new(c, Arc::clone(mediator), cfg)),
        }
    }

    /// Every constructed worker, in a fixed order.
    fn all(&self) -> Vec<Arc<dyn ManagedWorker>> {
        let mut out: Vec<Arc<dyn ManagedWorker>> = Vec::new();
        if let Some(w) = &self.generation {
            out.push(w.clone());
        }
        if let Some(w) = &self.image {
            out.push(w.clone());
        }
        if let Some(w) = &self.mask_preview {
            out.push(w.clone());
        }
        if let Some(w) = &self.synthesis {
            out.push(w.clone());
        }
        if let Some(w) = &self.recognition {
            out.push(w.clone());
        }
        if let Some(w) = &self.indexing {
            out.push(w.clone());
        }
        if let Some(w) = &self.token_count {
            out.push(w.clone());
        }
        out
    }
}

struct Slot {
    pending: Option<Collaborators>,
    workers: Option<Arc<Workers>>,
    stopped: bool,
}

/// Owns the worker set and its lifecycle.
pub struct WorkerSupervisor {
    cfg: Config,
    mediator: Arc<Mediator>,
    slot: Mutex<Slot>,
}

impl WorkerSupervisor {
    /// Starts building a supervisor.
    pub fn builder(cfg: Config) -> WorkerSupervisorBuilder {
        WorkerSupervisorBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: Config,
        mediator: Arc<Mediator>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            cfg,
            mediator,
            slot: Mutex::new(Slot {
                pending: Some(collaborators),
                workers: None,
                stopped: false,
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn workers(&self) -> Option<Arc<Workers>> {
        self.slot().workers.clone()
    }

    /// Constructs, wires and starts every worker.
    ///
    /// Construction and wiring happen exactly once; later calls only retry `start()`,
    /// which is idempotent per worker.
    ///
    /// # Errors
    /// - [`RuntimeError::SupervisorStopped`] once `shutdown()` was called
    /// - the first [`RuntimeError`] returned by a worker's `start()`
    pub fn initialize(&self) -> Result<(), RuntimeError> {
        let workers = {
            let mut slot = self.slot();
            if slot.stopped {
                return Err(RuntimeError::SupervisorStopped);
            }
            if let Some(existing) = slot.workers.clone() {
                debug!("supervisor already initialized");
                existing
            } else {
                let pending = slot.pending.take().unwrap_or_default();
                let built = Arc::new(Workers::construct(pending, &self.mediator, &self.cfg));
                let all = built.all();
                for w in &all {
                    w.wire();
                }
                info!(workers = all.len(), "workers constructed");
                slot.workers = Some(Arc::clone(&built));
                built
            }
        };
        for w in workers.all() {
            w.start()?;
        }
        Ok(())
    }

    /// True once `initialize()` constructed the worker set.
    pub fn is_initialized(&self) -> bool {
        self.slot().workers.is_some()
    }

    /// Emits `ShutdownRequested`, then stops every worker within `cfg.grace`.
    ///
    /// Collaborators of workers that were never constructed are dropped; the
    /// supervisor cannot be initialized afterwards.
    ///
    /// # Errors
    /// [`RuntimeError::GraceExceeded`] naming the workers still busy when the
    /// grace period ran out; they are detached, not killed.
    pub fn shutdown(&self) -> Result<(), RuntimeError> {
        let workers = {
            let mut slot = self.slot();
            slot.stopped = true;
            slot.pending = None;
            slot.workers.clone().unwrap_or_default()
        };
        let grace = self.cfg.grace;
        let deadline = Instant::now() + grace;

        info!(?grace, "shutdown requested");
        self.mediator.signal(EventCode::ShutdownRequested);

        let mut stuck = Vec::new();
        for w in workers.all() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match w.stop(remaining) {
                Ok(()) => {}
                Err(RuntimeError::StopTimeout { worker, .. }) => stuck.push(worker.to_string()),
                Err(e) => warn!(worker = w.name(), "stop failed: {}", e.as_message()),
            }
        }

        if stuck.is_empty() {
            info!("all workers stopped within grace");
            self.mediator.signal(EventCode::AllStoppedWithin);
            Ok(())
        } else {
            warn!(?stuck, ?grace, "grace exceeded");
            self.mediator
                .emit(EventCode::GraceExceeded, Payload::Stuck(stuck.clone()));
            Err(RuntimeError::GraceExceeded { grace, stuck })
        }
    }

    /// The mediator every worker is wired to.
    pub fn mediator(&self) -> Arc<Mediator> {
        Arc::clone(&self.mediator)
    }

    /// Configuration the workers were built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Name and state of every constructed worker.
    pub fn states(&self) -> Vec<(&'static str, WorkerState)> {
        self.workers()
            .map(|ws| ws.all().iter().map(|w| (w.name(), w.state())).collect())
            .unwrap_or_default()
    }

    pub fn generation(&self) -> Option<Arc<GenerationWorker>> {
        self.workers()?.generation.clone()
    }

    pub fn image(&self) -> Option<Arc<ImageWorker>> {
        self.workers()?.image.clone()
    }

    pub fn mask_preview(&self) -> Option<Arc<MaskPreviewWorker>> {
        self.workers()?.mask_preview.clone()
    }

    pub fn synthesis(&self) -> Option<Arc<SynthesisWorker>> {
        self.workers()?.synthesis.clone()
    }

    pub fn recognition(&self) -> Option<Arc<RecognitionWorker>> {
        self.workers()?.recognition.clone()
    }

    pub fn indexing(&self) -> Option<Arc<IndexingWorker>> {
        self.workers()?.indexing.clone()
    }

    pub fn token_count(&self) -> Option<Arc<TokenCountWorker>> {
        self.workers()?.token_count.clone()
    }
}
