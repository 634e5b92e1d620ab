//! # Worker: one collaborator, one queue, one thread.
//!
//! A [`Worker`] owns a [`Collaborator`] and serializes everything that touches it:
//! model loads, unloads and units of work. Threaded workers (`Fifo`, `LatestOnly`)
//! run a loop on a dedicated OS thread driving a current-thread tokio runtime;
//! `Direct` workers run each unit inline on the enqueuing thread, inside the context of
//! a small runtime they own so collaborators can use tokio timers and I/O either way.
//!
//! ## Architecture
//! ```text
//!   mediator ──► wire()d handlers ──► enqueue / load / unload / interrupt
//!                                          │
//!                                          ▼
//!                              Mailbox (arrival-ordered)
//!                                          │  Notify
//!                                          ▼
//!   thread "workbus-{name}": run_loop ──► runner::* ──► result Event ──► mediator
//! ```
//!
//! ## Rules
//! - Units never overlap; the collaborator sits behind an async mutex.
//! - Each unit gets a fresh child of the shutdown token; `interrupt()` cancels only it.
//! - Once `stop()` returns, no further unit starts.
//! - Result events are dispatched after the worker is back to `Idle`.

use std::future::Future;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tokio::runtime::{self, Handle, Runtime};
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::collaborator::{Collaborator, WorkerKind};
use super::discipline::QueueDiscipline;
use super::mailbox::{Control, Job, Mailbox};
use super::runner;
use super::state::WorkerState;
use crate::config::Config;
use crate::error::{RuntimeError, WorkError};
use crate::events::{Event, EventCode, ModelConfig, Payload, Signal};
use crate::mediator::{HandlerRef, Mediator, RegistrationHandle};

struct Lifecycle {
    state: WorkerState,
    started: bool,
    thread: Option<JoinHandle<()>>,
    exited: Option<Receiver<()>>,
}

enum Next<R> {
    Job(Job<R>),
    Idle,
    Stopped,
}

/// A worker of family `K`.
pub struct Worker<K: WorkerKind> {
    me: Weak<Self>,
    mediator: Arc<Mediator>,
    discipline: QueueDiscipline,
    poll_interval: Duration,

    engine: AsyncMutex<Box<dyn Collaborator<K>>>,
    mailbox: Mutex<Mailbox<K::Request>>,
    wake: Notify,
    lifecycle: Mutex<Lifecycle>,
    shutdown: CancellationToken,
    current: Mutex<Option<CancellationToken>>,
    model: RwLock<Option<Arc<str>>>,
    registrations: Mutex<Vec<RegistrationHandle>>,
    // Timer/I-O driver for `Direct` units; threaded workers own theirs on the loop thread.
    driver: Mutex<Option<Runtime>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K: WorkerKind> Worker<K> {
    /// Creates a stopped-until-started worker around `collaborator`.
    ///
    /// The discipline is `K::DISCIPLINE` unless `cfg.disciplines` overrides it.
    pub fn new(
        collaborator: Box<dyn Collaborator<K>>,
        mediator: Arc<Mediator>,
        cfg: &Config,
    ) -> Arc<Self> {
        let discipline = cfg.discipline_for(K::NAME, K::DISCIPLINE);
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            mediator,
            discipline,
            poll_interval: cfg.poll_interval_clamped(),
            engine: AsyncMutex::new(collaborator),
            mailbox: Mutex::new(Mailbox::new(discipline)),
            wake: Notify::new(),
            lifecycle: Mutex::new(Lifecycle {
                state: WorkerState::Idle,
                started: false,
                thread: None,
                exited: None,
            }),
            shutdown: CancellationToken::new(),
            current: Mutex::new(None),
            model: RwLock::new(None),
            registrations: Mutex::new(Vec::new()),
            driver: Mutex::new(None),
        })
    }

    /// Worker name.
    #[inline]
    pub fn name(&self) -> &'static str {
        K::NAME
    }

    /// Effective queue discipline.
    #[inline]
    pub fn discipline(&self) -> QueueDiscipline {
        self.discipline
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        lock(&self.lifecycle).state
    }

    /// Number of queued control and work items.
    pub fn queued(&self) -> usize {
        lock(&self.mailbox).len()
    }

    /// True if a model is loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded_model().is_some()
    }

    /// Name of the loaded model, if any.
    pub fn loaded_model(&self) -> Option<Arc<str>> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Registers the worker's handlers on its mediator.
    ///
    /// | Code                    | Action                                   |
    /// |-------------------------|------------------------------------------|
    /// | `K(LoadRequested)`      | queue a model load                       |
    /// | `K(UnloadRequested)`    | queue a model unload                     |
    /// | `K(Requested)`          | queue (or run, if `Direct`) the request  |
    /// | `InterruptRequested`    | interrupt if untargeted or targeted here |
    /// | `ShutdownRequested`     | stop accepting work                      |
    ///
    /// Calling it twice is harmless: the mediator ignores duplicate registrations.
    pub fn wire(&self) {
        let Some(me) = self.me.upgrade() else {
            return;
        };
        let handles = [
            self.mediator.register(
                K::code(Signal::LoadRequested),
                HandlerRef::bind(&me, Self::on_load),
            ),
            self.mediator.register(
                K::code(Signal::UnloadRequested),
                HandlerRef::bind(&me, Self::on_unload),
            ),
            self.mediator.register(
                K::code(Signal::Requested),
                HandlerRef::bind(&me, Self::on_request),
            ),
            self.mediator.register(
                EventCode::InterruptRequested,
                HandlerRef::bind(&me, Self::on_interrupt),
            ),
            self.mediator.register(
                EventCode::ShutdownRequested,
                HandlerRef::bind(&me, Self::on_shutdown),
            ),
        ];
        let mut regs = lock(&self.registrations);
        for handle in handles {
            if !regs.contains(&handle) {
                regs.push(handle);
            }
        }
        debug!(worker = K::NAME, "worker wired");
    }

    fn unwire(&self) {
        let handles = std::mem::take(&mut *lock(&self.registrations));
        for handle in handles {
            self.mediator.release(handle);
        }
    }

    fn on_load(&self, ev: &Event) {
        match ev.payload() {
            Payload::Load(cfg) => self.load(cfg.clone()),
            _ => warn!(worker = K::NAME, code = %ev.code, "load request without model config ignored"),
        }
    }

    fn on_unload(&self, _ev: &Event) {
        self.unload();
    }

    fn on_request(&self, ev: &Event) {
        match K::request(ev.payload()) {
            Some(request) => self.enqueue(request),
            None => warn!(worker = K::NAME, code = %ev.code, "request with unexpected payload ignored"),
        }
    }

    fn on_interrupt(&self, ev: &Event) {
        match ev.payload() {
            Payload::Target(name) if &**name != K::NAME => {}
            _ => self.interrupt(),
        }
    }

    fn on_shutdown(&self, _ev: &Event) {
        self.begin_shutdown();
    }

    /// Queues a unit of work. `Direct` workers run it before returning.
    ///
    /// Requests arriving after shutdown began are dropped.
    pub fn enqueue(&self, request: K::Request) {
        self.submit(Job::Work(request));
    }

    /// Queues a model load behind anything already waiting.
    pub fn load(&self, config: ModelConfig) {
        self.submit(Job::Control(Control::Load(config)));
    }

    /// Queues a model unload behind anything already waiting.
    pub fn unload(&self) {
        self.submit(Job::Control(Control::Unload));
    }

    fn submit(&self, job: Job<K::Request>) {
        if !self.discipline.is_threaded() {
            match self.block_inline(|| self.run_inline(job)) {
                Ok(Some(ev)) => {
                    self.finish_unit();
                    self.mediator.dispatch(&ev);
                }
                Ok(None) => {}
                Err(e) => error!(worker = K::NAME, "inline unit dropped: {}", e.as_message()),
            }
            return;
        }
        {
            let lc = lock(&self.lifecycle);
            if lc.state == WorkerState::Stopped || self.shutdown.is_cancelled() {
                debug!(worker = K::NAME, "worker shutting down; submission dropped");
                return;
            }
            let mut mailbox = lock(&self.mailbox);
            match job {
                Job::Control(control) => mailbox.push_control(control),
                Job::Work(request) => {
                    if let Some(replaced) = mailbox.push_work(request) {
                        trace!(worker = K::NAME, id = %K::correlation_id(&replaced), "queued request replaced");
                    }
                }
            }
        }
        self.wake.notify_one();
    }

    /// Starts the worker thread. Idempotent while running.
    ///
    /// # Errors
    /// - [`RuntimeError::WorkerStopped`] if the worker was already stopped
    /// - [`RuntimeError::Spawn`] if the runtime or thread could not be created
    pub fn start(&self) -> Result<(), RuntimeError> {
        let mut lc = lock(&self.lifecycle);
        if lc.state == WorkerState::Stopped {
            return Err(RuntimeError::WorkerStopped { worker: K::NAME });
        }
        if lc.started {
            return Ok(());
        }
        if !self.discipline.is_threaded() {
            self.driver()?;
            lc.started = true;
            debug!(worker = K::NAME, discipline = %self.discipline, "worker started inline");
            return Ok(());
        }
        let Some(me) = self.me.upgrade() else {
            return Err(RuntimeError::WorkerStopped { worker: K::NAME });
        };

        let spawn_err = |source| RuntimeError::Spawn {
            worker: K::NAME,
            source,
        };
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(spawn_err)?;
        let (exit_tx, exit_rx) = mpsc::sync_channel(1);
        let handle = std::thread::Builder::new()
            .name(format!("workbus-{}", K::NAME))
            .spawn(move || {
                runtime.block_on(me.run_loop());
                let _ = exit_tx.send(());
            })
            .map_err(spawn_err)?;

        lc.started = true;
        lc.thread = Some(handle);
        lc.exited = Some(exit_rx);
        debug!(worker = K::NAME, discipline = %self.discipline, "worker started");
        Ok(())
    }

    /// Stops the worker and waits up to `timeout` for its thread to exit.
    ///
    /// Queued items are dropped, the running unit is cancelled and the worker's
    /// handlers are unregistered. Stopping twice is a no-op. A `Direct` worker
    /// waits up to `timeout` for an inline unit running on another thread, then
    /// releases its model.
    ///
    /// # Errors
    /// [`RuntimeError::StopTimeout`] if the thread (or inline unit) is still busy
    /// after `timeout`; calling `stop` again keeps waiting for it.
    pub fn stop(&self, timeout: Duration) -> Result<(), RuntimeError> {
        let (thread, exited) = {
            let mut lc = lock(&self.lifecycle);
            lc.state = WorkerState::Stopped;
            (lc.thread.take(), lc.exited.take())
        };
        let dropped = lock(&self.mailbox).clear();
        if dropped > 0 {
            debug!(worker = K::NAME, dropped, "queued items dropped on stop");
        }
        self.shutdown.cancel();
        self.wake.notify_one();
        self.unwire();

        let Some(exited) = exited else {
            if self.discipline.is_threaded() {
                return Ok(());
            }
            return self.stop_inline(timeout);
        };
        match exited.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(thread) = thread {
                    if thread.join().is_err() {
                        error!(worker = K::NAME, "worker thread panicked");
                    }
                }
                info!(worker = K::NAME, "worker stopped");
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(worker = K::NAME, ?timeout, "worker did not stop in time");
                let mut lc = lock(&self.lifecycle);
                lc.thread = thread;
                lc.exited = Some(exited);
                Err(RuntimeError::StopTimeout {
                    worker: K::NAME,
                    timeout,
                })
            }
        }
    }

    fn stop_inline(&self, timeout: Duration) -> Result<(), RuntimeError> {
        if lock(&self.driver).is_none() && !self.is_loaded() {
            return Ok(());
        }
        match self.block_inline(|| time::timeout(timeout, self.release_model()))? {
            Ok(released) => {
                if let Some(ev) = released {
                    self.mediator.dispatch(&ev);
                }
                if let Some(rt) = lock(&self.driver).take() {
                    rt.shutdown_background();
                }
                info!(worker = K::NAME, "worker stopped");
                Ok(())
            }
            Err(_) => {
                warn!(worker = K::NAME, ?timeout, "inline unit did not finish in time");
                Err(RuntimeError::StopTimeout {
                    worker: K::NAME,
                    timeout,
                })
            }
        }
    }

    /// Handle of the `Direct` driver runtime, built on first use.
    fn driver(&self) -> Result<Handle, RuntimeError> {
        let mut driver = lock(&self.driver);
        if let Some(rt) = driver.as_ref() {
            return Ok(rt.handle().clone());
        }
        let rt = runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(format!("workbus-{}-driver", K::NAME))
            .enable_all()
            .build()
            .map_err(|source| RuntimeError::Spawn {
                worker: K::NAME,
                source,
            })?;
        let handle = rt.handle().clone();
        *driver = Some(rt);
        Ok(handle)
    }

    /// Polls the future built by `make` to completion on the calling thread,
    /// inside the driver's runtime context.
    fn block_inline<F, Fut>(&self, make: F) -> Result<Fut::Output, RuntimeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let handle = self.driver()?;
        let _ctx = handle.enter();
        Ok(futures::executor::block_on(make()))
    }

    /// Cancels the unit currently running, if any. Queued work is untouched.
    pub fn interrupt(&self) {
        let mut lc = lock(&self.lifecycle);
        let current = lock(&self.current);
        if let Some(token) = current.as_ref() {
            token.cancel();
            if lc.state == WorkerState::Running {
                lc.state = WorkerState::Cancelling;
            }
            debug!(worker = K::NAME, "running unit interrupted");
        }
    }

    /// Stops accepting work and asks the loop to exit without waiting.
    pub fn begin_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            debug!(worker = K::NAME, "shutdown requested");
        }
        self.shutdown.cancel();
        self.wake.notify_one();
    }

    async fn run_loop(self: Arc<Self>) {
        debug!(worker = K::NAME, "worker loop started");
        loop {
            match self.next_job() {
                Next::Stopped => break,
                Next::Job(job) => {
                    let ev = {
                        let mut engine = self.engine.lock().await;
                        self.execute(&mut engine, job).await
                    };
                    self.finish_unit();
                    self.mediator.dispatch(&ev);
                }
                Next::Idle => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = self.wake.notified() => {}
                        _ = time::sleep(self.poll_interval) => {}
                    }
                }
            }
        }
        if let Some(ev) = self.release_model().await {
            self.mediator.dispatch(&ev);
        }
        debug!(worker = K::NAME, "worker loop exited");
    }

    fn next_job(&self) -> Next<K::Request> {
        let mut lc = lock(&self.lifecycle);
        if lc.state == WorkerState::Stopped || self.shutdown.is_cancelled() {
            return Next::Stopped;
        }
        match lock(&self.mailbox).pop() {
            Some(job) => {
                lc.state = WorkerState::Running;
                Next::Job(job)
            }
            None => Next::Idle,
        }
    }

    async fn run_inline(&self, job: Job<K::Request>) -> Option<Event> {
        let mut engine = self.engine.lock().await;
        {
            let mut lc = lock(&self.lifecycle);
            if lc.state == WorkerState::Stopped || self.shutdown.is_cancelled() {
                debug!(worker = K::NAME, "worker shutting down; submission dropped");
                return None;
            }
            lc.state = WorkerState::Running;
        }
        Some(self.execute(&mut engine, job).await)
    }

    fn finish_unit(&self) {
        let mut lc = lock(&self.lifecycle);
        if lc.state != WorkerState::Stopped {
            lc.state = WorkerState::Idle;
        }
    }

    async fn execute(&self, engine: &mut Box<dyn Collaborator<K>>, job: Job<K::Request>) -> Event {
        match job {
            Job::Control(Control::Load(config)) => {
                if let Some(previous) = self.take_model() {
                    debug!(worker = K::NAME, model = %previous, "unloading before load");
                    runner::unload_once(engine).await;
                }
                let res = runner::load_once(engine, &config).await;
                if res.is_ok() {
                    *self.model.write().unwrap_or_else(PoisonError::into_inner) =
                        Some(config.model.clone());
                    info!(worker = K::NAME, model = %config.model, "model loaded");
                }
                runner::load_outcome::<K>(&config, res)
            }
            Job::Control(Control::Unload) => {
                if let Some(previous) = self.take_model() {
                    runner::unload_once(engine).await;
                    info!(worker = K::NAME, model = %previous, "model unloaded");
                }
                runner::unloaded::<K>()
            }
            Job::Work(request) => {
                let id = K::correlation_id(&request);
                let ctx = self.shutdown.child_token();
                let started = Instant::now();
                *lock(&self.current) = Some(ctx.clone());
                trace!(worker = K::NAME, %id, "unit started");

                let res = if !self.is_loaded() {
                    Err(WorkError::NotLoaded)
                } else {
                    match K::validate(&request) {
                        Ok(()) => runner::run_once(engine, request, ctx).await,
                        Err(e) => Err(e),
                    }
                };

                *lock(&self.current) = None;
                runner::work_outcome::<K>(id, res, started.elapsed())
            }
        }
    }

    fn take_model(&self) -> Option<Arc<str>> {
        self.model
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    async fn release_model(&self) -> Option<Event> {
        let mut engine = self.engine.lock().await;
        let model = self.take_model()?;
        runner::unload_once(&mut *engine).await;
        info!(worker = K::NAME, %model, "model released on exit");
        Some(runner::unloaded::<K>())
    }
}

impl<K: WorkerKind> Drop for Worker<K> {
    fn drop(&mut self) {
        let driver = self
            .driver
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(rt) = driver {
            rt.shutdown_background();
        }
    }
}

impl<K: WorkerKind> std::fmt::Debug for Worker<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &K::NAME)
            .field("discipline", &self.discipline)
            .field("state", &self.state())
            .field("queued", &self.queued())
            .field("model", &self.loaded_model())
            .finish()
    }
}

/// Object-safe view of a worker used by the supervisor.
pub trait ManagedWorker: Send + Sync {
    /// Worker name.
    fn name(&self) -> &'static str;
    /// Current lifecycle state.
    fn state(&self) -> WorkerState;
    /// Registers handlers on the mediator.
    fn wire(&self);
    /// Starts the worker thread.
    fn start(&self) -> Result<(), RuntimeError>;
    /// Stops accepting work without waiting.
    fn begin_shutdown(&self);
    /// Stops and waits up to `timeout`.
    fn stop(&self, timeout: Duration) -> Result<(), RuntimeError>;
}

impl<K: WorkerKind> ManagedWorker for Worker<K> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn state(&self) -> WorkerState {
        Worker::state(self)
    }

    fn wire(&self) {
        Worker::wire(self)
    }

    fn start(&self) -> Result<(), RuntimeError> {
        Worker::start(self)
    }

    fn begin_shutdown(&self) {
        Worker::begin_shutdown(self)
    }

    fn stop(&self, timeout: Duration) -> Result<(), RuntimeError> {
        Worker::stop(self, timeout)
    }
}
