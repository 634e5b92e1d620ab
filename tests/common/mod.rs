#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use workbus::workers::generation::{FinishReason, GeneratedText, GenerationKind, GenerationRequest};
use workbus::workers::token_count::{TokenCount, TokenCountKind, TokenCountRequest};
use workbus::{
    Collaborator, Config, Event, EventCode, HandlerRef, LoadError, Mediator, ModelConfig, WorkError,
};

pub const WAIT: Duration = Duration::from_secs(5);

/// Fast polling, short grace.
pub fn config() -> Config {
    let mut cfg = Config::default();
    cfg.poll_interval = Duration::from_millis(5);
    cfg.grace = Duration::from_secs(2);
    cfg
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Forwards every event emitted on `codes` into a channel.
pub fn record(mediator: &Mediator, codes: &[EventCode]) -> Receiver<Event> {
    let (tx, rx) = mpsc::channel();
    for &code in codes {
        let tx = Mutex::new(tx.clone());
        mediator.register(
            code,
            HandlerRef::func(move |ev: &Event| {
                let _ = tx.lock().unwrap().send(ev.clone());
            }),
        );
    }
    rx
}

/// Receives until an event with `code` arrives.
pub fn wait_for(rx: &Receiver<Event>, code: EventCode) -> Event {
    loop {
        let ev = rx
            .recv_timeout(WAIT)
            .unwrap_or_else(|_| panic!("timed out waiting for {code}"));
        if ev.code == code {
            return ev;
        }
    }
}

/// Shared observations of a [`ScriptedGenerator`].
#[derive(Default)]
pub struct Journal {
    pub prompts: Mutex<Vec<String>>,
    pub loads: Mutex<Vec<String>>,
    pub unloads: AtomicUsize,
    pub cancelled_at: Mutex<Option<u32>>,
    pub threads: Mutex<Vec<Option<String>>>,
}

impl Journal {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn unloads(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }
}

/// Test side of a stepping generator.
pub struct Stepper {
    pub progress: Receiver<u32>,
    pub go: Sender<()>,
}

impl Stepper {
    /// Waits for the generator to report step `expected`.
    pub fn reached(&self, expected: u32) {
        let step = self.progress.recv_timeout(WAIT).expect("no progress");
        assert_eq!(step, expected);
    }

    pub fn release(&self) {
        let _ = self.go.send(());
    }
}

/// Generation collaborator driven by its prompt.
///
/// | Prompt     | Behaviour                                                  |
/// |------------|------------------------------------------------------------|
/// | `boom`     | fails with `WorkError::Fail`                               |
/// | `panic`    | panics                                                     |
/// | `steps:N`  | N steps; each reports progress, waits for go, then checks the token |
/// | `block`    | waits for go once, ignoring the token                      |
/// | other      | echoes the prompt upper-cased                              |
///
/// Loading the model named `missing` fails with `LoadError::NotFound`.
pub struct ScriptedGenerator {
    journal: Arc<Journal>,
    progress: Sender<u32>,
    go: Receiver<()>,
}

impl ScriptedGenerator {
    pub fn new() -> (Box<Self>, Arc<Journal>, Stepper) {
        let journal = Arc::new(Journal::default());
        let (progress_tx, progress_rx) = mpsc::channel();
        let (go_tx, go_rx) = mpsc::channel();
        let generator = Box::new(Self {
            journal: Arc::clone(&journal),
            progress: progress_tx,
            go: go_rx,
        });
        let stepper = Stepper {
            progress: progress_rx,
            go: go_tx,
        };
        (generator, journal, stepper)
    }

    fn wait_go(&self) {
        let _ = self.go.recv_timeout(WAIT);
    }
}

#[async_trait]
impl Collaborator<GenerationKind> for ScriptedGenerator {
    async fn load(&mut self, config: &ModelConfig) -> Result<(), LoadError> {
        if &*config.model == "missing" {
            return Err(LoadError::NotFound {
                path: config.path.display().to_string(),
            });
        }
        self.journal.loads.lock().unwrap().push(config.model.to_string());
        Ok(())
    }

    async fn run(
        &mut self,
        req: GenerationRequest,
        ctx: CancellationToken,
    ) -> Result<GeneratedText, WorkError> {
        self.journal.prompts.lock().unwrap().push(req.prompt.clone());
        self.journal
            .threads
            .lock()
            .unwrap()
            .push(std::thread::current().name().map(str::to_string));

        let prompt = req.prompt.as_str();
        if prompt == "boom" {
            return Err(WorkError::fail("boom"));
        }
        if prompt == "panic" {
            panic!("kaboom");
        }
        if prompt == "block" {
            let _ = self.progress.send(0);
            self.wait_go();
        }
        if let Some(n) = prompt.strip_prefix("steps:") {
            let n: u32 = n.parse().map_err(|_| WorkError::invalid("bad step count"))?;
            for step in 0..n {
                let _ = self.progress.send(step);
                self.wait_go();
                if ctx.is_cancelled() {
                    *self.journal.cancelled_at.lock().unwrap() = Some(step);
                    return Err(WorkError::Canceled);
                }
            }
        }
        Ok(GeneratedText {
            id: req.id,
            text: req.prompt.to_uppercase(),
            tokens: 1,
            finish: FinishReason::EndOfText,
        })
    }

    async fn unload(&mut self) {
        self.journal.unloads.fetch_add(1, Ordering::SeqCst);
    }
}

/// Whitespace token counter; records the thread it ran on.
pub struct WordCounter {
    pub threads: Arc<Mutex<Vec<std::thread::ThreadId>>>,
}

#[async_trait]
impl Collaborator<TokenCountKind> for WordCounter {
    async fn load(&mut self, _config: &ModelConfig) -> Result<(), LoadError> {
        Ok(())
    }

    async fn run(
        &mut self,
        req: TokenCountRequest,
        _ctx: CancellationToken,
    ) -> Result<TokenCount, WorkError> {
        self.threads.lock().unwrap().push(std::thread::current().id());
        Ok(TokenCount {
            id: req.id,
            tokens: req.text.split_whitespace().count(),
        })
    }

    async fn unload(&mut self) {}
}
