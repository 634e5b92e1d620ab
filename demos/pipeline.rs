//! End-to-end walk through the bus with simulated collaborators.
//!
//! ```text
//! RUST_LOG=workbus=debug cargo run --example pipeline
//! ```
//!
//! - a slow generator streaming "tokens" (FIFO, interrupted halfway through the second prompt)
//! - a mask previewer flooded with requests (latest-only)
//! - a whitespace token counter (direct)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use workbus::workers::generation::{FinishReason, GeneratedText, GenerationKind, GenerationRequest};
use workbus::workers::mask_preview::{MaskArtifact, MaskPreviewKind, MaskRequest};
use workbus::workers::token_count::{TokenCount, TokenCountKind, TokenCountRequest};
use workbus::{
    Collaborator, Config, Event, EventCode, HandlerRef, LoadError, ModelConfig, Payload, Signal,
    WorkError, WorkerSupervisor,
};

struct SlowWriter {
    step: Duration,
}

#[async_trait]
impl Collaborator<GenerationKind> for SlowWriter {
    async fn load(&mut self, config: &ModelConfig) -> Result<(), LoadError> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        info!(model = %config.model, "weights mapped");
        Ok(())
    }

    async fn run(
        &mut self,
        req: GenerationRequest,
        ctx: CancellationToken,
    ) -> Result<GeneratedText, WorkError> {
        let mut text = String::new();
        let words: Vec<&str> = req.prompt.split_whitespace().collect();
        for (n, word) in words.iter().cycle().take(req.max_tokens as usize).enumerate() {
            if ctx.is_cancelled() {
                return Err(WorkError::Canceled);
            }
            tokio::time::sleep(self.step).await;
            text.push_str(word);
            text.push(' ');
            if n + 1 == words.len() * 2 {
                return Ok(GeneratedText {
                    id: req.id,
                    text,
                    tokens: (n + 1) as u32,
                    finish: FinishReason::EndOfText,
                });
            }
        }
        Ok(GeneratedText {
            id: req.id,
            text,
            tokens: req.max_tokens,
            finish: FinishReason::Length,
        })
    }

    async fn unload(&mut self) {}
}

struct Thresholder;

#[async_trait]
impl Collaborator<MaskPreviewKind> for Thresholder {
    async fn load(&mut self, _config: &ModelConfig) -> Result<(), LoadError> {
        Ok(())
    }

    async fn run(
        &mut self,
        req: MaskRequest,
        _ctx: CancellationToken,
    ) -> Result<MaskArtifact, WorkError> {
        tokio::time::sleep(Duration::from_millis(40)).await;
        let mask: Vec<u8> = req.image.iter().map(|&p| if p > 127 { 255 } else { 0 }).collect();
        Ok(MaskArtifact {
            id: req.id,
            width: req.width,
            height: req.height,
            mask: mask.into(),
        })
    }

    async fn unload(&mut self) {}
}

struct Whitespace;

#[async_trait]
impl Collaborator<TokenCountKind> for Whitespace {
    async fn load(&mut self, _config: &ModelConfig) -> Result<(), LoadError> {
        Ok(())
    }

    async fn run(
        &mut self,
        req: TokenCountRequest,
        _ctx: CancellationToken,
    ) -> Result<TokenCount, WorkError> {
        Ok(TokenCount {
            id: req.id,
            tokens: req.text.split_whitespace().count(),
        })
    }

    async fn unload(&mut self) {}
}

struct Console;

impl Console {
    fn on_result(&self, ev: &Event) {
        match ev.payload() {
            Payload::Generated(out) => println!("[{}] {:?} ({} tokens)", ev.code, out.text.trim(), out.tokens),
            Payload::MaskReady(mask) => println!("[{}] mask {}x{} for {}", ev.code, mask.width, mask.height, mask.id),
            Payload::TokensCounted(count) => println!("[{}] {} tokens", ev.code, count.tokens),
            Payload::Cancelled(c) => println!("[{}] {} stopped early", ev.code, c.id),
            Payload::Failed(f) => println!("[{}] {}: {}", ev.code, f.label, f.reason),
            Payload::Loaded(m) => println!("[{}] {} ready", ev.code, m.model),
            other => println!("[{}] {other:?}", ev.code),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut cfg = Config::default();
    cfg.grace = Duration::from_secs(2);

    let sup = WorkerSupervisor::builder(cfg)
        .with_generation(Box::new(SlowWriter {
            step: Duration::from_millis(30),
        }))
        .with_mask_preview(Box::new(Thresholder))
        .with_token_count(Box::new(Whitespace))
        .build();
    sup.initialize()?;

    let bus = sup.mediator();
    let console = Arc::new(Console);
    for code in [
        EventCode::Generation(Signal::Loaded),
        EventCode::Generation(Signal::Completed),
        EventCode::Generation(Signal::Cancelled),
        EventCode::Generation(Signal::Failed),
        EventCode::MaskPreview(Signal::Completed),
        EventCode::TokenCount(Signal::Completed),
    ] {
        bus.register(code, HandlerRef::bind(&console, Console::on_result));
    }

    let model = ModelConfig::new("demo-7b", "/models/demo-7b.gguf").with_option("device", "cpu");
    bus.emit(EventCode::Generation(Signal::LoadRequested), Payload::Load(model.clone()));
    bus.emit(EventCode::MaskPreview(Signal::LoadRequested), Payload::Load(model.clone()));
    bus.emit(EventCode::TokenCount(Signal::LoadRequested), Payload::Load(model));

    let prompt = "the quick brown fox";
    bus.emit(
        EventCode::TokenCount(Signal::Requested),
        Payload::TokenCount(TokenCountRequest::new(prompt)),
    );
    bus.emit(
        EventCode::Generation(Signal::Requested),
        Payload::Generation(GenerationRequest::new(prompt)),
    );
    bus.emit(
        EventCode::Generation(Signal::Requested),
        Payload::Generation(GenerationRequest::new("jumps over the lazy dog").with_max_tokens(64)),
    );
    bus.emit(
        EventCode::Generation(Signal::Requested),
        Payload::Generation(GenerationRequest::new("")),
    );

    let image: Arc<[u8]> = (0..=255u8).collect::<Vec<_>>().into();
    for x in 0..10 {
        bus.emit(
            EventCode::MaskPreview(Signal::Requested),
            Payload::MaskPreview(MaskRequest::new(Arc::clone(&image), 16, 16).with_point(x, x, true)),
        );
    }

    // Let the first prompt finish, then interrupt the second one mid-stream.
    std::thread::sleep(Duration::from_millis(450));
    bus.emit(EventCode::InterruptRequested, Payload::Target("generation".into()));
    std::thread::sleep(Duration::from_millis(300));

    for (name, state) in sup.states() {
        info!(worker = name, %state, "before shutdown");
    }
    sup.shutdown()?;
    Ok(())
}
