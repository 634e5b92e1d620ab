//! # Typed payloads carried by events.
//!
//! Each [`EventCode`](super::EventCode) has one expected payload shape. Rather than
//! a string-keyed map, the shapes are variants of [`Payload`], so producers and
//! consumers agree at compile time.
//!
//! | Code                      | Payload                     |
//! |---------------------------|-----------------------------|
//! | `*(LoadRequested)`        | [`Payload::Load`]           |
//! | `*(Loaded)`               | [`Payload::Loaded`]         |
//! | `*(LoadFailed)`           | [`Payload::LoadFailed`]     |
//! | `*(Unloaded)`             | [`Payload::Worker`]         |
//! | `*(Requested)`            | family request variant      |
//! | `*(Completed)`            | family result variant       |
//! | `*(Failed)`               | [`Payload::Failed`]         |
//! | `*(Cancelled)`            | [`Payload::Cancelled`]      |
//! | `InterruptRequested`      | `None` or [`Payload::Target`] |
//! | `GraceExceeded`           | [`Payload::Stuck`]          |
//! | `HandlerPanicked`         | [`Payload::Panicked`]       |

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::workers::generation::{GeneratedText, GenerationRequest};
use crate::workers::image::{ImageArtifact, ImageRequest};
use crate::workers::indexing::{IndexRequest, IndexSummary};
use crate::workers::mask_preview::{MaskArtifact, MaskRequest};
use crate::workers::recognition::{Transcript, TranscriptionRequest};
use crate::workers::synthesis::{AudioClip, SpeechRequest};
use crate::workers::token_count::{TokenCount, TokenCountRequest};

/// Identifier matching a work request to its result event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What to load into a collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Logical model name, echoed in `Loaded`/`LoadFailed`.
    pub model: Arc<str>,
    /// Location of the weights.
    pub path: PathBuf,
    /// Free-form collaborator options (device, precision, ...).
    pub options: Vec<(String, String)>,
}

impl ModelConfig {
    /// Creates a config with no extra options.
    pub fn new(model: impl Into<Arc<str>>, path: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            path: path.into(),
            options: Vec::new(),
        }
    }

    /// Adds a collaborator option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /// Looks up a collaborator option.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A model became available on a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Worker name.
    pub worker: &'static str,
    /// Loaded model name.
    pub model: Arc<str>,
}

/// A model failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// Worker name.
    pub worker: &'static str,
    /// Model that was requested.
    pub model: Arc<str>,
    /// Stable error label.
    pub label: &'static str,
    /// Human-readable reason.
    pub reason: Arc<str>,
}

/// A unit of work failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkFailure {
    /// Correlation id of the failed request.
    pub id: CorrelationId,
    /// Worker name.
    pub worker: &'static str,
    /// Stable error label (see [`WorkError::as_label`](crate::WorkError::as_label)).
    pub label: &'static str,
    /// Human-readable reason.
    pub reason: Arc<str>,
}

/// A unit of work stopped early after observing cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancellation {
    /// Correlation id of the cancelled request.
    pub id: CorrelationId,
    /// Worker name.
    pub worker: &'static str,
}

/// A handler panicked during fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerPanic {
    /// Code being dispatched when the panic happened.
    pub code: super::EventCode,
    /// Handler receiver type name.
    pub handler: &'static str,
    /// Panic payload rendered as text.
    pub info: Arc<str>,
}

/// Payload carried by an [`Event`](super::Event).
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// No payload.
    #[default]
    None,
    /// Names a single worker (targeted interrupt).
    Target(Arc<str>),
    /// Names the worker that emitted the event.
    Worker(&'static str),
    /// Workers that did not stop within the grace period.
    Stuck(Vec<String>),
    /// Handler panic details.
    Panicked(HandlerPanic),

    // === Model lifecycle ===
    /// Model to load.
    Load(ModelConfig),
    /// Model loaded.
    Loaded(ModelInfo),
    /// Model failed to load.
    LoadFailed(LoadFailure),

    // === Work results shared by every family ===
    /// Unit of work failed.
    Failed(WorkFailure),
    /// Unit of work cancelled.
    Cancelled(Cancellation),

    // === Family requests and results ===
    /// Text generation request.
    Generation(GenerationRequest),
    /// Generated text.
    Generated(GeneratedText),
    /// Image synthesis request.
    Image(ImageRequest),
    /// Synthesised image.
    ImageReady(ImageArtifact),
    /// Mask preview request.
    MaskPreview(MaskRequest),
    /// Preview mask.
    MaskReady(MaskArtifact),
    /// Speech synthesis request.
    Speech(SpeechRequest),
    /// Synthesised audio.
    SpeechReady(AudioClip),
    /// Transcription request.
    Transcription(TranscriptionRequest),
    /// Recognised text.
    Transcribed(Transcript),
    /// Indexing request.
    Indexing(IndexRequest),
    /// Index build summary.
    Indexed(IndexSummary),
    /// Token count request.
    TokenCount(TokenCountRequest),
    /// Token count result.
    TokensCounted(TokenCount),
}

impl Payload {
    /// Returns the correlation id for request, result, failure and cancellation payloads.
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        match self {
            Payload::Failed(f) => Some(f.id),
            Payload::Cancelled(c) => Some(c.id),
            Payload::Generation(r) => Some(r.id),
            Payload::Generated(r) => Some(r.id),
            Payload::Image(r) => Some(r.id),
            Payload::ImageReady(r) => Some(r.id),
            Payload::MaskPreview(r) => Some(r.id),
            Payload::MaskReady(r) => Some(r.id),
            Payload::Speech(r) => Some(r.id),
            Payload::SpeechReady(r) => Some(r.id),
            Payload::Transcription(r) => Some(r.id),
            Payload::Transcribed(r) => Some(r.id),
            Payload::Indexing(r) => Some(r.id),
            Payload::Indexed(r) => Some(r.id),
            Payload::TokenCount(r) => Some(r.id),
            Payload::TokensCounted(r) => Some(r.id),
            _ => None,
        }
    }

    /// True if the payload is [`Payload::None`].
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Payload::None)
    }
}
