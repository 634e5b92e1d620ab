//! # Language-model text generation.
//!
//! The generation worker drives a decoder (llama.cpp, candle, a remote endpoint)
//! one request at a time. Chat turns are never dropped, so the default discipline
//! is `Fifo`.
//!
//! ## Codes
//! ```text
//! Generation(Requested)  Payload::Generation(GenerationRequest)  → enqueue
//! Generation(Completed)  Payload::Generated(GeneratedText)
//! Generation(Failed)     Payload::Failed(WorkFailure)
//! Generation(Cancelled)  Payload::Cancelled(Cancellation)
//! ```
//!
//! ## Cancellation
//! Collaborators should check the token once per decoded token and return
//! [`WorkError::Canceled`]; the partial text is discarded.

use crate::error::WorkError;
use crate::events::{CorrelationId, EventCode, Payload, Signal};
use crate::worker::{QueueDiscipline, Worker, WorkerKind};

/// A prompt to complete.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Correlates the result with this request.
    pub id: CorrelationId,
    /// Full prompt, chat template already applied.
    pub prompt: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature; `0.0` means greedy.
    pub temperature: f32,
    /// Sequences that end generation early.
    pub stop: Vec<String>,
}

impl GenerationRequest {
    /// Creates a request with a fresh id, 256 max tokens and temperature 0.7.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            id: CorrelationId::new(),
            prompt: prompt.into(),
            max_tokens: 256,
            temperature: 0.7,
            stop: Vec::new(),
        }
    }

    /// Sets the token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Adds a stop sequence.
    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }
}

/// Why generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The model emitted its end-of-text token.
    EndOfText,
    /// A stop sequence matched.
    Stop,
    /// `max_tokens` was reached.
    Length,
}

/// Completed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedText {
    /// Id of the originating request.
    pub id: CorrelationId,
    /// Generated continuation (without the prompt).
    pub text: String,
    /// Number of generated tokens.
    pub tokens: u32,
    /// Why generation ended.
    pub finish: FinishReason,
}

/// Worker kind for text generation.
#[derive(Debug)]
pub struct GenerationKind;

impl WorkerKind for GenerationKind {
    type Request = GenerationRequest;
    type Output = GeneratedText;

    const NAME: &'static str = "generation";
    const DISCIPLINE: QueueDiscipline = QueueDiscipline::Fifo;

    fn code(signal: Signal) -> EventCode {
        EventCode::Generation(signal)
    }

    fn request(payload: &Payload) -> Option<GenerationRequest> {
        match payload {
            Payload::Generation(r) => Some(r.clone()),
            _ => None,
        }
    }

    fn correlation_id(request: &GenerationRequest) -> CorrelationId {
        request.id
    }

    fn completed(output: GeneratedText) -> Payload {
        Payload::Generated(output)
    }

    /// Rejects:
    /// - blank prompts
    /// - a zero token budget
    /// - negative or non-finite temperatures
    fn validate(request: &GenerationRequest) -> Result<(), WorkError> {
        if request.prompt.trim().is_empty() {
            return Err(WorkError::invalid("prompt is empty"));
        }
        if request.max_tokens == 0 {
            return Err(WorkError::invalid("max_tokens must be greater than zero"));
        }
        if !request.temperature.is_finite() || request.temperature < 0.0 {
            return Err(WorkError::invalid(format!(
                "temperature {} out of range",
                request.temperature
            )));
        }
        Ok(())
    }
}

/// Text generation worker.
pub type GenerationWorker = Worker<GenerationKind>;
