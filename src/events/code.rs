//! # Event codes: the closed vocabulary of the bus.
//!
//! [`EventCode`] is a process-wide, totally ordered enumeration. Codes are
//! stable for the lifetime of the process and never reused for another meaning.
//!
//! Codes fall in two groups:
//! - **Runtime codes**: shared by every worker (`InterruptRequested`,
//!   `ShutdownRequested`) or published by the supervisor/mediator
//!   (`AllStoppedWithin`, `GraceExceeded`, `HandlerPanicked`).
//! - **Worker codes**: one variant per worker family, qualified by a [`Signal`].
//!
//! ```text
//! EventCode::Generation(Signal::Requested)   "generation_requested"
//! EventCode::Generation(Signal::Completed)   "generation_completed"
//! EventCode::MaskPreview(Signal::LoadFailed) "mask_preview_load_failed"
//! ```

use std::fmt;

/// Lifecycle signal within one worker family.
///
/// Request signals (`*Requested`) are consumed by the worker;
/// the others are emitted by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Signal {
    /// Load a model into the collaborator. Payload: `Payload::Load`.
    LoadRequested,
    /// A model was loaded. Payload: `Payload::Loaded`.
    Loaded,
    /// Loading failed; the worker has no model. Payload: `Payload::LoadFailed`.
    LoadFailed,
    /// Release the loaded model. Payload: none.
    UnloadRequested,
    /// The model was released. Payload: `Payload::Worker`.
    Unloaded,
    /// Run one unit of work. Payload: the family's request variant.
    Requested,
    /// The unit finished. Payload: the family's result variant.
    Completed,
    /// The unit failed. Payload: `Payload::Failed`.
    Failed,
    /// The unit observed cancellation. Payload: `Payload::Cancelled`.
    Cancelled,
}

impl Signal {
    /// Every signal, in declaration order.
    pub const ALL: [Signal; 9] = [
        Signal::LoadRequested,
        Signal::Loaded,
        Signal::LoadFailed,
        Signal::UnloadRequested,
        Signal::Unloaded,
        Signal::Requested,
        Signal::Completed,
        Signal::Failed,
        Signal::Cancelled,
    ];

    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            Signal::LoadRequested => "load_requested",
            Signal::Loaded => "loaded",
            Signal::LoadFailed => "load_failed",
            Signal::UnloadRequested => "unload_requested",
            Signal::Unloaded => "unloaded",
            Signal::Requested => "requested",
            Signal::Completed => "completed",
            Signal::Failed => "failed",
            Signal::Cancelled => "cancelled",
        }
    }

    /// True for signals consumed by a worker rather than emitted by it.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Signal::LoadRequested | Signal::UnloadRequested | Signal::Requested
        )
    }
}

/// Identifier of a kind of occurrence on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventCode {
    // === Shared worker control ===
    /// Interrupt the unit of work currently running.
    ///
    /// Payload: `Payload::None` (every worker) or `Payload::Target(name)`.
    InterruptRequested,
    /// Stop accepting work; workers exit their loops.
    ShutdownRequested,

    // === Supervisor results ===
    /// Every worker stopped within the configured grace period.
    AllStoppedWithin,
    /// Grace period exceeded. Payload: `Payload::Stuck`.
    GraceExceeded,

    // === Mediator diagnostics ===
    /// A handler panicked during `emit`. Payload: `Payload::Panicked`.
    HandlerPanicked,

    // === Worker families ===
    /// Language-model text generation.
    Generation(Signal),
    /// Diffusion image synthesis.
    Image(Signal),
    /// Interactive mask preview.
    MaskPreview(Signal),
    /// Text-to-speech synthesis.
    Speech(Signal),
    /// Speech-to-text recognition.
    Transcription(Signal),
    /// Document indexing.
    Indexing(Signal),
    /// Prompt token counting.
    TokenCount(Signal),
}

impl EventCode {
    /// Returns the worker family prefix, if this is a worker code.
    pub fn family(&self) -> Option<&'static str> {
        match self {
            EventCode::Generation(_) => Some("generation"),
            EventCode::Image(_) => Some("image"),
            EventCode::MaskPreview(_) => Some("mask_preview"),
            EventCode::Speech(_) => Some("speech"),
            EventCode::Transcription(_) => Some("transcription"),
            EventCode::Indexing(_) => Some("indexing"),
            EventCode::TokenCount(_) => Some("token_count"),
            _ => None,
        }
    }

    /// Returns the [`Signal`] carried by a worker code.
    pub fn signal(&self) -> Option<Signal> {
        match *self {
            EventCode::Generation(s)
            | EventCode::Image(s)
            | EventCode::MaskPreview(s)
            | EventCode::Speech(s)
            | EventCode::Transcription(s)
            | EventCode::Indexing(s)
            | EventCode::TokenCount(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use workbus::{EventCode, Signal};
    ///
    /// assert_eq!(EventCode::Generation(Signal::Completed).as_label(), "generation_completed");
    /// assert_eq!(EventCode::InterruptRequested.as_label(), "interrupt_requested");
    /// ```
    pub fn as_label(&self) -> String {
        match (self.family(), self.signal()) {
            (Some(family), Some(signal)) => format!("{family}_{}", signal.as_label()),
            _ => match self {
                EventCode::InterruptRequested => "interrupt_requested",
                EventCode::ShutdownRequested => "shutdown_requested",
                EventCode::AllStoppedWithin => "all_stopped_within",
                EventCode::GraceExceeded => "grace_exceeded",
                EventCode::HandlerPanicked => "handler_panicked",
                _ => "unknown",
            }
            .to_string(),
        }
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_label())
    }
}
