//! # Text-to-speech synthesis.
//!
//! Results travel on the `EventCode::Speech` family.

use std::sync::Arc;
use std::time::Duration;

use crate::error::WorkError;
use crate::events::{CorrelationId, EventCode, Payload, Signal};
use crate::worker::{QueueDiscipline, Worker, WorkerKind};

/// Text to speak.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub id: CorrelationId,
    pub text: String,
    /// Voice identifier understood by the collaborator.
    pub voice: Option<String>,
    /// Playback rate multiplier, `1.0` is normal speed.
    pub speed: f32,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: CorrelationId::new(),
            text: text.into(),
            voice: None,
            speed: 1.0,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Mono PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub id: CorrelationId,
    pub sample_rate: u32,
    pub samples: Arc<[f32]>,
}

impl AudioClip {
    /// Playback length.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}

#[derive(Debug)]
pub struct SynthesisKind;

impl WorkerKind for SynthesisKind {
    type Request = SpeechRequest;
    type Output = AudioClip;

    const NAME: &'static str = "synthesis";
    const DISCIPLINE: QueueDiscipline = QueueDiscipline::Fifo;

    fn code(signal: Signal) -> EventCode {
        EventCode::Speech(signal)
    }

    fn request(payload: &Payload) -> Option<SpeechRequest> {
        match payload {
            Payload::Speech(r) => Some(r.clone()),
            _ => None,
        }
    }

    fn correlation_id(request: &SpeechRequest) -> CorrelationId {
        request.id
    }

    fn completed(output: AudioClip) -> Payload {
        Payload::SpeechReady(output)
    }

    fn validate(request: &SpeechRequest) -> Result<(), WorkError> {
        if request.text.trim().is_empty() {
            return Err(WorkError::invalid("text is empty"));
        }
        if !(request.speed > 0.0 && request.speed <= 4.0) {
            return Err(WorkError::invalid(format!(
                "speed {} out of range (0, 4]",
                request.speed
            )));
        }
        Ok(())
    }
}

/// Speech synthesis worker.
pub type SynthesisWorker = Worker<SynthesisKind>;
