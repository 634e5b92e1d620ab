//! # Speech-to-text recognition.
//!
//! Results travel on the `EventCode::Transcription` family. Collaborators
//! should check the token between audio windows.

use std::sync::Arc;
use std::time::Duration;

use crate::error::WorkError;
use crate::events::{CorrelationId, EventCode, Payload, Signal};
use crate::worker::{QueueDiscipline, Worker, WorkerKind};

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionRequest {
    pub id: CorrelationId,
    /// Mono PCM samples in `[-1.0, 1.0]`.
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
    /// ISO 639-1 hint; `None` asks the collaborator to detect it.
    pub language: Option<String>,
}

impl TranscriptionRequest {
    pub fn new(samples: Arc<[f32]>, sample_rate: u32) -> Self {
        Self {
            id: CorrelationId::new(),
            samples,
            sample_rate,
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// A timed piece of the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub id: CorrelationId,
    pub text: String,
    /// Detected or hinted language.
    pub language: Option<String>,
    pub segments: Vec<Segment>,
}

#[derive(Debug)]
pub struct RecognitionKind;

impl WorkerKind for RecognitionKind {
    type Request = TranscriptionRequest;
    type Output = Transcript;

    const NAME: &'static str = "recognition";
    const DISCIPLINE: QueueDiscipline = QueueDiscipline::Fifo;

    fn code(signal: Signal) -> EventCode {
        EventCode::Transcription(signal)
    }

    fn request(payload: &Payload) -> Option<TranscriptionRequest> {
        match payload {
            Payload::Transcription(r) => Some(r.clone()),
            _ => None,
        }
    }

    fn correlation_id(request: &TranscriptionRequest) -> CorrelationId {
        request.id
    }

    fn completed(output: Transcript) -> Payload {
        Payload::Transcribed(output)
    }

    fn validate(request: &TranscriptionRequest) -> Result<(), WorkError> {
        if request.samples.is_empty() {
            return Err(WorkError::invalid("audio is empty"));
        }
        if request.sample_rate == 0 {
            return Err(WorkError::invalid("sample rate must be greater than zero"));
        }
        Ok(())
    }
}

/// Speech recognition worker.
pub type RecognitionWorker = Worker<RecognitionKind>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let audio: Arc<[f32]> = Arc::from(vec![0.1f32; 160]);
        assert!(RecognitionKind::validate(&TranscriptionRequest::new(audio.clone(), 16_000)).is_ok());
        assert!(RecognitionKind::validate(&TranscriptionRequest::new(audio, 0)).is_err());
        assert_eq!(
            RecognitionKind::validate(&TranscriptionRequest::new(Arc::from(Vec::new()), 16_000)),
            Err(WorkError::invalid("audio is empty"))
        );
    }
}
