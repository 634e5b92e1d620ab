//! # Diffusion image synthesis.
//!
//! Collaborators should check the token once per sampling step.

use std::sync::Arc;

use crate::error::WorkError;
use crate::events::{CorrelationId, EventCode, Payload, Signal};
use crate::worker::{QueueDiscipline, Worker, WorkerKind};

/// Latent-space downscale factor; image sides must be multiples of it.
pub const LATENT_FACTOR: u32 = 8;

/// A text-to-image request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub id: CorrelationId,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Number of sampling steps.
    pub steps: u32,
    /// Classifier-free guidance scale.
    pub guidance: f32,
    /// Fixed seed; `None` lets the collaborator pick one.
    pub seed: Option<u64>,
}

impl ImageRequest {
    /// 512x512, 30 steps, guidance 7.5, random seed.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            id: CorrelationId::new(),
            prompt: prompt.into(),
            negative_prompt: None,
            width: 512,
            height: 512,
            steps: 30,
            guidance: 7.5,
            seed: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A synthesised image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArtifact {
    pub id: CorrelationId,
    pub width: u32,
    pub height: u32,
    /// Seed actually used.
    pub seed: u64,
    /// Encoded image bytes (PNG unless the collaborator says otherwise).
    pub data: Arc<[u8]>,
}

/// Worker kind for image synthesis.
#[derive(Debug)]
pub struct ImageKind;

impl WorkerKind for ImageKind {
    type Request = ImageRequest;
    type Output = ImageArtifact;

    const NAME: &'static str = "image";
    const DISCIPLINE: QueueDiscipline = QueueDiscipline::Fifo;

    fn code(signal: Signal) -> EventCode {
        EventCode::Image(signal)
    }

    fn request(payload: &Payload) -> Option<ImageRequest> {
        match payload {
            Payload::Image(r) => Some(r.clone()),
            _ => None,
        }
    }

    fn correlation_id(request: &ImageRequest) -> CorrelationId {
        request.id
    }

    fn completed(output: ImageArtifact) -> Payload {
        Payload::ImageReady(output)
    }

    fn validate(request: &ImageRequest) -> Result<(), WorkError> {
        if request.prompt.trim().is_empty() {
            return Err(WorkError::invalid("prompt is empty"));
        }
        if request.steps == 0 {
            return Err(WorkError::invalid("steps must be greater than zero"));
        }
        for (side, value) in [("width", request.width), ("height", request.height)] {
            if value == 0 || value % LATENT_FACTOR != 0 {
                return Err(WorkError::invalid(format!(
                    "{side} {value} is not a positive multiple of {LATENT_FACTOR}"
                )));
            }
        }
        Ok(())
    }
}

/// Image synthesis worker.
pub type ImageWorker = Worker<ImageKind>;
