use std::sync::Arc;

use super::supervisor::{Collaborators, WorkerSupervisor};
use crate::config::Config;
use crate::mediator::Mediator;
use crate::worker::Collaborator;
use crate::workers::{
    GenerationKind, ImageKind, IndexingKind, MaskPreviewKind, RecognitionKind, SynthesisKind,
    TokenCountKind,
};

/// Builder for a [`WorkerSupervisor`].
///
/// Every collaborator is optional: a worker whose collaborator was not provided is
/// never constructed and its accessor returns `None`.
pub struct WorkerSupervisorBuilder {
    cfg: Config,
    mediator: Option<Arc<Mediator>>,
    collaborators: Collaborators,
}

impl WorkerSupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            mediator: None,
            collaborators: Collaborators::default(),
        }
    }

    /// Shares an existing mediator instead of creating one.
    pub fn with_mediator(mut self, mediator: Arc<Mediator>) -> Self {
        self.mediator = Some(mediator);
        self
    }

    pub fn with_generation(mut self, c: Box<dyn Collaborator<GenerationKind>>) -> Self {
        self.collaborators.generation = Some(c);
        self
    }

    pub fn with_image(mut self, c: Box<dyn Collaborator<ImageKind>>) -> Self {
        self.collaborators.image = Some(c);
        self
    }

    pub fn with_mask_preview(mut self, c: Box<dyn Collaborator<MaskPreviewKind>>) -> Self {
        self.collaborators.mask_preview = Some(c);
        self
    }

    pub fn with_synthesis(mut self, c: Box<dyn Collaborator<SynthesisKind>>) -> Self {
        self.collaborators.synthesis = Some(c);
        self
    }

    pub fn with_recognition(mut self, c: Box<dyn Collaborator<RecognitionKind>>) -> Self {
        self.collaborators.recognition = Some(c);
        self
    }

    pub fn with_indexing(mut self, c: Box<dyn Collaborator<IndexingKind>>) -> Self {
        self.collaborators.indexing = Some(c);
        self
    }

    pub fn with_token_count(mut self, c: Box<dyn Collaborator<TokenCountKind>>) -> Self {
        self.collaborators.token_count = Some(c);
        self
    }

    /// Builds the supervisor. No worker exists until [`WorkerSupervisor::initialize`].
    pub fn build(self) -> Arc<WorkerSupervisor> {
        let mediator = self
            .mediator
            .unwrap_or_else(|| Arc::new(Mediator::new(self.cfg.tap_capacity_clamped())));
        Arc::new(WorkerSupervisor::new_internal(
            self.cfg,
            mediator,
            self.collaborators,
        ))
    }
}
