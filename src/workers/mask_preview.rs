//! # Interactive mask preview.
//!
//! Previews are requested on every pointer move while the user paints or clicks
//! on an image. Only the freshest request is worth computing, so the default
//! discipline is `LatestOnly`: a waiting request is silently replaced by a newer one.

use std::sync::Arc;

use crate::error::WorkError;
use crate::events::{CorrelationId, EventCode, Payload, Signal};
use crate::worker::{QueueDiscipline, Worker, WorkerKind};

/// A labelled prompt point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptPoint {
    pub x: u32,
    pub y: u32,
    /// `true` marks foreground, `false` background.
    pub foreground: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaskRequest {
    pub id: CorrelationId,
    /// Source image the points refer to.
    pub image: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    pub points: Vec<PromptPoint>,
}

impl MaskRequest {
    pub fn new(image: Arc<[u8]>, width: u32, height: u32) -> Self {
        Self {
            id: CorrelationId::new(),
            image,
            width,
            height,
            points: Vec::new(),
        }
    }

    pub fn with_point(mut self, x: u32, y: u32, foreground: bool) -> Self {
        self.points.push(PromptPoint { x, y, foreground });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaskArtifact {
    pub id: CorrelationId,
    pub width: u32,
    pub height: u32,
    /// One byte per pixel, `0` or `255`.
    pub mask: Arc<[u8]>,
}

#[derive(Debug)]
pub struct MaskPreviewKind;

impl WorkerKind for MaskPreviewKind {
    type Request = MaskRequest;
    type Output = MaskArtifact;

    const NAME: &'static str = "mask_preview";
    const DISCIPLINE: QueueDiscipline = QueueDiscipline::LatestOnly;

    fn code(signal: Signal) -> EventCode {
        EventCode::MaskPreview(signal)
    }

    fn request(payload: &Payload) -> Option<MaskRequest> {
        match payload {
            Payload::MaskPreview(r) => Some(r.clone()),
            _ => None,
        }
    }

    fn correlation_id(request: &MaskRequest) -> CorrelationId {
        request.id
    }

    fn completed(output: MaskArtifact) -> Payload {
        Payload::MaskReady(output)
    }

    fn validate(request: &MaskRequest) -> Result<(), WorkError> {
        if request.width == 0 || request.height == 0 {
            return Err(WorkError::invalid("image has no pixels"));
        }
        if request.points.is_empty() {
            return Err(WorkError::invalid("no prompt points"));
        }
        if let Some(p) = request
            .points
            .iter()
            .find(|p| p.x >= request.width || p.y >= request.height)
        {
            return Err(WorkError::invalid(format!(
                "point ({}, {}) outside {}x{}",
                p.x, p.y, request.width, request.height
            )));
        }
        Ok(())
    }
}

/// Mask preview worker.
pub type MaskPreviewWorker = Worker<MaskPreviewKind>;

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> Arc<[u8]> {
        Arc::from(vec![0u8; 16])
    }

    #[test]
    fn test_validate_points() {
        let ok = MaskRequest::new(blank(), 4, 4).with_point(3, 3, true);
        assert!(MaskPreviewKind::validate(&ok).is_ok());

        let none = MaskRequest::new(blank(), 4, 4);
        assert_eq!(
            MaskPreviewKind::validate(&none),
            Err(WorkError::invalid("no prompt points"))
        );

        let outside = MaskRequest::new(blank(), 4, 4).with_point(4, 0, false);
        assert!(MaskPreviewKind::validate(&outside).is_err());
    }
}
