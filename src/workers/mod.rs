//! Concrete worker families.
//!
//! Each module provides a [`WorkerKind`](crate::WorkerKind) marker, the request and
//! result types its collaborator consumes and produces, and a `…Worker` alias.
//!
//! | Module           | Worker name     | Codes                     | Default discipline |
//! |------------------|-----------------|---------------------------|--------------------|
//! | [`generation`]   | `generation`    | `EventCode::Generation`   | `Fifo`             |
//! | [`image`]        | `image`         | `EventCode::Image`        | `Fifo`             |
//! | [`mask_preview`] | `mask_preview`  | `EventCode::MaskPreview`  | `LatestOnly`       |
//! | [`synthesis`]    | `synthesis`     | `EventCode::Speech`       | `Fifo`             |
//! | [`recognition`]  | `recognition`   | `EventCode::Transcription`| `Fifo`             |
//! | [`indexing`]     | `indexing`      | `EventCode::Indexing`     | `Fifo`             |
//! | [`token_count`]  | `token_count`   | `EventCode::TokenCount`   | `Direct`           |

use crate::worker::WorkerKind;

pub mod generation;
pub mod image;
pub mod indexing;
pub mod mask_preview;
pub mod recognition;
pub mod synthesis;
pub mod token_count;

pub use generation::{GenerationKind, GenerationWorker};
pub use image::{ImageKind, ImageWorker};
pub use indexing::{IndexingKind, IndexingWorker};
pub use mask_preview::{MaskPreviewKind, MaskPreviewWorker};
pub use recognition::{RecognitionKind, RecognitionWorker};
pub use synthesis::{SynthesisKind, SynthesisWorker};
pub use token_count::{TokenCountKind, TokenCountWorker};

/// Names of every worker family, as accepted by configuration and `Payload::Target`.
pub const NAMES: [&str; 7] = [
    generation::GenerationKind::NAME,
    image::ImageKind::NAME,
    mask_preview::MaskPreviewKind::NAME,
    synthesis::SynthesisKind::NAME,
    recognition::RecognitionKind::NAME,
    indexing::IndexingKind::NAME,
    token_count::TokenCountKind::NAME,
];
