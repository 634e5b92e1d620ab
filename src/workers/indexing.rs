//! # Document indexing for retrieval.
//!
//! Collaborators chunk and embed each document; they should check the token
//! between documents.

use std::path::PathBuf;

use crate::error::WorkError;
use crate::events::{CorrelationId, EventCode, Payload, Signal};
use crate::worker::{QueueDiscipline, Worker, WorkerKind};

/// Documents to add to a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRequest {
    pub id: CorrelationId,
    pub collection: String,
    pub documents: Vec<PathBuf>,
}

impl IndexRequest {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            id: CorrelationId::new(),
            collection: collection.into(),
            documents: Vec::new(),
        }
    }

    pub fn with_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.documents.push(path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub id: CorrelationId,
    pub collection: String,
    pub documents: usize,
    pub chunks: usize,
}

#[derive(Debug)]
pub struct IndexingKind;

impl WorkerKind for IndexingKind {
    type Request = IndexRequest;
    type Output = IndexSummary;

    const NAME: &'static str = "indexing";
    const DISCIPLINE: QueueDiscipline = QueueDiscipline::Fifo;

    fn code(signal: Signal) -> EventCode {
        EventCode::Indexing(signal)
    }

    fn request(payload: &Payload) -> Option<IndexRequest> {
        match payload {
            Payload::Indexing(r) => Some(r.clone()),
            _ => None,
        }
    }

    fn correlation_id(request: &IndexRequest) -> CorrelationId {
        request.id
    }

    fn completed(output: IndexSummary) -> Payload {
        Payload::Indexed(output)
    }

    fn validate(request: &IndexRequest) -> Result<(), WorkError> {
        if request.collection.trim().is_empty() {
            return Err(WorkError::invalid("collection name is empty"));
        }
        if request.documents.is_empty() {
            return Err(WorkError::invalid("no documents"));
        }
        Ok(())
    }
}

/// Document indexing worker.
pub type IndexingWorker = Worker<IndexingKind>;
