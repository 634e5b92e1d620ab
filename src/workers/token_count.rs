//! # Prompt token counting.
//!
//! Counting is a tokenizer lookup that answers in microseconds, so the worker is
//! `Direct`: the result event is dispatched before the emitting `emit` returns,
//! on the emitting thread. Collaborators must not rely on a tokio runtime.

use crate::events::{CorrelationId, EventCode, Payload, Signal};
use crate::worker::{QueueDiscipline, Worker, WorkerKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCountRequest {
    pub id: CorrelationId,
    pub text: String,
}

impl TokenCountRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: CorrelationId::new(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCount {
    pub id: CorrelationId,
    pub tokens: usize,
}

#[derive(Debug)]
pub struct TokenCountKind;

impl WorkerKind for TokenCountKind {
    type Request = TokenCountRequest;
    type Output = TokenCount;

    const NAME: &'static str = "token_count";
    const DISCIPLINE: QueueDiscipline = QueueDiscipline::Direct;

    fn code(signal: Signal) -> EventCode {
        EventCode::TokenCount(signal)
    }

    fn request(payload: &Payload) -> Option<TokenCountRequest> {
        match payload {
            Payload::TokenCount(r) => Some(r.clone()),
            _ => None,
        }
    }

    fn correlation_id(request: &TokenCountRequest) -> CorrelationId {
        request.id
    }

    fn completed(output: TokenCount) -> Payload {
        Payload::TokensCounted(output)
    }
}

/// Token counting worker.
pub type TokenCountWorker = Worker<TokenCountKind>;
