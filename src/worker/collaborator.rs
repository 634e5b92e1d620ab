//! # Worker kinds and collaborators.
//!
//! A worker is split in two halves:
//!
//! - [`WorkerKind`]: a zero-sized marker describing one family. It names the worker,
//!   maps [`Signal`]s to its [`EventCode`]s, extracts requests from payloads and
//!   wraps results back into payloads.
//! - [`Collaborator`]: the engine doing the heavy lifting (model runtime, audio
//!   backend, indexer). It is owned by exactly one worker and only ever called from
//!   that worker's thread, so it takes `&mut self`.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use workbus::{Collaborator, LoadError, ModelConfig, WorkError};
//! use workbus::workers::token_count::{TokenCount, TokenCountKind, TokenCountRequest};
//!
//! struct Whitespace;
//!
//! #[async_trait]
//! impl Collaborator<TokenCountKind> for Whitespace {
//!     async fn load(&mut self, _cfg: &ModelConfig) -> Result<(), LoadError> {
//!         Ok(())
//!     }
//!
//!     async fn run(
//!         &mut self,
//!         req: TokenCountRequest,
//!         _ctx: CancellationToken,
//!     ) -> Result<TokenCount, WorkError> {
//!         Ok(TokenCount { id: req.id, tokens: req.text.split_whitespace().count() })
//!     }
//!
//!     async fn unload(&mut self) {}
//! }
//! ```

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::discipline::QueueDiscipline;
use crate::error::{LoadError, WorkError};
use crate::events::{CorrelationId, EventCode, ModelConfig, Payload, Signal};

/// Static description of a worker family.
pub trait WorkerKind: Send + Sync + 'static {
    /// Request handed to the collaborator.
    type Request: Clone + Send + 'static;
    /// Successful result of one unit.
    type Output: Send + 'static;

    /// Stable worker name; used in logs, thread names, config and `Payload::Target`.
    const NAME: &'static str;
    /// Discipline used unless the config overrides it.
    const DISCIPLINE: QueueDiscipline;

    /// Event code of this family for `signal`.
    fn code(signal: Signal) -> EventCode;

    /// Extracts a request from a `*Requested` payload.
    fn request(payload: &Payload) -> Option<Self::Request>;

    /// Correlation id carried by `request`.
    fn correlation_id(request: &Self::Request) -> CorrelationId;

    /// Wraps a result into the `*Completed` payload.
    fn completed(output: Self::Output) -> Payload;

    /// Rejects malformed requests before they reach the collaborator.
    fn validate(_request: &Self::Request) -> Result<(), WorkError> {
        Ok(())
    }
}

/// # The engine behind a worker.
///
/// Every method runs on the owning worker's thread (or inline for `Direct`
/// workers); calls never overlap.
#[async_trait]
pub trait Collaborator<K: WorkerKind>: Send + 'static {
    /// Loads a model. The worker unloads the previous model first.
    async fn load(&mut self, config: &ModelConfig) -> Result<(), LoadError>;

    /// Runs one unit of work.
    ///
    /// Implementations should poll `ctx` and return [`WorkError::Canceled`] soon
    /// after it fires; an interrupt does not abort the future.
    async fn run(&mut self, request: K::Request, ctx: CancellationToken)
    -> Result<K::Output, WorkError>;

    /// Releases the loaded model.
    async fn unload(&mut self);
}
