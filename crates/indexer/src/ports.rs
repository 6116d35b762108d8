//! Ports consumed by the queue controller. The store implements
//! `IndexerBackend`; presentation layers implement `Notifier`. Consumers
//! hold `Arc<dyn _>` so the controller exists exactly once and everything
//! else references it.

use async_trait::async_trait;
use core_types::{IndexationResult, ItemId, Severity, SharedDocument};
use thiserror::Error;

/// Transport-level backend failures. An `IndexationResult` with
/// `success: false` is NOT an error: the call settled, the work failed.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("item {0} not found")]
    NotFound(ItemId),
    #[error("no documents to index in folder {0}")]
    EmptyFolder(ItemId),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// The single asynchronous indexation capability the controller drives.
#[async_trait]
pub trait IndexerBackend: Send + Sync {
    /// Index one document. Latent and independently fallible.
    async fn index_document(&self, id: &ItemId) -> Result<IndexationResult, BackendError>;

    /// Collect a folder's non-indexed documents for fan-out, sorted by id.
    /// Fails with [`BackendError::EmptyFolder`] when there is nothing to do.
    async fn index_folder(&self, folder_id: &ItemId) -> Result<Vec<SharedDocument>, BackendError>;
}

/// Fire-and-forget user-facing message surface. No return value consumed.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}
