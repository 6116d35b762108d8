//! A session owns one store and one queue controller. The controller state
//! machine exists exactly once; views and stores hold `Arc` clones of it
//! rather than re-implementing the protocol.
//!
//! Sessions are the registry's scope: indexing state never outlives the
//! session that created it, and `reset` gives tests and long-lived
//! processes a hard boundary instead of a process-global map.

use core_types::config::AppConfig;
use docstore::DocumentStore;
use indexer::{IndexationQueue, IndexingRegistry, Notifier};
use std::sync::Arc;

pub struct Session {
    store: Arc<DocumentStore>,
    queue: Arc<IndexationQueue>,
    notifier: Arc<dyn Notifier>,
}

impl Session {
    pub fn new(cfg: &AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self::build(
            Arc::new(DocumentStore::new(cfg.backend.clone())),
            notifier,
        )
    }

    /// Session over the seeded demo catalog.
    pub fn demo(cfg: &AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self::build(
            Arc::new(DocumentStore::with_sample_data(cfg.backend.clone())),
            notifier,
        )
    }

    fn build(store: Arc<DocumentStore>, notifier: Arc<dyn Notifier>) -> Self {
        let queue = IndexationQueue::new(store.clone(), notifier.clone());
        Session {
            store,
            queue,
            notifier,
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn queue(&self) -> &Arc<IndexationQueue> {
        &self.queue
    }

    pub fn registry(&self) -> Arc<IndexingRegistry> {
        self.queue.registry()
    }

    /// Drop all indexing state and rebuild the controller. Documents and
    /// folders survive; in-flight bookkeeping does not.
    pub fn reset(&mut self) {
        self.queue = IndexationQueue::new(self.store.clone(), self.notifier.clone());
    }
}
