//! The indexation queue controller.
//!
//! Serializes every indexation request into a single global in-flight job:
//! at most one document backend call is outstanding at any instant. Excess
//! document requests wait in a FIFO backlog; folder requests wait in a
//! second backlog that drains only once the document backlog is empty.
//! Settlement of each job (success, explicit failure, or backend error)
//! deletes the item's registry entry, pushes progress into the owning
//! folder's entry, and immediately pulls the next eligible backlog entry.
//!
//! Locking: `state` is a plain mutex never held across an await; the only
//! suspension points are the backend calls. Registry writes happen with the
//! queue lock held, so duplicate checks and enqueues are atomic with
//! respect to each other.

use crate::ports::{BackendError, IndexerBackend, Notifier};
use crate::registry::{IndexingRegistry, IndexingState};
use core_types::{ItemId, Severity, SharedDocument, SharedFolder, Timestamp};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;

/// What a request observably did. Rejections and queueing are ordinary
/// outcomes, not errors: nothing here ever propagates to the caller as
/// `Err`, and every branch also emits a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The backend call ran and succeeded; the document was mutated.
    Completed,
    /// The backend call settled with a failure result or errored.
    Failed,
    /// Appended to a backlog; a running drain will pick it up.
    Queued,
    /// Folder fan-out began; completion is signalled through the registry.
    Started,
    AlreadyIndexed,
    AlreadyIndexing,
    /// The folder had no documents left to index.
    EmptyFolder,
}

#[derive(Default)]
struct QueueState {
    /// True iff a document call is outstanding or a drain is mid-flight.
    busy: bool,
    /// Document whose backend call is outstanding. Folders never occupy
    /// this slot; indexing a folder means enqueuing its documents.
    active_id: Option<ItemId>,
    documents: VecDeque<SharedDocument>,
    folders: VecDeque<SharedFolder>,
}

enum NextJob {
    Document(SharedDocument),
    Folder(SharedFolder),
    Idle,
}

enum FanOut {
    /// A document was started; the calling chain continues with it.
    Continue(SharedDocument),
    /// Documents were enqueued behind an already-running chain.
    HandedOff,
    Empty,
    Failed,
}

/// The controller. Exists once per session; everything that needs it holds
/// an `Arc` clone.
pub struct IndexationQueue {
    backend: Arc<dyn IndexerBackend>,
    notifier: Arc<dyn Notifier>,
    registry: Arc<IndexingRegistry>,
    state: Mutex<QueueState>,
    busy_tx: watch::Sender<bool>,
}

impl IndexationQueue {
    pub fn new(backend: Arc<dyn IndexerBackend>, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        let (busy_tx, _) = watch::channel(false);
        Arc::new(IndexationQueue {
            backend,
            notifier,
            registry: Arc::new(IndexingRegistry::new()),
            state: Mutex::new(QueueState::default()),
            busy_tx,
        })
    }

    pub fn registry(&self) -> Arc<IndexingRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    pub fn active_id(&self) -> Option<ItemId> {
        self.state.lock().active_id.clone()
    }

    pub fn queued_documents(&self) -> usize {
        self.state.lock().documents.len()
    }

    pub fn queued_folders(&self) -> usize {
        self.state.lock().folders.len()
    }

    pub fn is_item_indexing(&self, id: &ItemId) -> bool {
        self.registry.is_indexing(id)
    }

    pub fn indexing_state(&self, id: &ItemId) -> Option<IndexingState> {
        self.registry.get(id)
    }

    /// Observe busy-flag transitions; the receiver currently holds `true`
    /// whenever any indexation work is in flight or backlogged.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy_tx.subscribe()
    }

    /// Resolve once both backlogs are empty and no job is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.busy_tx.subscribe();
        loop {
            if !*rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Request indexation of a single document.
    ///
    /// Branches, in strict order: already indexed → reject; already in
    /// flight → reject; controller busy → enqueue (idempotent by id);
    /// otherwise start immediately. When started, the call resolves with
    /// this document's own outcome; any backlog left behind drains on a
    /// detached task.
    pub async fn request_document_index(self: &Arc<Self>, doc: &SharedDocument) -> IndexOutcome {
        enum Decision {
            AlreadyIndexed,
            AlreadyIndexing,
            Queued { added: bool },
            Start,
        }

        let decision = {
            let mut st = self.state.lock();
            let (id, indexed) = {
                let d = doc.read();
                (d.id.clone(), d.indexed)
            };
            if indexed {
                Decision::AlreadyIndexed
            } else if self.registry.is_indexing(&id) {
                Decision::AlreadyIndexing
            } else if st.busy {
                let present = st.documents.iter().any(|q| q.read().id == id);
                if !present {
                    st.documents.push_back(Arc::clone(doc));
                }
                Decision::Queued { added: !present }
            } else {
                self.begin(&mut st, doc);
                Decision::Start
            }
        };

        match decision {
            Decision::AlreadyIndexed => {
                self.notifier
                    .notify("This document is already indexed", Severity::Info);
                IndexOutcome::AlreadyIndexed
            }
            Decision::AlreadyIndexing => {
                self.notifier
                    .notify("This document is already being indexed", Severity::Info);
                IndexOutcome::AlreadyIndexing
            }
            Decision::Queued { added } => {
                if added {
                    self.notifier
                        .notify("Document added to the indexation queue", Severity::Info);
                }
                IndexOutcome::Queued
            }
            Decision::Start => {
                let outcome = self.process_document(doc).await;
                if let Some(next) = self.settle_and_next(doc).await {
                    let this = Arc::clone(self);
                    tokio::spawn(async move { this.run_chain(next).await });
                }
                outcome
            }
        }
    }

    /// Request indexation of every non-indexed document in a folder.
    ///
    /// While the controller is busy the folder itself waits in the folder
    /// backlog; its fan-out happens only once the document backlog has
    /// drained. When idle, the fan-out runs now: fetch the document list,
    /// register the folder, enqueue the documents, start the first.
    pub async fn request_folder_index(self: &Arc<Self>, folder: &SharedFolder) -> IndexOutcome {
        enum Decision {
            AlreadyIndexing,
            Queued { added: bool },
            FanOut,
        }

        let decision = {
            let mut st = self.state.lock();
            let id = folder.read().id.clone();
            if self.registry.is_indexing(&id) {
                Decision::AlreadyIndexing
            } else if st.busy {
                let present = st.folders.iter().any(|q| q.read().id == id);
                if !present {
                    st.folders.push_back(Arc::clone(folder));
                }
                Decision::Queued { added: !present }
            } else {
                // Claim the busy slot for the duration of the fetch so
                // concurrent requests queue behind this fan-out.
                st.busy = true;
                self.busy_tx.send_replace(true);
                Decision::FanOut
            }
        };

        match decision {
            Decision::AlreadyIndexing => {
                self.notifier
                    .notify("This folder is already being indexed", Severity::Info);
                IndexOutcome::AlreadyIndexing
            }
            Decision::Queued { added } => {
                if added {
                    self.notifier
                        .notify("Folder added to the indexation queue", Severity::Info);
                }
                IndexOutcome::Queued
            }
            Decision::FanOut => match self.fan_out(folder).await {
                FanOut::Continue(first) => {
                    let this = Arc::clone(self);
                    tokio::spawn(async move { this.run_chain(first).await });
                    IndexOutcome::Started
                }
                FanOut::HandedOff => IndexOutcome::Started,
                FanOut::Empty => {
                    self.resume_or_go_idle().await;
                    IndexOutcome::EmptyFolder
                }
                FanOut::Failed => {
                    self.resume_or_go_idle().await;
                    IndexOutcome::Failed
                }
            },
        }
    }

    /// Bulk enqueue. Filters out documents already indexed, already
    /// backlogged, or currently in flight; appends survivors; starts the
    /// head when the controller is idle. Returns the number added.
    pub fn add_to_queue(self: &Arc<Self>, documents: &[SharedDocument]) -> usize {
        let (added, started) = {
            let mut st = self.state.lock();
            let mut added = 0;
            for doc in documents {
                let duplicate = {
                    let d = doc.read();
                    d.indexed
                        || self.registry.is_indexing(&d.id)
                        || st.documents.iter().any(|q| q.read().id == d.id)
                };
                if duplicate {
                    continue;
                }
                st.documents.push_back(Arc::clone(doc));
                added += 1;
            }

            let mut started = None;
            if added > 0 && !st.busy {
                if let Some(first) = st.documents.pop_front() {
                    self.begin(&mut st, &first);
                    started = Some(first);
                }
            }
            (added, started)
        };

        if added > 0 {
            self.notifier.notify(
                &format!("{added} document(s) added to the indexation queue"),
                Severity::Info,
            );
        }
        if let Some(first) = started {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.run_chain(first).await });
        }
        added
    }

    /// Mark a document as the active job. Caller holds the queue lock.
    fn begin(&self, st: &mut QueueState, doc: &SharedDocument) {
        let id = doc.read().id.clone();
        st.busy = true;
        st.active_id = Some(id.clone());
        self.registry.insert(id, IndexingState::document(now_ms()));
        self.busy_tx.send_replace(true);
    }

    /// Drive one backend call and apply its result to the document.
    async fn process_document(&self, doc: &SharedDocument) -> IndexOutcome {
        let id = doc.read().id.clone();
        match self.backend.index_document(&id).await {
            Ok(result) if result.success => {
                {
                    let mut d = doc.write();
                    d.indexed = true;
                    d.indexation_time = Some(result.execution_time);
                }
                tracing::info!(id = %id, seconds = result.execution_time, "document indexed");
                self.notifier
                    .notify("Document indexed successfully", Severity::Positive);
                IndexOutcome::Completed
            }
            Ok(_) => {
                tracing::warn!(id = %id, "backend reported indexation failure");
                self.notifier
                    .notify("Document indexation failed", Severity::Negative);
                IndexOutcome::Failed
            }
            Err(err) => {
                tracing::warn!(id = %id, error = %err, "indexation call errored");
                self.notifier
                    .notify("Error during indexation", Severity::Negative);
                IndexOutcome::Failed
            }
        }
    }

    /// Settle a finished job, then advance the queue. Runs exactly once per
    /// started job, on every outcome. Returns the next document this chain
    /// should process, or `None` when the chain ends (idle, or handed off).
    async fn settle_and_next(self: &Arc<Self>, settled: &SharedDocument) -> Option<SharedDocument> {
        let (id, parent_id) = {
            let d = settled.read();
            (d.id.clone(), d.parent_id.clone())
        };

        let completed_folder = {
            let _st = self.state.lock();
            self.registry.remove(&id);
            parent_id.and_then(|p| self.push_folder_progress(&p))
        };
        if let Some(folder_id) = completed_folder {
            tracing::info!(folder = %folder_id, "folder indexation complete");
            self.notifier
                .notify("Folder indexation complete", Severity::Positive);
        }

        self.advance().await
    }

    /// Pull work until a document job is running in this chain, work was
    /// handed to another chain, or both backlogs are empty.
    async fn advance(self: &Arc<Self>) -> Option<SharedDocument> {
        loop {
            let decision = {
                let mut st = self.state.lock();
                self.next_job(&mut st)
            };
            match decision {
                NextJob::Document(doc) => return Some(doc),
                NextJob::Idle => return None,
                NextJob::Folder(folder) => match self.fan_out(&folder).await {
                    FanOut::Continue(doc) => return Some(doc),
                    FanOut::HandedOff => return None,
                    FanOut::Empty | FanOut::Failed => continue,
                },
            }
        }
    }

    /// Run detached drain continuations until the queue empties.
    async fn run_chain(self: Arc<Self>, first: SharedDocument) {
        let mut current = Some(first);
        while let Some(doc) = current {
            let _ = self.process_document(&doc).await;
            current = self.settle_and_next(&doc).await;
        }
    }

    /// After a failed or empty fan-out on the user path, the queue may hold
    /// entries that accumulated during the fetch; drain them or go idle.
    async fn resume_or_go_idle(self: &Arc<Self>) {
        if let Some(next) = self.advance().await {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.run_chain(next).await });
        }
    }

    /// Decide what runs next. Documents strictly before folders; the only
    /// path that clears the busy flag is both backlogs simultaneously
    /// empty. Caller holds the queue lock.
    fn next_job(&self, st: &mut QueueState) -> NextJob {
        st.active_id = None;
        if let Some(doc) = st.documents.pop_front() {
            self.begin(st, &doc);
            return NextJob::Document(doc);
        }
        if let Some(folder) = st.folders.pop_front() {
            // Busy stays true across the fan-out so nothing jumps the queue.
            return NextJob::Folder(folder);
        }
        st.busy = false;
        self.busy_tx.send_replace(false);
        NextJob::Idle
    }

    /// Fetch a folder's documents and feed them through the document path.
    /// The folder is tentatively registered before the fetch so duplicate
    /// requests reject while it is in flight; the entry is removed again if
    /// the fan-out yields nothing.
    async fn fan_out(self: &Arc<Self>, folder: &SharedFolder) -> FanOut {
        let folder_id = folder.read().id.clone();
        {
            let _st = self.state.lock();
            self.registry
                .insert(folder_id.clone(), IndexingState::folder_pending(now_ms()));
        }

        let docs = match self.backend.index_folder(&folder_id).await {
            Ok(docs) => docs,
            Err(BackendError::EmptyFolder(_)) => {
                let _st = self.state.lock();
                self.registry.remove(&folder_id);
                drop(_st);
                self.notifier
                    .notify("No documents to index in this folder", Severity::Info);
                return FanOut::Empty;
            }
            Err(err) => {
                let _st = self.state.lock();
                self.registry.remove(&folder_id);
                drop(_st);
                tracing::warn!(folder = %folder_id, error = %err, "folder fan-out failed");
                self.notifier
                    .notify("Error during folder indexation", Severity::Negative);
                return FanOut::Failed;
            }
        };

        let (added, started) = {
            let mut st = self.state.lock();
            let survivors: Vec<SharedDocument> = docs
                .into_iter()
                .filter(|doc| {
                    let d = doc.read();
                    !d.indexed
                        && !self.registry.is_indexing(&d.id)
                        && !st.documents.iter().any(|q| q.read().id == d.id)
                })
                .collect();

            if survivors.is_empty() {
                self.registry.remove(&folder_id);
                (0, None)
            } else {
                // total_files counts the enqueue survivors: completion is
                // current_file == total_files, and only survivors settle
                // against this entry.
                let total = survivors.len() as u32;
                self.registry.update(&folder_id, |entry| {
                    entry.current_file = Some(0);
                    entry.total_files = Some(total);
                    entry.progress = 0.0;
                });
                st.documents.extend(survivors);

                let mut started = None;
                if st.active_id.is_none() {
                    if let Some(first) = st.documents.pop_front() {
                        self.begin(&mut st, &first);
                        started = Some(first);
                    }
                }
                (total as usize, started)
            }
        };

        if added == 0 {
            self.notifier
                .notify("No documents to index in this folder", Severity::Info);
            return FanOut::Empty;
        }
        tracing::info!(folder = %folder_id, documents = added, "folder fan-out enqueued");
        self.notifier.notify(
            &format!("{added} document(s) added to the indexation queue"),
            Severity::Info,
        );
        match started {
            Some(doc) => FanOut::Continue(doc),
            None => FanOut::HandedOff,
        }
    }

    /// Push one settlement into the owning folder's entry. Settlements
    /// count regardless of the document's outcome; a folder job completes
    /// once every document it enqueued has settled. Returns the folder id
    /// exactly when this settlement completed it. Caller holds the queue
    /// lock.
    fn push_folder_progress(&self, folder_id: &ItemId) -> Option<ItemId> {
        let mut completed = false;
        let bumped = self.registry.update(folder_id, |entry| {
            let (Some(current), Some(total)) = (entry.current_file, entry.total_files) else {
                return;
            };
            let current = current + 1;
            entry.current_file = Some(current);
            entry.progress = (current as f32 / total as f32) * 100.0;
            completed = current >= total;
        });
        if bumped && completed {
            self.registry.remove(folder_id);
            Some(folder_id.clone())
        } else {
            None
        }
    }
}

fn now_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
