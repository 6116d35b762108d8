//! In-flight indexing state, keyed by item id.
//!
//! One entry per item currently indexing; presence IS the "is this item
//! indexing" flag. Entries are created when a job starts and deleted the
//! instant that job's backend call settles, not when the visual queue
//! finishes draining. Document ids and folder ids share the id space.
//!
//! Many readers (UI components polling `is_indexing`/`get`), one writer:
//! every mutation happens while the controller's queue lock is held, which
//! makes check-and-enqueue atomic without a second lock discipline here.

use core_types::{ItemId, Timestamp};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

/// Progress snapshot for one in-flight item.
///
/// `current_file`/`total_files` are present for folder jobs only.
/// `total_files` stays `None` while the folder's document list is still
/// being fetched; progress pushes are ignored until it is known.
#[derive(Debug, Clone, Serialize)]
pub struct IndexingState {
    /// Percent in `[0, 100]`.
    pub progress: f32,
    /// Unix milliseconds at job start.
    pub started_at_ms: Timestamp,
    pub current_file: Option<u32>,
    pub total_files: Option<u32>,
}

impl IndexingState {
    pub fn document(started_at_ms: Timestamp) -> Self {
        IndexingState {
            progress: 0.0,
            started_at_ms,
            current_file: None,
            total_files: None,
        }
    }

    /// Tentative folder entry, registered before the document list is known
    /// so duplicate folder requests reject while the fetch is in flight.
    pub fn folder_pending(started_at_ms: Timestamp) -> Self {
        IndexingState {
            progress: 0.0,
            started_at_ms,
            current_file: Some(0),
            total_files: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.current_file.is_some()
    }
}

/// Process-wide map of in-flight indexing state, scoped to a session.
///
/// There is deliberately no global instance: create one per session (or per
/// test) and `reset` it on teardown so state never leaks across boundaries.
#[derive(Debug, Default)]
pub struct IndexingRegistry {
    entries: RwLock<HashMap<ItemId, IndexingState>>,
}

impl IndexingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: ItemId, state: IndexingState) {
        self.entries.write().insert(id, state);
    }

    pub fn get(&self, id: &ItemId) -> Option<IndexingState> {
        self.entries.read().get(id).cloned()
    }

    pub fn is_indexing(&self, id: &ItemId) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn remove(&self, id: &ItemId) {
        self.entries.write().remove(id);
    }

    /// Apply `f` to the entry for `id`. Returns false when no entry exists.
    pub fn update<F>(&self, id: &ItemId, f: F) -> bool
    where
        F: FnOnce(&mut IndexingState),
    {
        let mut entries = self.entries.write();
        match entries.get_mut(id) {
            Some(entry) => {
                f(entry);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Point-in-time copy for status surfaces.
    pub fn snapshot(&self) -> HashMap<ItemId, IndexingState> {
        self.entries.read().clone()
    }

    /// Drop every entry. Sessions call this on teardown.
    pub fn reset(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_is_the_indexing_flag() {
        let registry = IndexingRegistry::new();
        let id = ItemId::from("1");
        assert!(!registry.is_indexing(&id));

        registry.insert(id.clone(), IndexingState::document(0));
        assert!(registry.is_indexing(&id));
        assert_eq!(registry.len(), 1);

        registry.remove(&id);
        assert!(!registry.is_indexing(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn update_mutates_existing_entries_only() {
        let registry = IndexingRegistry::new();
        let id = ItemId::from("folder1");

        assert!(!registry.update(&id, |e| e.progress = 50.0));

        registry.insert(id.clone(), IndexingState::folder_pending(0));
        assert!(registry.update(&id, |e| {
            e.total_files = Some(4);
            e.current_file = Some(1);
            e.progress = 25.0;
        }));

        let state = registry.get(&id).unwrap();
        assert!(state.is_folder());
        assert_eq!(state.total_files, Some(4));
        assert_eq!(state.progress, 25.0);
    }

    #[test]
    fn reset_clears_all_entries() {
        let registry = IndexingRegistry::new();
        registry.insert("1".into(), IndexingState::document(0));
        registry.insert("folder1".into(), IndexingState::folder_pending(0));
        assert_eq!(registry.len(), 2);

        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.get(&"1".into()).is_none());
    }
}
