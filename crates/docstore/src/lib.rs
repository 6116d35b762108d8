//! In-memory document store and simulated indexation backend.
//!
//! Owns the document/folder hierarchy the UI browses and implements the
//! `IndexerBackend` port with configurable latency, standing in for a real
//! processing service. Folder statistics are recomputed here — on fetch and
//! after every CRUD mutation — never by the queue controller.
//!
//! Indexation state is split deliberately: the store simulates the work and
//! reports a result; the controller is the single writer of `indexed` and
//! `indexation_time` on the shared document handles.

use async_trait::async_trait;
use core_types::config::BackendConfig;
use core_types::{
    Document, Folder, FolderStatistics, FsItem, IndexationResult, ItemId, SharedDocument,
    SharedFolder, Timestamp,
};
use indexer::{BackendError, IndexerBackend};
use parking_lot::RwLock;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Result of toggling a document's activation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub success: bool,
    pub active: bool,
}

pub struct DocumentStore {
    documents: RwLock<Vec<SharedDocument>>,
    folders: RwLock<Vec<SharedFolder>>,
    latency: BackendConfig,
}

impl DocumentStore {
    pub fn new(latency: BackendConfig) -> Self {
        DocumentStore {
            documents: RwLock::new(Vec::new()),
            folders: RwLock::new(Vec::new()),
            latency,
        }
    }

    /// Store seeded with the demo catalog: three documents, one folder.
    pub fn with_sample_data(latency: BackendConfig) -> Self {
        let store = Self::new(latency);
        {
            let mut folders = store.folders.write();
            folders.push(
                Folder {
                    id: "folder1".into(),
                    name: "Technical Documents".into(),
                    created_at: 1_709_251_200, // 2024-03-01
                    parent_id: None,
                    statistics: FolderStatistics::default(),
                }
                .into_shared(),
            );
        }
        {
            let mut documents = store.documents.write();
            documents.push(sample_doc(
                "1",
                "Annual Report 2023.pdf",
                1_705_276_800, // 2024-01-15
                2.5,
                45,
                15_000,
                Some("folder1"),
            ));
            documents.push(sample_doc(
                "2",
                "User Guide v2.pdf",
                1_706_745_600, // 2024-02-01
                4.2,
                120,
                35_000,
                Some("folder1"),
            ));
            documents.push(sample_doc(
                "3",
                "API Documentation.pdf",
                1_709_251_200, // 2024-03-01
                5.8,
                150,
                45_000,
                None,
            ));
        }
        store.refresh_all_statistics();
        store
    }

    /// List a folder's direct children, folders first. `None` is the root.
    pub async fn fetch_items(&self, parent_id: Option<&ItemId>) -> Vec<FsItem> {
        self.pause(self.latency.fetch_latency_ms).await;
        self.refresh_all_statistics();

        let mut items: Vec<FsItem> = self
            .folders
            .read()
            .iter()
            .filter(|f| f.read().parent_id.as_ref() == parent_id)
            .cloned()
            .map(FsItem::Folder)
            .collect();
        items.extend(
            self.documents
                .read()
                .iter()
                .filter(|d| d.read().parent_id.as_ref() == parent_id)
                .cloned()
                .map(FsItem::Document),
        );
        items
    }

    pub async fn toggle_activation(&self, id: &ItemId) -> ToggleOutcome {
        self.pause(self.latency.crud_latency_ms).await;
        match self.document(id) {
            Some(doc) => {
                let mut d = doc.write();
                d.active = !d.active;
                ToggleOutcome {
                    success: true,
                    active: d.active,
                }
            }
            None => ToggleOutcome {
                success: false,
                active: false,
            },
        }
    }

    pub async fn create_folder(&self, name: &str, parent_id: Option<ItemId>) -> SharedFolder {
        self.pause(self.latency.crud_latency_ms).await;
        let folder = Folder {
            id: format!("folder-{}", uuid::Uuid::new_v4()).into(),
            name: name.to_string(),
            created_at: now_secs(),
            parent_id,
            statistics: FolderStatistics::default(),
        }
        .into_shared();
        self.folders.write().push(folder.clone());
        folder
    }

    pub async fn rename_document(&self, id: &ItemId, new_name: &str) -> bool {
        self.pause(self.latency.crud_latency_ms).await;
        match self.document(id) {
            Some(doc) => {
                doc.write().name = new_name.to_string();
                true
            }
            None => false,
        }
    }

    pub async fn rename_folder(&self, id: &ItemId, new_name: &str) -> bool {
        self.pause(self.latency.crud_latency_ms).await;
        match self.folder(id) {
            Some(folder) => {
                folder.write().name = new_name.to_string();
                true
            }
            None => false,
        }
    }

    pub async fn delete_document(&self, id: &ItemId) -> bool {
        self.pause(self.latency.crud_latency_ms).await;
        let parent = {
            let mut documents = self.documents.write();
            let Some(pos) = documents.iter().position(|d| &d.read().id == id) else {
                return false;
            };
            documents.remove(pos).read().parent_id.clone()
        };
        if let Some(parent_id) = parent {
            self.refresh_folder_statistics(&parent_id);
        }
        true
    }

    /// Deletes the folder and every document directly inside it.
    pub async fn delete_folder(&self, id: &ItemId) -> bool {
        self.pause(self.latency.crud_latency_ms).await;
        {
            let mut folders = self.folders.write();
            let Some(pos) = folders.iter().position(|f| &f.read().id == id) else {
                return false;
            };
            folders.remove(pos);
        }
        self.documents
            .write()
            .retain(|d| d.read().parent_id.as_ref() != Some(id));
        true
    }

    /// Reparent documents and folders onto `target_id` (`None` is the root).
    pub async fn move_items(&self, ids: &[ItemId], target_id: Option<&ItemId>) -> bool {
        self.pause(self.latency.fetch_latency_ms).await;
        let mut touched: Vec<ItemId> = Vec::new();

        for id in ids {
            if let Some(doc) = self.document(id) {
                let mut d = doc.write();
                if let Some(old) = d.parent_id.take() {
                    touched.push(old);
                }
                d.parent_id = target_id.cloned();
            } else if let Some(folder) = self.folder(id) {
                folder.write().parent_id = target_id.cloned();
            } else {
                return false;
            }
        }

        for folder_id in touched {
            self.refresh_folder_statistics(&folder_id);
        }
        if let Some(target) = target_id {
            self.refresh_folder_statistics(target);
        }
        true
    }

    pub fn document(&self, id: &ItemId) -> Option<SharedDocument> {
        self.documents
            .read()
            .iter()
            .find(|d| &d.read().id == id)
            .cloned()
    }

    pub fn folder(&self, id: &ItemId) -> Option<SharedFolder> {
        self.folders
            .read()
            .iter()
            .find(|f| &f.read().id == id)
            .cloned()
    }

    /// Recompute one folder's statistics from its direct documents.
    pub fn refresh_folder_statistics(&self, folder_id: &ItemId) {
        let Some(folder) = self.folder(folder_id) else {
            return;
        };
        let stats = {
            let documents = self.documents.read();
            let children: Vec<_> = documents
                .iter()
                .filter(|d| d.read().parent_id.as_ref() == Some(folder_id))
                .collect();
            FolderStatistics {
                total_size_mb: round_mb(children.iter().map(|d| d.read().size_mb).sum()),
                total_pages: children.iter().map(|d| d.read().pages).sum(),
                total_tokens: children.iter().map(|d| d.read().tokens).sum(),
                indexed_count: children.iter().filter(|d| d.read().indexed).count() as u32,
                total_count: children.len() as u32,
            }
        };
        folder.write().statistics = stats;
    }

    pub fn refresh_all_statistics(&self) {
        let ids: Vec<ItemId> = self.folders.read().iter().map(|f| f.read().id.clone()).collect();
        for id in ids {
            self.refresh_folder_statistics(&id);
        }
    }

    async fn pause(&self, ms: u64) {
        if ms > 0 {
            sleep(Duration::from_millis(ms)).await;
        }
    }

    fn indexation_pause_ms(&self) -> u64 {
        let min = self.latency.index_latency_min_ms;
        let max = self.latency.index_latency_max_ms.max(min);
        if max > min {
            rand::rng().random_range(min..=max)
        } else {
            min
        }
    }
}

#[async_trait]
impl IndexerBackend for DocumentStore {
    async fn index_document(&self, id: &ItemId) -> Result<IndexationResult, BackendError> {
        let pause = self.indexation_pause_ms();
        self.pause(pause).await;

        match self.document(id) {
            Some(doc) => {
                let d = doc.read();
                // 1.0–3.0s, one decimal, independent of the simulated pause.
                let execution_time = (rand::rng().random_range(1.0_f64..=3.0) * 10.0).round() / 10.0;
                tracing::debug!(id = %id, seconds = execution_time, "simulated indexation finished");
                Ok(IndexationResult {
                    success: true,
                    execution_time,
                    pages: Some(d.pages),
                    tokens: Some(d.tokens),
                    size_mb: Some(d.size_mb),
                })
            }
            // Unknown ids settle with an explicit failure, not an error.
            None => Ok(IndexationResult::failure()),
        }
    }

    async fn index_folder(&self, folder_id: &ItemId) -> Result<Vec<SharedDocument>, BackendError> {
        self.pause(self.latency.crud_latency_ms).await;

        let mut docs: Vec<SharedDocument> = self
            .documents
            .read()
            .iter()
            .filter(|d| {
                let d = d.read();
                d.parent_id.as_ref() == Some(folder_id) && !d.indexed
            })
            .cloned()
            .collect();
        if docs.is_empty() {
            return Err(BackendError::EmptyFolder(folder_id.clone()));
        }
        docs.sort_by(|a, b| a.read().id.cmp(&b.read().id));
        Ok(docs)
    }
}

fn sample_doc(
    id: &str,
    name: &str,
    created_at: Timestamp,
    size_mb: f64,
    pages: u32,
    tokens: u64,
    parent: Option<&str>,
) -> SharedDocument {
    Document {
        id: id.into(),
        name: name.to_string(),
        active: true,
        created_at,
        size_mb,
        pages,
        tokens,
        indexed: false,
        indexation_time: None,
        parent_id: parent.map(ItemId::from),
    }
    .into_shared()
}

fn round_mb(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn now_secs() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DocumentStore {
        DocumentStore::with_sample_data(BackendConfig::instant())
    }

    #[tokio::test]
    async fn sample_catalog_lists_root_and_folder_children() {
        let store = store();

        let root = store.fetch_items(None).await;
        assert_eq!(root.len(), 2); // folder1 + document 3
        assert!(root[0].is_folder());

        let children = store.fetch_items(Some(&"folder1".into())).await;
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|i| !i.is_folder()));
    }

    #[tokio::test]
    async fn statistics_follow_document_mutations() {
        let store = store();
        store.refresh_folder_statistics(&"folder1".into());

        let folder = store.folder(&"folder1".into()).unwrap();
        {
            let stats = &folder.read().statistics;
            assert_eq!(stats.total_count, 2);
            assert_eq!(stats.indexed_count, 0);
            assert_eq!(stats.total_size_mb, 6.7);
            assert_eq!(stats.total_pages, 165);
            assert_eq!(stats.total_tokens, 50_000);
        }

        // Mark one child indexed the way the controller would.
        store.document(&"1".into()).unwrap().write().indexed = true;
        store.refresh_folder_statistics(&"folder1".into());
        assert_eq!(folder.read().statistics.indexed_count, 1);
    }

    #[tokio::test]
    async fn delete_document_refreshes_the_old_parent() {
        let store = store();
        assert!(store.delete_document(&"1".into()).await);

        let folder = store.folder(&"folder1".into()).unwrap();
        assert_eq!(folder.read().statistics.total_count, 1);
        assert!(!store.delete_document(&"1".into()).await);
    }

    #[tokio::test]
    async fn delete_folder_drops_children_too() {
        let store = store();
        assert!(store.delete_folder(&"folder1".into()).await);
        assert!(store.folder(&"folder1".into()).is_none());
        assert!(store.document(&"1".into()).is_none());
        assert!(store.document(&"2".into()).is_none());
        assert!(store.document(&"3".into()).is_some());
    }

    #[tokio::test]
    async fn move_items_reparents_and_refreshes_both_sides() {
        let store = store();
        let target = store.create_folder("Archive", None).await;
        let target_id = target.read().id.clone();

        assert!(store.move_items(&["1".into()], Some(&target_id)).await);

        let source = store.folder(&"folder1".into()).unwrap();
        assert_eq!(source.read().statistics.total_count, 1);
        assert_eq!(target.read().statistics.total_count, 1);
        assert!(!store.move_items(&["missing".into()], None).await);
    }

    #[tokio::test]
    async fn toggle_and_rename_report_lookup_failures() {
        let store = store();

        let toggled = store.toggle_activation(&"1".into()).await;
        assert!(toggled.success);
        assert!(!toggled.active);

        let missing = store.toggle_activation(&"missing".into()).await;
        assert!(!missing.success);

        assert!(store.rename_document(&"1".into(), "Renamed.pdf").await);
        assert_eq!(store.document(&"1".into()).unwrap().read().name, "Renamed.pdf");
        assert!(store.rename_folder(&"folder1".into(), "Docs").await);
        assert!(!store.rename_folder(&"missing".into(), "Docs").await);
    }

    #[tokio::test]
    async fn index_document_reports_without_mutating() {
        let store = store();

        let result = store.index_document(&"1".into()).await.unwrap();
        assert!(result.success);
        assert!(result.execution_time >= 1.0 && result.execution_time <= 3.0);
        assert_eq!(result.pages, Some(45));
        // The controller, not the store, flips the indexed flag.
        assert!(!store.document(&"1".into()).unwrap().read().indexed);

        let missing = store.index_document(&"missing".into()).await.unwrap();
        assert!(!missing.success);
        assert_eq!(missing.execution_time, 0.0);
    }

    #[tokio::test]
    async fn index_folder_returns_sorted_non_indexed_children() {
        let store = store();
        store.document(&"1".into()).unwrap().write().indexed = true;

        let docs = store.index_folder(&"folder1".into()).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].read().id, ItemId::from("2"));

        store.document(&"2".into()).unwrap().write().indexed = true;
        let err = store.index_folder(&"folder1".into()).await.unwrap_err();
        assert!(matches!(err, BackendError::EmptyFolder(_)));
    }
}
