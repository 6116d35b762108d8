//! Core identifiers and shared lightweight types for Docshelf.
//!
//! These types intentionally avoid heavy dependencies and aim to be
//! serialization-friendly for status surfaces and config files. Entities
//! are shared between the hierarchy view and the indexation controller
//! through `Arc<RwLock<_>>` handles; the store owns them, everyone else
//! holds clones of the handle.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod config;

/// Unix timestamp (seconds); i64 for easy serde and cheap comparisons.
pub type Timestamp = i64;

/// Identifier shared by documents and folders. Folder ids and document ids
/// live in the same id space: the indexing registry is keyed by `ItemId`
/// regardless of item kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

/// A document in the hierarchy. `indexed` and `indexation_time` are written
/// only by the indexation controller when a job settles successfully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: ItemId,
    pub name: String,
    pub active: bool,
    pub created_at: Timestamp,
    /// Size in megabytes.
    pub size_mb: f64,
    pub pages: u32,
    pub tokens: u64,
    pub indexed: bool,
    /// Indexation duration in seconds, set when a job completes.
    pub indexation_time: Option<f64>,
    pub parent_id: Option<ItemId>,
}

impl Document {
    pub fn into_shared(self) -> SharedDocument {
        Arc::new(RwLock::new(self))
    }
}

/// Cumulative statistics over a folder's direct documents. Recomputed by
/// the store; the controller never touches these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderStatistics {
    pub total_size_mb: f64,
    pub total_pages: u32,
    pub total_tokens: u64,
    pub indexed_count: u32,
    pub total_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: ItemId,
    pub name: String,
    pub created_at: Timestamp,
    pub parent_id: Option<ItemId>,
    pub statistics: FolderStatistics,
}

impl Folder {
    pub fn into_shared(self) -> SharedFolder {
        Arc::new(RwLock::new(self))
    }
}

/// Shared handle to a store-owned document.
pub type SharedDocument = Arc<RwLock<Document>>;

/// Shared handle to a store-owned folder.
pub type SharedFolder = Arc<RwLock<Folder>>;

/// A hierarchy entry as returned by `fetch_items`: folders first, then
/// documents, matching the listing order users see.
#[derive(Debug, Clone)]
pub enum FsItem {
    Folder(SharedFolder),
    Document(SharedDocument),
}

impl FsItem {
    pub fn id(&self) -> ItemId {
        match self {
            FsItem::Folder(f) => f.read().id.clone(),
            FsItem::Document(d) => d.read().id.clone(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, FsItem::Folder(_))
    }
}

/// Result of a single document indexation reported by the backend.
///
/// `success: false` models an explicit backend-side failure (the call
/// settled, the work did not happen); transport-level problems surface as
/// `BackendError` on the port instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexationResult {
    pub success: bool,
    /// Execution time in seconds.
    pub execution_time: f64,
    pub pages: Option<u32>,
    pub tokens: Option<u64>,
    pub size_mb: Option<f64>,
}

impl IndexationResult {
    pub fn failure() -> Self {
        IndexationResult {
            success: false,
            execution_time: 0.0,
            pages: None,
            tokens: None,
            size_mb: None,
        }
    }
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Positive,
    Negative,
    Warning,
    Info,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_round_trips_through_display() {
        let id = ItemId::from("folder1");
        assert_eq!(id.to_string(), "folder1");
        assert_eq!(id.as_str(), "folder1");
    }

    #[test]
    fn fs_item_reports_kind_and_id() {
        let doc = Document {
            id: "1".into(),
            name: "Report.pdf".into(),
            active: true,
            created_at: 0,
            size_mb: 1.0,
            pages: 10,
            tokens: 1000,
            indexed: false,
            indexation_time: None,
            parent_id: None,
        }
        .into_shared();

        let item = FsItem::Document(doc);
        assert!(!item.is_folder());
        assert_eq!(item.id(), ItemId::from("1"));
    }
}
