//! Saved searches shown as virtual folders

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What a saved search stands for in the folder list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    #[default]
    User,
    /// Deleted messages across mailboxes, standing in for Trash.
    VirtualTrash,
    /// Unseen messages across polled mailboxes.
    VirtualInbox,
}

/// A saved search that is displayed as a virtual folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: String,
    pub label: String,
    /// Whether the user may edit or delete it.
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub kind: SearchKind,
}

impl SavedSearch {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            editable: true,
            kind: SearchKind::User,
        }
    }

    /// A built-in search the user cannot edit.
    #[must_use]
    pub fn system(id: impl Into<String>, label: impl Into<String>, kind: SearchKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            editable: false,
            kind,
        }
    }
}

/// Source of saved searches.
pub trait SearchRegistry {
    /// Searches to display as virtual folders.
    fn virtual_folders(&self) -> Vec<SavedSearch>;

    fn get(&self, id: &str) -> Option<SavedSearch> {
        self.virtual_folders().into_iter().find(|s| s.id == id)
    }

    /// Whether `id` names a virtual folder.
    fn is_virtual_folder(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

impl<T: SearchRegistry + ?Sized> SearchRegistry for Arc<T> {
    fn virtual_folders(&self) -> Vec<SavedSearch> {
        (**self).virtual_folders()
    }

    fn get(&self, id: &str) -> Option<SavedSearch> {
        (**self).get(id)
    }

    fn is_virtual_folder(&self, id: &str) -> bool {
        (**self).is_virtual_folder(id)
    }
}

/// A fixed list of saved searches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemorySearches(pub Vec<SavedSearch>);

impl SearchRegistry for MemorySearches {
    fn virtual_folders(&self) -> Vec<SavedSearch> {
        self.0.clone()
    }

    fn get(&self, id: &str) -> Option<SavedSearch> {
        self.0.iter().find(|s| s.id == id).cloned()
    }
}
