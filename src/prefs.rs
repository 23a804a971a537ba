//! User preference storage
//!
//! The tree reads and writes a handful of preference values. They are
//! plain strings on the wire; list-valued preferences are JSON arrays.

use crate::config::parse_flag;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Subscriptions are honoured (otherwise every mailbox counts as subscribed).
pub const SUBSCRIBE: &str = "subscribe";
/// JSON array of mailboxes polled for unseen counts.
pub const NAV_POLL: &str = "nav_poll";
/// Poll every mailbox.
pub const NAV_POLL_ALL: &str = "nav_poll_all";
/// JSON array of expanded mailboxes.
pub const EXPANDED_FOLDERS: &str = "expanded_folders";
/// Initial expand mode, see [`ExpandMode`].
pub const NAV_EXPANDED: &str = "nav_expanded";
/// Group other-users and shared namespaces under header elements.
pub const TREE_VIEW: &str = "tree_view";
pub const DRAFTS_FOLDER: &str = "drafts_folder";
/// JSON array of sent-mail mailboxes.
pub const SENT_MAIL_FOLDERS: &str = "sent_mail_folders";
pub const SPAM_FOLDER: &str = "spam_folder";
pub const TRASH_FOLDER: &str = "trash_folder";
/// Trash is a virtual folder, so the real trash mailbox is not special.
pub const USE_VTRASH: &str = "use_vtrash";

/// Which elements start out expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpandMode {
    None,
    All,
    /// Only the ones the user expanded.
    #[default]
    User,
}

impl ExpandMode {
    fn parse(value: &str) -> Self {
        match value.trim() {
            "0" => Self::None,
            "1" => Self::All,
            _ => Self::User,
        }
    }
}

/// Get/set access to the user's preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    /// Locked preferences are administrator-controlled and must not be
    /// changed.
    fn is_locked(&self, _key: &str) -> bool {
        false
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) {
        (**self).set(key, value);
    }

    fn is_locked(&self, key: &str) -> bool {
        (**self).is_locked(key)
    }
}

/// Typed reads of the preferences the tree cares about.
pub(crate) struct Prefs<'a>(pub &'a dyn PreferenceStore);

impl Prefs<'_> {
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.0
            .get(key)
            .and_then(|v| parse_flag(&v))
            .unwrap_or(default)
    }

    pub fn subscribe(&self) -> bool {
        self.flag(SUBSCRIBE, true)
    }

    pub fn tree_view(&self) -> bool {
        self.flag(TREE_VIEW, false)
    }

    pub fn expand_mode(&self) -> ExpandMode {
        self.0
            .get(NAV_EXPANDED)
            .map(|v| ExpandMode::parse(&v))
            .unwrap_or_default()
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.0.get(key).filter(|v| !v.is_empty())
    }

    pub fn list(&self, key: &str) -> BTreeSet<String> {
        let Some(raw) = self.0.get(key) else {
            return BTreeSet::new();
        };
        if raw.trim().is_empty() {
            return BTreeSet::new();
        }
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring malformed preference {}: {}", key, e);
            BTreeSet::new()
        })
    }

    pub fn set_list(&self, key: &str, values: &BTreeSet<String>) {
        match serde_json::to_string(values) {
            Ok(raw) => self.0.set(key, raw),
            Err(e) => warn!("Failed to store preference {}: {}", key, e),
        }
    }
}

/// An in-memory [`PreferenceStore`].
///
/// Serializable so that callers can persist it next to the tree.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryPrefs {
    values: RwLock<BTreeMap<String, String>>,
    #[serde(default)]
    locked: BTreeSet<String>,
}

impl MemoryPrefs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value.into());
        self
    }

    #[must_use]
    pub fn lock(mut self, key: &str) -> Self {
        self.locked.insert(key.to_string());
        self
    }
}

impl PreferenceStore for MemoryPrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn is_locked(&self, key: &str) -> bool {
        self.locked.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let store = MemoryPrefs::new();
        let prefs = Prefs(&store);
        assert!(prefs.subscribe());
        assert!(!prefs.tree_view());
        assert_eq!(prefs.expand_mode(), ExpandMode::User);
        assert!(prefs.list(NAV_POLL).is_empty());
    }

    #[test]
    fn list_round_trips_through_json() {
        let store = MemoryPrefs::new();
        let prefs = Prefs(&store);
        let values: BTreeSet<String> = ["INBOX", "Work"].iter().map(|s| (*s).to_string()).collect();
        prefs.set_list(NAV_POLL, &values);
        assert_eq!(store.get(NAV_POLL).unwrap(), r#"["INBOX","Work"]"#);
        assert_eq!(prefs.list(NAV_POLL), values);
    }

    #[test]
    fn malformed_list_is_ignored() {
        let store = MemoryPrefs::new().with(NAV_POLL, "not json");
        assert!(Prefs(&store).list(NAV_POLL).is_empty());
    }

    #[test]
    fn expand_mode_parsing() {
        let store = MemoryPrefs::new().with(NAV_EXPANDED, "1");
        assert_eq!(Prefs(&store).expand_mode(), ExpandMode::All);
        let store = MemoryPrefs::new().with(NAV_EXPANDED, "0");
        assert_eq!(Prefs(&store).expand_mode(), ExpandMode::None);
    }

    #[test]
    fn locking() {
        let store = MemoryPrefs::new().lock(NAV_POLL);
        assert!(store.is_locked(NAV_POLL));
        assert!(!store.is_locked(SUBSCRIBE));
    }

    #[test]
    fn memory_prefs_serialize() {
        let store = MemoryPrefs::new().with(SUBSCRIBE, "0");
        let json = serde_json::to_string(&store).unwrap();
        let back: MemoryPrefs = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(SUBSCRIBE).as_deref(), Some("0"));
    }
}
