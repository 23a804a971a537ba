//! The mailbox tree
//!
//! [`MailboxTree`] caches the server's mailbox hierarchy as a map of
//! [`MailboxElement`]s plus a parent to children adjacency list. It is
//! filled from a [`RemoteLister`], mutated by user actions and persisted
//! between requests with [`MailboxTree::save`] / [`MailboxTree::restore`].
//!
//! Mutations never fail loudly: remote errors are logged and treated as
//! empty results, invalid requests return `false`.

mod cursor;
mod diff;
mod edit;
mod list;
mod sort;
mod vfolder;

pub use cursor::{CursorState, NextMask, Traversal, TreeCursor};
pub use diff::{DiffTracker, EltDiff};
pub use list::{FolderListMask, FolderRow};
pub use sort::natural_cmp;

use crate::config::TreeConfig;
use crate::element::{BASE_ELT, EltAttrs, MailboxElement, OTHER_KEY, SHARED_KEY, VFOLDER_KEY};
use crate::error::{Error, Result};
use crate::flag::MailboxAttr;
use crate::folder::SpecialMailboxes;
use crate::lister::{ListEntry, RemoteLister};
use crate::namespace::{INBOX, Namespace, NamespaceKind, NamespaceResolver};
use crate::prefs::{self, ExpandMode, PreferenceStore, Prefs};
use crate::search::SearchRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, warn};

/// Hierarchy delimiter assumed when the server reports none.
const DEFAULT_DELIMITER: &str = "/";

/// The persisted part of the tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TreeState {
    namespaces: NamespaceResolver,
    elements: HashMap<String, MailboxElement>,
    children: HashMap<String, Vec<String>>,
    /// Current view shows unsubscribed mailboxes.
    show_unsub: bool,
    /// Unsubscribed mailboxes have been loaded into the tree.
    unsub_view: bool,
    delimiter: String,
    /// False when only INBOX is available.
    #[serde(default = "enabled")]
    folders: bool,
}

const fn enabled() -> bool {
    true
}

/// Cached view of the user's mailbox hierarchy.
pub struct MailboxTree {
    state: TreeState,
    config: TreeConfig,
    lister: Box<dyn RemoteLister>,
    prefs: Box<dyn PreferenceStore>,
    searches: Box<dyn SearchRegistry>,
    poll: Option<BTreeSet<String>>,
    expanded: Option<BTreeSet<String>>,
    subscribed_list: Option<IndexMap<String, ListEntry>>,
    full_list: Option<IndexMap<String, ListEntry>>,
    special: OnceCell<SpecialMailboxes>,
    diff: DiffTracker,
    changed: bool,
}

impl fmt::Debug for MailboxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailboxTree")
            .field("elements", &self.state.elements.len())
            .field("show_unsub", &self.state.show_unsub)
            .field("delimiter", &self.state.delimiter)
            .field("changed", &self.changed)
            .finish_non_exhaustive()
    }
}

impl MailboxTree {
    /// Build the tree from the server.
    ///
    /// If the namespaces cannot be listed, or folders are disabled by
    /// `config`, the tree holds INBOX only.
    pub fn new(
        config: TreeConfig,
        lister: impl RemoteLister + 'static,
        prefs: impl PreferenceStore + 'static,
        searches: impl SearchRegistry + 'static,
    ) -> Self {
        let mut state = TreeState {
            delimiter: DEFAULT_DELIMITER.to_string(),
            folders: config.folders_enabled(),
            ..TreeState::default()
        };

        if state.folders {
            match lister.list_namespaces() {
                Ok(namespaces) => {
                    let namespaces = if namespaces.is_empty() {
                        debug!("Server reported no namespaces, assuming a flat personal one");
                        vec![Namespace::new("", DEFAULT_DELIMITER, NamespaceKind::Personal)]
                    } else {
                        namespaces
                    };
                    if let Some(first) = namespaces.first().filter(|ns| !ns.delimiter.is_empty()) {
                        state.delimiter.clone_from(&first.delimiter);
                    }
                    state.namespaces = NamespaceResolver::new(namespaces);
                }
                Err(e) => {
                    warn!("Namespace listing failed, showing INBOX only: {}", e);
                    state.folders = false;
                }
            }
        }

        let mut tree = Self::with_state(
            state,
            config,
            Box::new(lister),
            Box::new(prefs),
            Box::new(searches),
        );
        tree.rebuild();
        tree
    }

    /// Restore a tree persisted with [`MailboxTree::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if `blob` is not a saved tree.
    pub fn restore(
        blob: &str,
        config: TreeConfig,
        lister: impl RemoteLister + 'static,
        prefs: impl PreferenceStore + 'static,
        searches: impl SearchRegistry + 'static,
    ) -> Result<Self> {
        let state: TreeState = serde_json::from_str(blob)?;
        if !state.elements.contains_key(BASE_ELT) {
            return Err(Error::Mailbox("Saved tree has no root element".into()));
        }

        let mut tree = Self::with_state(
            state,
            config,
            Box::new(lister),
            Box::new(prefs),
            Box::new(searches),
        );
        tree.ensure_inbox();
        tree.changed = false;
        Ok(tree)
    }

    fn with_state(
        state: TreeState,
        config: TreeConfig,
        lister: Box<dyn RemoteLister>,
        prefs: Box<dyn PreferenceStore>,
        searches: Box<dyn SearchRegistry>,
    ) -> Self {
        Self {
            state,
            config,
            lister,
            prefs,
            searches,
            poll: None,
            expanded: None,
            subscribed_list: None,
            full_list: None,
            special: OnceCell::new(),
            diff: DiffTracker::default(),
            changed: false,
        }
    }

    /// Serialize the persistent part of the tree.
    ///
    /// Cursor, diff tracking and listing caches are not included.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn save(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.state)?)
    }

    /// Throw away all elements and reload them from the server.
    pub fn rebuild(&mut self) {
        let unsub_mode = !self.state.folders
            || !self.pref().subscribe()
            || self.config.show_unsubscribed;

        self.changed = true;
        self.subscribed_list = None;
        self.full_list = None;
        self.state.elements.clear();
        self.state.children.clear();
        self.state.show_unsub = unsub_mode;
        self.state.unsub_view = unsub_mode;
        self.state
            .elements
            .insert(BASE_ELT.to_string(), MailboxElement::root());

        if !self.state.folders {
            let inbox = self.make_elt(INBOX, EltAttrs::IS_SUBSCRIBED);
            self.insert_elt(inbox);
            return;
        }

        if self.pref().tree_view() {
            self.insert_namespace_headers();
        }

        let show_unsub = self.state.show_unsub;
        let listing = self.get_list(show_unsub);
        self.insert_with_hint(&listing, if show_unsub { None } else { Some(true) });

        let searches = self.searches.virtual_folders();
        self.insert_vfolders(&searches);
        self.ensure_inbox();
    }

    fn insert_namespace_headers(&mut self) {
        let namespaces = self.state.namespaces.namespaces().to_vec();
        for ns in namespaces.iter().filter(|ns| ns.kind != NamespaceKind::Personal) {
            let (key, label) = if ns.kind == NamespaceKind::Other {
                (OTHER_KEY, "Other Users' Folders")
            } else {
                (SHARED_KEY, "Shared Folders")
            };

            let mut elt = self.make_elt(
                key,
                EltAttrs::NOSELECT | EltAttrs::NAMESPACE | EltAttrs::NONIMAP | EltAttrs::NOSHOW,
            );
            elt.label = label.to_string();
            let several = namespaces
                .iter()
                .any(|other| other.kind == ns.kind && other.name != ns.name);
            if several {
                elt.set(EltAttrs::NOSHOW, false);
            }
            self.insert_elt(elt);
        }
    }

    fn ensure_inbox(&mut self) {
        if let Some(inbox) = self.state.elements.get_mut(INBOX) {
            inbox.set(EltAttrs::IS_SUBSCRIBED, true);
        } else {
            let inbox = self.make_elt(INBOX, EltAttrs::IS_SUBSCRIBED);
            self.insert_elt(inbox);
        }
    }

    pub(crate) fn pref(&self) -> Prefs<'_> {
        Prefs(self.prefs.as_ref())
    }

    #[must_use]
    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.prefs.as_ref()
    }

    #[must_use]
    pub fn lister(&self) -> &dyn RemoteLister {
        self.lister.as_ref()
    }

    #[must_use]
    pub fn searches(&self) -> &dyn SearchRegistry {
        self.searches.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[must_use]
    pub const fn namespaces(&self) -> &NamespaceResolver {
        &self.state.namespaces
    }

    /// The session's default hierarchy delimiter.
    #[must_use]
    pub fn delimiter(&self) -> &str {
        &self.state.delimiter
    }

    /// Whether anything beyond INBOX is available.
    #[must_use]
    pub const fn folders_enabled(&self) -> bool {
        self.state.folders
    }

    /// Whether the tree changed since it was built, restored or saved.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        self.changed
    }

    pub const fn mark_saved(&mut self) {
        self.changed = false;
    }

    /// Whether the current view includes unsubscribed mailboxes.
    #[must_use]
    pub const fn showing_unsubscribed(&self) -> bool {
        self.state.show_unsub
    }

    /// Look up an element. INBOX matches case-insensitively.
    #[must_use]
    pub fn get(&self, value: &str) -> Option<&MailboxElement> {
        self.state.elements.get(convert_name(value).as_str())
    }

    /// Every element except the root, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &MailboxElement> {
        self.state.elements.values().filter(|elt| !elt.is_root())
    }

    /// Number of elements, not counting the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.elements.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw child values of `value`, regardless of visibility.
    #[must_use]
    pub fn children(&self, value: &str) -> &[String] {
        self.state
            .children
            .get(convert_name(value).as_str())
            .map_or(&[], Vec::as_slice)
    }

    /// Whether `value` has children visible in the current view.
    ///
    /// When unsubscribed mailboxes are hidden, only descendants that are
    /// subscribed (at any depth) count.
    #[must_use]
    pub fn has_children(&self, value: &str) -> bool {
        self.has_children_in(&convert_name(value), self.state.show_unsub)
    }

    /// Whether `value` is a navigation-only container.
    #[must_use]
    pub fn is_container(&self, value: &str) -> bool {
        self.get(value)
            .is_some_and(|elt| self.is_container_in(elt, self.state.show_unsub))
    }

    /// Whether `value` is expanded and has visible children.
    #[must_use]
    pub fn is_open(&self, value: &str) -> bool {
        self.get(value)
            .is_some_and(|elt| self.is_open_in(elt, self.state.show_unsub))
    }

    #[must_use]
    pub fn is_subscribed(&self, value: &str) -> bool {
        self.get(value).is_some_and(MailboxElement::is_subscribed)
    }

    /// Whether `value` is polled for new messages.
    ///
    /// Everything is polled when the poll-all preference is set.
    #[must_use]
    pub fn is_polled(&self, value: &str) -> bool {
        self.get(value).is_some_and(|elt| {
            self.pref().flag(prefs::NAV_POLL_ALL, false) || elt.has(EltAttrs::IS_POLLED)
        })
    }

    pub(crate) fn has_children_in(&self, value: &str, show_unsub: bool) -> bool {
        let Some(kids) = self.state.children.get(value).filter(|k| !k.is_empty()) else {
            return false;
        };
        if show_unsub {
            return true;
        }

        let mut pending: Vec<&str> = kids.iter().map(String::as_str).collect();
        while let Some(child) = pending.pop() {
            if self
                .state
                .elements
                .get(child)
                .is_some_and(MailboxElement::is_subscribed)
            {
                return true;
            }
            if let Some(grandchildren) = self.state.children.get(child) {
                pending.extend(grandchildren.iter().map(String::as_str));
            }
        }
        false
    }

    pub(crate) fn is_container_in(&self, elt: &MailboxElement, show_unsub: bool) -> bool {
        elt.has(EltAttrs::NOSELECT)
            || (!show_unsub
                && !elt.is_subscribed()
                && self.has_children_in(&elt.value, show_unsub))
    }

    pub(crate) fn is_open_in(&self, elt: &MailboxElement, show_unsub: bool) -> bool {
        elt.has(EltAttrs::IS_OPEN) && self.has_children_in(&elt.value, show_unsub)
    }

    /// Whether `elt` is shown: not invisible, and either everything is
    /// shown, or it is a subscribed mailbox, or it leads to one.
    pub(crate) fn is_active_in(&self, elt: &MailboxElement, show_unsub: bool) -> bool {
        !elt.is_invisible()
            && (show_unsub
                || (elt.is_subscribed() && !self.is_container_in(elt, show_unsub))
                || self.has_children_in(&elt.value, show_unsub))
    }

    fn modify<F: FnOnce(&mut MailboxElement)>(&mut self, value: &str, f: F) -> bool {
        match self.state.elements.get_mut(convert_name(value).as_str()) {
            Some(elt) => {
                f(elt);
                self.changed = true;
                true
            }
            None => false,
        }
    }

    /// Expand or collapse `value`, remembering the state in preferences.
    pub fn set_open(&mut self, value: &str, open: bool) {
        let value = convert_name(value);
        if self.modify(&value, |elt| elt.set(EltAttrs::IS_OPEN, open)) {
            self.modify_expanded(&value, open);
        }
    }

    pub fn set_polled(&mut self, value: &str, polled: bool) {
        self.modify(value, |elt| elt.set(EltAttrs::IS_POLLED, polled));
    }

    pub fn set_container(&mut self, value: &str, container: bool) {
        self.modify(value, |elt| elt.set(EltAttrs::NOSELECT, container));
    }

    /// Set the subscription bit. INBOX stays subscribed.
    pub fn set_subscribed(&mut self, value: &str, subscribed: bool) {
        let value = convert_name(value);
        if value == INBOX && !subscribed {
            return;
        }
        self.modify(&value, |elt| elt.set(EltAttrs::IS_SUBSCRIBED, subscribed));
    }

    pub fn set_invisible(&mut self, value: &str, invisible: bool) {
        self.modify(value, |elt| elt.set(EltAttrs::INVISIBLE, invisible));
    }

    /// Open `value` if it has visible children; with `all`, open every
    /// descendant too.
    pub fn expand(&mut self, value: &str, all: bool) {
        let mut pending = vec![convert_name(value)];
        while let Some(current) = pending.pop() {
            if !self.has_children(&current) {
                continue;
            }
            if !self.is_open(&current) {
                self.set_open(&current, true);
            }
            if all {
                pending.extend(self.children(&current).iter().cloned());
            }
        }
    }

    pub fn collapse(&mut self, value: &str) {
        if self.is_open(value) {
            self.set_open(value, false);
        }
    }

    pub fn expand_all(&mut self) {
        let top: Vec<String> = self.children(BASE_ELT).to_vec();
        for value in top {
            self.expand(&value, true);
        }
    }

    pub fn collapse_all(&mut self) {
        let values: Vec<String> = self.iter().map(|elt| elt.value.clone()).collect();
        for value in values {
            self.collapse(&value);
        }
    }

    /// Switch between the subscribed-only and the show-all view.
    ///
    /// Switching to show-all loads the unsubscribed mailboxes; those
    /// insertions are not reported as diff changes.
    pub fn show_unsubscribed(&mut self, show: bool) {
        if show != self.state.show_unsub {
            self.switch_view(show);
            self.changed = true;
        }
    }

    /// Flip the view without marking the tree changed. Mailboxes loaded
    /// for the show-all view still do.
    pub(crate) fn switch_view(&mut self, show: bool) {
        if show == self.state.show_unsub {
            return;
        }

        self.state.show_unsub = show;
        if !show {
            return;
        }

        self.state.unsub_view = true;
        self.diff.suspend();
        let listing = self.get_list(true);
        self.insert_with_hint(&listing, Some(false));
        self.diff.resume();
    }

    /// Mailboxes polled for new messages.
    ///
    /// With `prune`, mailboxes no longer in the tree are left out.
    pub fn poll_list(&mut self, sort: bool, prune: bool) -> Vec<String> {
        let mut list: Vec<String> = self.poll_set().iter().cloned().collect();

        if prune {
            let known: BTreeSet<String> = self
                .folder_list(FolderListMask::empty(), None)
                .into_iter()
                .map(|elt| elt.value)
                .collect();
            list.retain(|value| known.contains(value));
        }

        if sort {
            list.sort_by(|a, b| {
                (b == INBOX)
                    .cmp(&(a == INBOX))
                    .then_with(|| natural_cmp(a, b))
            });
        }

        list.retain(|value| !value.is_empty());
        list
    }

    /// Start polling `values`, subscribing any that are not subscribed.
    ///
    /// Does nothing if the poll list preference is locked.
    pub fn add_poll_list<S: AsRef<str>>(&mut self, values: &[S]) {
        if values.is_empty() || self.prefs.is_locked(prefs::NAV_POLL) {
            return;
        }

        let mut added = false;
        for value in values {
            let value = convert_name(value.as_ref());
            let Some(subscribed) = self.get(&value).map(MailboxElement::is_subscribed) else {
                continue;
            };
            if !subscribed {
                self.subscribe(&[value.as_str()]);
            }
            self.set_polled(&value, true);
            self.diff.record_change(&value);
            if self.poll_set().insert(value) {
                added = true;
            }
        }

        if added {
            self.store_poll_list();
        }
    }

    /// Stop polling `values`. INBOX is always polled.
    pub fn remove_poll_list<S: AsRef<str>>(&mut self, values: &[S]) {
        if self.prefs.is_locked(prefs::NAV_POLL) {
            return;
        }

        let mut removed = false;
        for value in values {
            let value = convert_name(value.as_ref());
            if value == INBOX {
                continue;
            }
            self.poll_set().remove(&value);
            if self.get(&value).is_some() {
                self.set_polled(&value, false);
                self.diff.record_change(&value);
            }
            removed = true;
        }

        if removed {
            self.store_poll_list();
        }
    }

    fn store_poll_list(&mut self) {
        let list = self.poll_set().clone();
        self.pref().set_list(prefs::NAV_POLL, &list);
        self.changed = true;
    }

    fn poll_set(&mut self) -> &mut BTreeSet<String> {
        if self.poll.is_none() {
            let mut poll = BTreeSet::from([INBOX.to_string()]);
            if self.pref().flag(prefs::NAV_POLL_ALL, false) {
                poll.extend(self.get_list(true).into_iter().map(|entry| entry.name));
            } else {
                poll.extend(self.pref().list(prefs::NAV_POLL));
            }
            self.poll = Some(poll);
        }
        self.poll.get_or_insert_with(BTreeSet::new)
    }

    fn expanded_set(&mut self) -> &mut BTreeSet<String> {
        if self.expanded.is_none() {
            self.expanded = Some(self.pref().list(prefs::EXPANDED_FOLDERS));
        }
        self.expanded.get_or_insert_with(BTreeSet::new)
    }

    fn modify_expanded(&mut self, value: &str, open: bool) {
        let expanded = self.expanded_set();
        let changed = if open {
            expanded.insert(value.to_string())
        } else {
            expanded.remove(value)
        };
        if changed {
            let snapshot = expanded.clone();
            self.pref().set_list(prefs::EXPANDED_FOLDERS, &snapshot);
        }
    }

    /// Full path for a new mailbox called `new` below `parent`.
    ///
    /// An empty `parent` means the default personal namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mailbox`] if mailboxes cannot be created directly
    /// below `parent`.
    pub fn create_mailbox_name(&self, parent: &str, new: &str) -> Result<String> {
        let ns = if parent.is_empty() {
            self.state.namespaces.default_namespace()
        } else {
            self.namespace_of(parent)
        };

        let Some(ns) = ns else {
            let under_header = self.get(parent).is_some_and(MailboxElement::is_namespace);
            let foreign = self
                .namespace_of(new)
                .is_some_and(|ns| ns.kind != NamespaceKind::Personal);
            if under_header && foreign {
                return Ok(new.to_string());
            }
            return Err(Error::Mailbox(format!(
                "Cannot directly create mailbox in {}",
                self.get(parent).map_or(parent, |elt| elt.label.as_str())
            )));
        };

        let mut mailbox = ns.name.clone();
        if !parent.is_empty() {
            let relative = parent
                .strip_prefix(ns.name.as_str())
                .unwrap_or(if parent == ns.root() { "" } else { parent });
            mailbox.push_str(relative);
            let trimmed = mailbox.trim_end_matches(ns.delimiter.as_str()).len();
            mailbox.truncate(trimmed);
            mailbox.push_str(&ns.delimiter);
        }
        mailbox.push_str(new);
        Ok(mailbox)
    }

    /// Namespace of a real mailbox; synthetic elements have none.
    fn namespace_of(&self, name: &str) -> Option<&Namespace> {
        if [OTHER_KEY, SHARED_KEY, VFOLDER_KEY].contains(&name) || self.vfolder_id(name).is_some()
        {
            return None;
        }
        self.state.namespaces.resolve(name)
    }

    fn delimiter_for(&self, name: &str) -> String {
        self.namespace_of(name)
            .map_or_else(|| self.state.delimiter.clone(), |ns| ns.delimiter.clone())
    }

    /// Server listing for the current namespaces, cached per view.
    ///
    /// INBOX is always part of the result if the server has it.
    fn get_list(&mut self, show_unsub: bool) -> Vec<ListEntry> {
        let cached = if show_unsub {
            self.full_list.as_ref()
        } else {
            self.subscribed_list.as_ref()
        };
        if let Some(cached) = cached {
            return cached.values().cloned().collect();
        }

        let mut patterns: Vec<String> = self
            .state
            .namespaces
            .namespaces()
            .iter()
            .map(|ns| format!("{}*", ns.name))
            .collect();
        if patterns.is_empty() {
            patterns.push("*".to_string());
        }

        let mut result = self.lister.list(&patterns, show_unsub).unwrap_or_else(|e| {
            warn!("Mailbox listing failed: {}", e);
            Vec::new()
        });

        if !result.iter().any(|entry| entry.name.eq_ignore_ascii_case(INBOX)) {
            match self.lister.list(&[INBOX.to_string()], true) {
                Ok(mut inbox) => {
                    inbox.append(&mut result);
                    result = inbox;
                }
                Err(e) => warn!("INBOX listing failed: {}", e),
            }
        }

        let listing: IndexMap<String, ListEntry> = result
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
        let entries = listing.values().cloned().collect();
        if show_unsub {
            self.full_list = Some(listing);
        } else {
            self.subscribed_list = Some(listing);
        }
        entries
    }

    /// Whether the server lists `name` as subscribed.
    fn remote_subscribed(&mut self, name: &str) -> bool {
        if self.subscribed_list.is_none() {
            self.get_list(false);
        }
        self.subscribed_list
            .as_ref()
            .is_some_and(|list| list.contains_key(name))
    }

    fn forget_listing(&mut self, value: &str) {
        for list in [&mut self.subscribed_list, &mut self.full_list]
            .into_iter()
            .flatten()
        {
            list.shift_remove(value);
        }
    }

    /// Create a detached element for `name`.
    ///
    /// Depth, parent and label follow from the namespace the name lives
    /// in; poll and open state from the user's preferences.
    fn make_elt(&mut self, name: &str, attrs: EltAttrs) -> MailboxElement {
        let mut elt = MailboxElement::new(name, attrs);

        let polled = self.poll_set().contains(name);
        elt.set(EltAttrs::IS_POLLED, polled);

        let open = match self.pref().expand_mode() {
            ExpandMode::None => false,
            ExpandMode::All => true,
            ExpandMode::User => self.expanded_set().contains(name),
        };
        elt.set(EltAttrs::IS_OPEN, open);

        let ns = self.namespace_of(name).cloned();
        let delimiter = ns
            .as_ref()
            .map_or_else(|| self.state.delimiter.clone(), |ns| ns.delimiter.clone());
        let parts: Vec<&str> = if delimiter.is_empty() {
            vec![name]
        } else {
            name.split(delimiter.as_str()).collect()
        };

        elt.depth = parts.len() - 1;
        elt.label = if name == INBOX {
            "Inbox".to_string()
        } else {
            parts.last().copied().unwrap_or(name).to_string()
        };

        elt.set(EltAttrs::INVISIBLE, self.config.hidden.contains(name));

        if elt.depth != 0 {
            elt.parent = parts[..elt.depth].join(delimiter.as_str());
        }

        let Some(ns) = ns else {
            return elt;
        };

        match ns.kind {
            NamespaceKind::Personal => {
                if !ns.name.is_empty() && elt.depth != 0 {
                    elt.depth -= 1;
                    if !elt.parent.contains(ns.delimiter.as_str()) {
                        elt.parent = BASE_ELT.to_string();
                    }
                }
            }
            NamespaceKind::Other | NamespaceKind::Shared => {
                if ns.root() == name {
                    elt.attrs |= EltAttrs::NOSELECT | EltAttrs::NAMESPACE;
                }

                if self.pref().tree_view() {
                    let header = if ns.kind == NamespaceKind::Other {
                        OTHER_KEY
                    } else {
                        SHARED_KEY
                    };
                    let hidden_header = self
                        .state
                        .elements
                        .get(header)
                        .is_some_and(|h| h.has(EltAttrs::NOSHOW));

                    if elt.depth == 0 {
                        elt.parent = header.to_string();
                        elt.depth += 1;
                    } else if hidden_header {
                        if elt.depth == 1 {
                            elt.parent = header.to_string();
                        }
                    } else {
                        elt.depth += 1;
                    }
                }
            }
        }

        elt
    }

    /// Link `elt` into the tree.
    ///
    /// Elements without a label, already present, or duplicating an
    /// existing name up to a trailing delimiter are ignored.
    fn insert_elt(&mut self, elt: MailboxElement) {
        if elt.label.is_empty() || self.state.elements.contains_key(&elt.value) {
            return;
        }

        // Some servers list both "foo" and "foo/".
        let delimiter = self.delimiter_for(&elt.value);
        if !delimiter.is_empty() {
            let trimmed = elt.value.trim_end_matches(delimiter.as_str());
            if trimmed != elt.value && self.state.elements.contains_key(trimmed) {
                return;
            }
        }

        self.changed = true;

        let siblings = self.state.children.entry(elt.parent.clone()).or_default();
        let first_child = siblings.is_empty();
        siblings.push(elt.value.clone());
        let count = siblings.len();

        if first_child {
            self.diff.record_change(&elt.parent);
        }
        self.diff.record_add(&elt.value);

        if count > 1 {
            if let Some(parent) = self.state.elements.get_mut(&elt.parent) {
                parent.set(EltAttrs::NEED_SORT, true);
            }
        }

        self.state.elements.insert(elt.value.clone(), elt);
    }

    /// Unlink `value` from the tree. Returns whether its parent was left
    /// without children.
    fn unlink(&mut self, value: &str) -> bool {
        let Some(elt) = self.state.elements.remove(value) else {
            return false;
        };
        self.diff.record_delete(value);

        let Some(siblings) = self.state.children.get_mut(&elt.parent) else {
            return false;
        };
        siblings.retain(|v| v != value);
        if siblings.is_empty() {
            self.state.children.remove(&elt.parent);
            true
        } else {
            false
        }
    }

    /// Sort the children of `value` if they were marked unsorted.
    pub(crate) fn sort_level(&mut self, value: &str) {
        let TreeState {
            elements, children, ..
        } = &mut self.state;

        let Some(elt) = elements.get(value) else {
            return;
        };
        if !elt.has(EltAttrs::NEED_SORT) {
            return;
        }
        let Some(kids) = children.get_mut(value).filter(|k| k.len() > 1) else {
            return;
        };

        sort::sort_siblings(kids, elements, value == BASE_ELT);
        if let Some(elt) = elements.get_mut(value) {
            elt.set(EltAttrs::NEED_SORT, false);
        }
        self.changed = true;
    }

    /// Start recording element changes.
    pub fn start_diff(&mut self) {
        self.diff.start();
    }

    /// Changes since [`MailboxTree::start_diff`]; `None` if tracking was
    /// not started or nothing changed.
    pub fn take_diff(&mut self) -> Option<EltDiff> {
        self.diff.drain()
    }

    /// The pending changes, without ending tracking.
    #[must_use]
    pub const fn pending_diff(&self) -> Option<&EltDiff> {
        self.diff.pending()
    }

    pub(crate) fn special_mailboxes(&self) -> &SpecialMailboxes {
        self.special
            .get_or_init(|| SpecialMailboxes::from_prefs(&self.pref(), &self.state.namespaces))
    }
}

/// Canonical spelling of a mailbox name: INBOX is always upper case.
pub(crate) fn convert_name(name: &str) -> String {
    if name.eq_ignore_ascii_case(INBOX) {
        INBOX.to_string()
    } else {
        name.to_string()
    }
}

/// Canonical spelling of a listed name, fixing the case of a leading
/// INBOX segment.
fn normalize_entry_name(entry: &ListEntry) -> String {
    let delimiter = entry.delimiter.as_str();
    if delimiter.is_empty() {
        return convert_name(&entry.name);
    }
    match entry.name.split_once(delimiter) {
        Some((first, rest)) if first.eq_ignore_ascii_case(INBOX) => {
            format!("{INBOX}{delimiter}{rest}")
        }
        _ => convert_name(&entry.name),
    }
}

fn entry_is_noselect(entry: &ListEntry) -> bool {
    entry.has(&MailboxAttr::NoSelect)
}
