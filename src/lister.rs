//! Remote mailbox listing
//!
//! [`RemoteLister`] is the boundary between the tree and the IMAP
//! server: LIST/LSUB, NAMESPACE and STATUS. [`SnapshotLister`] answers
//! those calls from a captured [`Snapshot`], which is how the tree is
//! fed from a live session (see `MailboxClient::snapshot`) and in tests.

use crate::error::{Error, Result};
use crate::flag::MailboxAttr;
use crate::namespace::{INBOX, Namespace, NamespaceKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

/// One mailbox from a LIST or LSUB response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub name: String,
    pub delimiter: String,
    #[serde(default)]
    pub attributes: Vec<MailboxAttr>,
}

impl ListEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, delimiter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delimiter: delimiter.into(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attr(mut self, attr: MailboxAttr) -> Self {
        self.attributes.push(attr);
        self
    }

    #[must_use]
    pub fn has(&self, attr: &MailboxAttr) -> bool {
        self.attributes.contains(attr)
    }
}

/// Message counts from a STATUS response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxStatus {
    pub unseen: u32,
    pub messages: u32,
    pub recent: u32,
}

/// Access to the server's mailbox hierarchy.
///
/// Calls are blocking from the tree's point of view. Errors are
/// reported here but the tree treats them as empty results.
pub trait RemoteLister {
    /// List mailboxes matching any of the IMAP `patterns` (`*` and `%`
    /// wildcards). With `include_unsubscribed` false only subscribed
    /// mailboxes are returned (LSUB semantics).
    fn list(&self, patterns: &[String], include_unsubscribed: bool) -> Result<Vec<ListEntry>>;

    fn list_namespaces(&self) -> Result<Vec<Namespace>>;

    fn status(&self, mailbox: &str) -> Result<MailboxStatus>;
}

impl<T: RemoteLister + ?Sized> RemoteLister for Arc<T> {
    fn list(&self, patterns: &[String], include_unsubscribed: bool) -> Result<Vec<ListEntry>> {
        (**self).list(patterns, include_unsubscribed)
    }

    fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        (**self).list_namespaces()
    }

    fn status(&self, mailbox: &str) -> Result<MailboxStatus> {
        (**self).status(mailbox)
    }
}

/// Captured server state: namespaces, every mailbox, the subscription
/// list and the STATUS counts that were fetched.
///
/// # Examples
///
/// ```
/// use imap_folder_tree::{NamespaceKind, Snapshot};
///
/// let snapshot = Snapshot::new()
///     .namespace("", "/", NamespaceKind::Personal)
///     .mailbox("INBOX", "/", true)
///     .mailbox("Archive", "/", false)
///     .status("INBOX", 3, 10, 1);
/// assert_eq!(snapshot.mailboxes.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub namespaces: Vec<Namespace>,
    pub mailboxes: Vec<ListEntry>,
    pub subscribed: BTreeSet<String>,
    pub status: HashMap<String, MailboxStatus>,
}

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn namespace(mut self, name: &str, delimiter: &str, kind: NamespaceKind) -> Self {
        self.namespaces.push(Namespace::new(name, delimiter, kind));
        self
    }

    #[must_use]
    pub fn mailbox(self, name: &str, delimiter: &str, subscribed: bool) -> Self {
        self.entry(ListEntry::new(name, delimiter), subscribed)
    }

    #[must_use]
    pub fn entry(mut self, entry: ListEntry, subscribed: bool) -> Self {
        if subscribed {
            self.subscribed.insert(entry.name.clone());
        }
        self.mailboxes.push(entry);
        self
    }

    #[must_use]
    pub fn status(mut self, name: &str, unseen: u32, messages: u32, recent: u32) -> Self {
        self.status.insert(
            name.to_string(),
            MailboxStatus {
                unseen,
                messages,
                recent,
            },
        );
        self
    }
}

/// A [`RemoteLister`] answering from an in-memory [`Snapshot`].
///
/// The snapshot can be changed after construction, which lets a shared
/// handle model server-side changes between tree operations.
#[derive(Debug, Default)]
pub struct SnapshotLister {
    inner: RwLock<Snapshot>,
}

impl SnapshotLister {
    #[must_use]
    pub const fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }

    /// A copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn add_mailbox(&self, entry: ListEntry, subscribed: bool) {
        let mut snap = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        snap.mailboxes.retain(|m| m.name != entry.name);
        if subscribed {
            snap.subscribed.insert(entry.name.clone());
        }
        snap.mailboxes.push(entry);
    }

    pub fn remove_mailbox(&self, name: &str) {
        let mut snap = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        snap.mailboxes.retain(|m| m.name != name);
        snap.subscribed.remove(name);
        snap.status.remove(name);
    }

    pub fn set_subscribed(&self, name: &str, subscribed: bool) {
        let mut snap = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if subscribed {
            snap.subscribed.insert(name.to_string());
        } else {
            snap.subscribed.remove(name);
        }
    }

    pub fn set_status(&self, name: &str, status: MailboxStatus) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .status
            .insert(name.to_string(), status);
    }
}

impl From<Snapshot> for SnapshotLister {
    fn from(snapshot: Snapshot) -> Self {
        Self::new(snapshot)
    }
}

impl RemoteLister for SnapshotLister {
    fn list(&self, patterns: &[String], include_unsubscribed: bool) -> Result<Vec<ListEntry>> {
        let snap = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        let entries = snap
            .mailboxes
            .iter()
            .filter(|entry| {
                patterns
                    .iter()
                    .any(|p| pattern_matches(p, &entry.name, &entry.delimiter))
            })
            .filter_map(|entry| {
                let subscribed = snap.subscribed.contains(&entry.name);
                if include_unsubscribed {
                    Some(entry.clone())
                } else if subscribed {
                    let mut entry = entry.clone();
                    if !entry.has(&MailboxAttr::Subscribed) {
                        entry.attributes.push(MailboxAttr::Subscribed);
                    }
                    Some(entry)
                } else {
                    None
                }
            })
            .collect();

        Ok(entries)
    }

    fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        Ok(self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .namespaces
            .clone())
    }

    fn status(&self, mailbox: &str) -> Result<MailboxStatus> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
            .get(mailbox)
            .copied()
            .ok_or_else(|| Error::Imap(format!("STATUS failed for {mailbox}")))
    }
}

/// Match a mailbox name against an IMAP LIST pattern.
///
/// `*` matches any run of characters, `%` any run that does not cross
/// the hierarchy delimiter. INBOX matches case-insensitively.
#[must_use]
pub fn pattern_matches(pattern: &str, name: &str, delimiter: &str) -> bool {
    if pattern.eq_ignore_ascii_case(INBOX) {
        return name.eq_ignore_ascii_case(INBOX);
    }

    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = name.chars().collect();
    let delim = delimiter.chars().next();

    // reachable[j]: pattern prefix consumed so far matches txt[..j]
    let mut reachable = vec![false; txt.len() + 1];
    reachable[0] = true;

    for &p in &pat {
        let mut next = vec![false; txt.len() + 1];
        match p {
            '*' | '%' => {
                let mut open = false;
                for j in 0..=txt.len() {
                    if reachable[j] {
                        open = true;
                    } else if p == '%' && j > 0 && Some(txt[j - 1]) == delim {
                        open = false;
                    }
                    next[j] = open;
                }
            }
            literal => {
                for j in 1..=txt.len() {
                    next[j] = reachable[j - 1] && txt[j - 1] == literal;
                }
            }
        }
        reachable = next;
    }

    reachable[txt.len()]
}
