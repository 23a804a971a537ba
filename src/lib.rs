//! IMAP mailbox tree library
//!
//! Keeps a cached, incrementally synchronized tree of a user's IMAP
//! mailboxes for a webmail-style folder pane: namespaces, containers,
//! subscriptions, polling, expansion state and virtual folders built
//! from saved searches. Every mutation is recorded so that callers can
//! send only the changed elements to a client (see
//! [`MailboxTree::mailbox_response`]).
//!
//! The tree does not talk to the server itself. [`MailboxClient`]
//! captures a [`Snapshot`] over STARTTLS, and a [`SnapshotLister`]
//! answers the tree's LIST, NAMESPACE and STATUS calls from it.

mod client;
mod config;
mod connection;
mod descriptor;
mod element;
mod error;
mod flag;
mod folder;
mod lister;
mod namespace;
pub mod prefs;
mod search;
mod tree;

pub use client::MailboxClient;
pub use config::{ImapConfig, MailboxIcon, Protocol, TreeConfig};
pub use descriptor::{ElementDescriptor, ElementInfo, MailboxResponse, VFolderKind};
pub use element::{BASE_ELT, EltAttrs, MailboxElement, OTHER_KEY, SHARED_KEY, VFOLDER_KEY};
pub use error::{Error, Result};
pub use flag::MailboxAttr;
pub use folder::{SpecialFolder, SpecialMailboxes};
pub use lister::{ListEntry, MailboxStatus, RemoteLister, Snapshot, SnapshotLister, pattern_matches};
pub use namespace::{INBOX, Namespace, NamespaceKind, NamespaceResolver};
pub use prefs::{ExpandMode, MemoryPrefs, PreferenceStore};
pub use search::{MemorySearches, SavedSearch, SearchKind, SearchRegistry};
pub use tree::{
    CursorState, DiffTracker, EltDiff, FolderListMask, FolderRow, MailboxTree, NextMask,
    Traversal, TreeCursor, natural_cmp,
};
