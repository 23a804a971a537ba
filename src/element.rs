//! Mailbox tree elements

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Value of the tree root.
///
/// NUL is the only 7-bit character IMAP forbids in mailbox names, so
/// the root can never collide with a real mailbox.
pub const BASE_ELT: &str = "\0";

/// Value of the virtual folder container.
pub const VFOLDER_KEY: &str = "vfolder\0";

/// Value of the "Shared Folders" namespace header.
pub const SHARED_KEY: &str = "shared\0";

/// Value of the "Other Users' Folders" namespace header.
pub const OTHER_KEY: &str = "other\0";

bitflags! {
    /// Attribute bits of a tree element.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EltAttrs: u16 {
        /// Not selectable; a container only.
        const NOSELECT      = 1;
        /// Roots a namespace.
        const NAMESPACE     = 1 << 1;
        /// Expanded in the UI.
        const IS_OPEN       = 1 << 2;
        const IS_SUBSCRIBED = 1 << 3;
        /// Namespace header hidden because it would hold a single namespace.
        const NOSHOW        = 1 << 4;
        const IS_POLLED     = 1 << 5;
        /// Children must be re-sorted before the next traversal.
        const NEED_SORT     = 1 << 6;
        const VFOLDER       = 1 << 7;
        /// Synthetic element with no IMAP mailbox behind it.
        const NONIMAP       = 1 << 8;
        const INVISIBLE     = 1 << 9;
    }
}

/// A single node of the mailbox tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxElement {
    /// Full mailbox path; also the element's key in the tree.
    #[serde(rename = "v")]
    pub value: String,
    #[serde(rename = "l")]
    pub label: String,
    #[serde(rename = "p")]
    pub parent: String,
    /// Nesting level below the namespace root.
    #[serde(rename = "c")]
    pub depth: usize,
    #[serde(rename = "a")]
    pub attrs: EltAttrs,
}

impl MailboxElement {
    /// A top-level element labelled with its own value.
    #[must_use]
    pub fn new(value: impl Into<String>, attrs: EltAttrs) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            parent: BASE_ELT.to_string(),
            depth: 0,
            attrs,
        }
    }

    pub(crate) fn root() -> Self {
        Self {
            value: BASE_ELT.to_string(),
            label: String::new(),
            parent: BASE_ELT.to_string(),
            depth: 0,
            attrs: EltAttrs::NEED_SORT,
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.value == BASE_ELT
    }

    #[must_use]
    pub const fn has(&self, attr: EltAttrs) -> bool {
        self.attrs.contains(attr)
    }

    pub fn set(&mut self, attr: EltAttrs, on: bool) {
        self.attrs.set(attr, on);
    }

    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        self.has(EltAttrs::IS_SUBSCRIBED)
    }

    #[must_use]
    pub const fn is_namespace(&self) -> bool {
        self.has(EltAttrs::NAMESPACE)
    }

    #[must_use]
    pub const fn is_vfolder(&self) -> bool {
        self.has(EltAttrs::VFOLDER)
    }

    #[must_use]
    pub const fn is_nonimap(&self) -> bool {
        self.has(EltAttrs::NONIMAP)
    }

    #[must_use]
    pub const fn is_invisible(&self) -> bool {
        self.has(EltAttrs::INVISIBLE)
    }

    /// Whether the element sits directly below the root.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent == BASE_ELT
    }
}
