//! IMAP mailbox attributes
//!
//! Provides a strongly-typed enum for the attributes a server attaches
//! to LIST/LSUB responses instead of raw strings. Attributes the tree
//! acts on have dedicated variants; anything else is kept as
//! `Extension`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A mailbox attribute from a LIST or LSUB response.
///
/// Attribute names are case-insensitive on the wire; parsing
/// normalizes them.
///
/// # Examples
///
/// ```
/// use imap_folder_tree::MailboxAttr;
///
/// let attr = MailboxAttr::from("\\noselect");
/// assert_eq!(attr, MailboxAttr::NoSelect);
/// assert_eq!(attr.as_imap_str(), "\\Noselect");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MailboxAttr {
    /// The name is a hierarchy node only (`\Noselect`).
    NoSelect,
    /// No children can be created below it (`\Noinferiors`).
    NoInferiors,
    /// Listed although it does not exist (`\NonExistent`, RFC 5258).
    NonExistent,
    /// The user is subscribed (`\Subscribed`, RFC 5258).
    Subscribed,
    /// `\HasChildren` (RFC 3348).
    HasChildren,
    /// `\HasNoChildren` (RFC 3348).
    HasNoChildren,
    /// `\Marked`.
    Marked,
    /// `\Unmarked`.
    Unmarked,
    /// Any other attribute, including special-use ones.
    Extension(String),
}

impl MailboxAttr {
    /// The IMAP wire representation of this attribute.
    #[must_use]
    pub fn as_imap_str(&self) -> &str {
        match self {
            Self::NoSelect => "\\Noselect",
            Self::NoInferiors => "\\Noinferiors",
            Self::NonExistent => "\\NonExistent",
            Self::Subscribed => "\\Subscribed",
            Self::HasChildren => "\\HasChildren",
            Self::HasNoChildren => "\\HasNoChildren",
            Self::Marked => "\\Marked",
            Self::Unmarked => "\\Unmarked",
            Self::Extension(other) => other,
        }
    }
}

impl fmt::Display for MailboxAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_imap_str())
    }
}

impl From<&str> for MailboxAttr {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "\\noselect" => Self::NoSelect,
            "\\noinferiors" => Self::NoInferiors,
            "\\nonexistent" => Self::NonExistent,
            "\\subscribed" => Self::Subscribed,
            "\\haschildren" => Self::HasChildren,
            "\\hasnochildren" => Self::HasNoChildren,
            "\\marked" => Self::Marked,
            "\\unmarked" => Self::Unmarked,
            _ => Self::Extension(s.to_string()),
        }
    }
}

impl From<String> for MailboxAttr {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<MailboxAttr> for String {
    fn from(attr: MailboxAttr) -> Self {
        attr.as_imap_str().to_string()
    }
}
