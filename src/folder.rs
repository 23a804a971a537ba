//! Special-use mailboxes
//!
//! Provides a strongly-typed enum for the mailboxes that get their own
//! icon and styling in the folder list: INBOX plus the drafts, sent,
//! spam and trash mailboxes the user configured.

use crate::namespace::{INBOX, NamespaceResolver};
use crate::prefs::{self, Prefs};
use std::collections::BTreeSet;
use std::fmt;

/// A mailbox role with dedicated presentation.
///
/// # Examples
///
/// ```
/// use imap_folder_tree::SpecialFolder;
///
/// assert_eq!(SpecialFolder::Inbox.css_class(), "inboxImg");
/// assert_eq!(SpecialFolder::Sent.icon(), "folders/sent.png");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialFolder {
    /// The INBOX folder (RFC 3501 required, case-insensitive).
    Inbox,
    /// Sent messages.
    Sent,
    /// Draft messages.
    Drafts,
    /// Deleted messages.
    Trash,
    /// Spam / junk messages.
    Spam,
}

impl SpecialFolder {
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Inbox => "inboxImg",
            Self::Sent => "sentImg",
            Self::Drafts => "draftsImg",
            Self::Trash => "trashImg",
            Self::Spam => "spamImg",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Inbox => "folders/inbox.png",
            Self::Sent => "folders/sent.png",
            Self::Drafts => "folders/drafts.png",
            Self::Trash => "folders/trash.png",
            Self::Spam => "folders/spam.png",
        }
    }

    /// Icon alt text.
    #[must_use]
    pub const fn alt(self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Sent => "Sent mail folder",
            Self::Drafts => "Draft folder",
            Self::Trash => "Trash folder",
            Self::Spam => "Spam folder",
        }
    }
}

impl fmt::Display for SpecialFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alt())
    }
}

/// The user's special mailboxes, as full server paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialMailboxes {
    pub drafts: Option<String>,
    pub sent: BTreeSet<String>,
    pub spam: Option<String>,
    pub trash: Option<String>,
    /// Trash is handled by a virtual folder instead.
    pub virtual_trash: bool,
}

impl SpecialMailboxes {
    /// Read the special mailboxes from preferences.
    ///
    /// Preference values are in storage form and are expanded to full
    /// paths with `resolver`.
    pub(crate) fn from_prefs(prefs: &Prefs<'_>, resolver: &NamespaceResolver) -> Self {
        let expand = |key: &str| prefs.string(key).map(|v| resolver.to_display_form(&v));
        Self {
            drafts: expand(prefs::DRAFTS_FOLDER),
            sent: prefs
                .list(prefs::SENT_MAIL_FOLDERS)
                .iter()
                .map(|v| resolver.to_display_form(v))
                .collect(),
            spam: expand(prefs::SPAM_FOLDER),
            trash: expand(prefs::TRASH_FOLDER),
            virtual_trash: prefs.flag(prefs::USE_VTRASH, false),
        }
    }

    /// The role of `mailbox`, if it has one.
    #[must_use]
    pub fn classify(&self, mailbox: &str) -> Option<SpecialFolder> {
        if mailbox == INBOX {
            Some(SpecialFolder::Inbox)
        } else if self.trash.as_deref() == Some(mailbox) {
            (!self.virtual_trash).then_some(SpecialFolder::Trash)
        } else if self.drafts.as_deref() == Some(mailbox) {
            Some(SpecialFolder::Drafts)
        } else if self.spam.as_deref() == Some(mailbox) {
            Some(SpecialFolder::Spam)
        } else if self.sent.contains(mailbox) {
            Some(SpecialFolder::Sent)
        } else {
            None
        }
    }
}
