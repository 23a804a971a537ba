//! Test data model for the fake IMAP server
//!
//! Provides a builder-style API for constructing a mailbox hierarchy:
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .folder("INBOX").status(10, 1, 3)
//!     .folder("Archive").noselect()
//!     .folder("Archive/2020")
//!     .folder("Junk").unsubscribed()
//!     .build();
//! ```
//!
//! The `Mailbox` is shared with the fake IMAP server behind a `Mutex`
//! so SUBSCRIBE and UNSUBSCRIBE persist across connections.

use imap_folder_tree::pattern_matches;

/// A user's complete hierarchy plus the credentials it is served for.
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub username: String,
    pub password: String,
    pub delimiter: String,
    pub folders: Vec<Folder>,
}

impl Mailbox {
    /// Look up a folder by name. INBOX is case-insensitive, everything
    /// else is not, matching real IMAP.
    pub fn get_folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| same_name(&f.name, name))
    }

    pub fn get_folder_mut(&mut self, name: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| same_name(&f.name, name))
    }

    /// Whether any folder lives below `name`.
    pub fn has_children(&self, name: &str) -> bool {
        let prefix = format!("{name}{}", self.delimiter);
        self.folders.iter().any(|f| f.name.starts_with(&prefix))
    }

    /// Folders matching a LIST pattern, in creation order.
    pub fn matching<'a>(&'a self, pattern: &'a str) -> impl Iterator<Item = &'a Folder> + 'a {
        self.folders
            .iter()
            .filter(move |f| pattern_matches(pattern, &f.name, &self.delimiter))
    }
}

fn same_name(a: &str, b: &str) -> bool {
    if a.eq_ignore_ascii_case("INBOX") {
        b.eq_ignore_ascii_case("INBOX")
    } else {
        a == b
    }
}

/// A single IMAP folder with its subscription state and counts.
#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    pub subscribed: bool,
    /// False for `\Noselect` hierarchy nodes.
    pub selectable: bool,
    pub messages: u32,
    pub recent: u32,
    pub unseen: u32,
}

/// Builder for constructing a `Mailbox` step by step.
///
/// Call `.folder(name)` to start a new folder, then chain modifiers
/// (`.unsubscribed()`, `.noselect()`, `.status(..)`) that apply to it.
/// Finish with `.build()` to get the final `Mailbox`.
pub struct MailboxBuilder {
    mailbox: Mailbox,
}

impl MailboxBuilder {
    /// An empty hierarchy with `/` as delimiter, served to
    /// `testuser` / `testpass`.
    pub fn new() -> Self {
        Self {
            mailbox: Mailbox {
                username: "testuser".to_string(),
                password: "testpass".to_string(),
                delimiter: "/".to_string(),
                folders: Vec::new(),
            },
        }
    }

    pub fn delimiter(mut self, delimiter: &str) -> Self {
        self.mailbox.delimiter = delimiter.to_string();
        self
    }

    /// Add a subscribed, selectable, empty folder. Subsequent
    /// modifiers apply to it.
    pub fn folder(mut self, name: &str) -> Self {
        self.mailbox.folders.push(Folder {
            name: name.to_string(),
            subscribed: true,
            selectable: true,
            messages: 0,
            recent: 0,
            unseen: 0,
        });
        self
    }

    pub fn unsubscribed(self) -> Self {
        self.modify(|f| f.subscribed = false)
    }

    pub fn noselect(self) -> Self {
        self.modify(|f| f.selectable = false)
    }

    pub fn status(self, messages: u32, recent: u32, unseen: u32) -> Self {
        self.modify(|f| {
            f.messages = messages;
            f.recent = recent;
            f.unseen = unseen;
        })
    }

    /// # Panics
    ///
    /// Panics if called before any `.folder()` call.
    fn modify(mut self, change: impl FnOnce(&mut Folder)) -> Self {
        change(
            self.mailbox
                .folders
                .last_mut()
                .expect("call .folder() before modifying it"),
        );
        self
    }

    /// Consume the builder and return the finished `Mailbox`.
    pub fn build(self) -> Mailbox {
        self.mailbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_apply_to_last_folder() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .status(10, 1, 3)
            .folder("Junk")
            .unsubscribed()
            .build();

        let inbox = mailbox.get_folder("inbox").unwrap();
        assert_eq!((inbox.messages, inbox.recent, inbox.unseen), (10, 1, 3));
        assert!(inbox.subscribed);
        assert!(!mailbox.get_folder("Junk").unwrap().subscribed);
        assert!(mailbox.get_folder("junk").is_none());
    }

    #[test]
    fn children_and_patterns() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .folder("Work")
            .folder("Work/Reports")
            .build();

        assert!(mailbox.has_children("Work"));
        assert!(!mailbox.has_children("Work/Reports"));
        let top: Vec<&str> = mailbox.matching("%").map(|f| f.name.as_str()).collect();
        assert_eq!(top, vec!["INBOX", "Work"]);
    }
}
