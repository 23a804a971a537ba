//! IMAP namespace resolution
//!
//! Maps mailbox paths to the namespace (RFC 2342) they live in and
//! converts between the full server path and the portable form kept
//! in preferences.

use serde::{Deserialize, Serialize};

/// The canonical name of the INBOX mailbox.
pub const INBOX: &str = "INBOX";

/// Which part of the server hierarchy a namespace covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    Personal,
    Other,
    Shared,
}

/// One namespace as reported by the server's NAMESPACE response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// The prefix, including its trailing delimiter (e.g. `INBOX.`).
    pub name: String,
    pub delimiter: String,
    pub kind: NamespaceKind,
}

impl Namespace {
    #[must_use]
    pub fn new(name: impl Into<String>, delimiter: impl Into<String>, kind: NamespaceKind) -> Self {
        Self {
            name: name.into(),
            delimiter: delimiter.into(),
            kind,
        }
    }

    /// The namespace prefix without its trailing delimiter.
    ///
    /// For `#shared/` this is `#shared`, the name of the mailbox that
    /// roots the namespace.
    #[must_use]
    pub fn root(&self) -> &str {
        self.name
            .strip_suffix(self.delimiter.as_str())
            .unwrap_or(&self.name)
    }
}

/// Resolves mailbox paths against the configured namespaces.
///
/// An empty resolver means namespaces are unavailable (POP3, or folders
/// disabled) and every lookup yields `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceResolver {
    namespaces: Vec<Namespace>,
}

impl NamespaceResolver {
    #[must_use]
    pub const fn new(namespaces: Vec<Namespace>) -> Self {
        Self { namespaces }
    }

    #[must_use]
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Find the namespace `path` belongs to.
    ///
    /// The longest matching prefix wins; a path matching no prefix falls
    /// into the empty-prefix namespace if the server has one.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&Namespace> {
        self.namespaces
            .iter()
            .filter(|ns| !ns.name.is_empty())
            .filter(|ns| {
                path.starts_with(ns.name.as_str())
                    || format!("{path}{}", ns.delimiter) == ns.name
            })
            .max_by_key(|ns| ns.name.len())
            .or_else(|| self.empty_namespace())
    }

    /// The first personal namespace.
    #[must_use]
    pub fn default_namespace(&self) -> Option<&Namespace> {
        self.namespaces
            .iter()
            .find(|ns| ns.kind == NamespaceKind::Personal)
    }

    /// The namespace with an empty prefix, if any.
    #[must_use]
    pub fn empty_namespace(&self) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name.is_empty())
    }

    /// The hierarchy delimiter that applies to `path`.
    #[must_use]
    pub fn delimiter(&self, path: &str) -> Option<&str> {
        self.resolve(path).map(|ns| ns.delimiter.as_str())
    }

    /// Convert a full server path into its preference-storage form.
    ///
    /// Paths in the default personal namespace lose their prefix, paths
    /// in the empty-prefix namespace gain a leading delimiter. Whenever
    /// the shortened form would read back as a different mailbox the
    /// path is kept (or escaped) so that
    /// `to_display_form(to_storage_form(p)) == p`.
    #[must_use]
    pub fn to_storage_form(&self, path: &str) -> String {
        if path == INBOX {
            return path.to_string();
        }

        let escaped = self
            .empty_namespace()
            .map(|empty| format!("{}{path}", empty.delimiter));
        let default = self.default_namespace().map(|ns| ns.name.as_str());
        let empty = self.empty_namespace().map(|ns| ns.name.as_str());

        let candidate = match self.resolve(path) {
            Some(ns) if Some(ns.name.as_str()) == default => path
                .strip_prefix(ns.name.as_str())
                .unwrap_or(path)
                .to_string(),
            Some(ns) if Some(ns.name.as_str()) == empty => {
                escaped.clone().unwrap_or_else(|| path.to_string())
            }
            _ => path.to_string(),
        };

        if self.to_display_form(&candidate) == path {
            candidate
        } else {
            escaped
                .filter(|e| self.to_display_form(e) == path)
                .unwrap_or_else(|| path.to_string())
        }
    }

    /// Convert a preference-storage form back into the full server path.
    #[must_use]
    pub fn to_display_form(&self, stored: &str) -> String {
        if stored == INBOX {
            return stored.to_string();
        }

        if let Some(rest) = self
            .empty_namespace()
            .filter(|empty| !empty.delimiter.is_empty())
            .and_then(|empty| stored.strip_prefix(empty.delimiter.as_str()))
        {
            return rest.to_string();
        }

        match (self.resolve(stored), self.default_namespace()) {
            (None, Some(default)) => format!("{}{stored}", default.name),
            _ => stored.to_string(),
        }
    }

    /// The name shown to the user for `path`.
    ///
    /// INBOX reads "Inbox"; the default personal prefix is hidden.
    #[must_use]
    pub fn display_name(&self, path: &str) -> String {
        if path == INBOX {
            return "Inbox".to_string();
        }
        self.default_namespace()
            .filter(|ns| !ns.name.is_empty())
            .and_then(|ns| path.strip_prefix(ns.name.as_str()))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(path)
            .to_string()
    }
}
