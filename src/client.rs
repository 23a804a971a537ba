//! Async IMAP client that captures the mailbox hierarchy

use crate::config::ImapConfig;
use crate::connection::{self, ImapSession};
use crate::error::{Error, Result};
use crate::flag::MailboxAttr;
use crate::lister::{ListEntry, MailboxStatus, Snapshot};
use crate::namespace::{INBOX, Namespace, NamespaceKind};
use async_imap::types::{Name, NameAttribute};
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

/// IMAP client feeding the mailbox tree.
///
/// Each operation opens its own session and logs out when done. The
/// tree itself never talks to the server: it is fed a [`Snapshot`]
/// through a [`SnapshotLister`](crate::SnapshotLister).
pub struct MailboxClient {
    config: ImapConfig,
}

impl MailboxClient {
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self { config }
    }

    /// Capture the server's namespaces, mailboxes and subscriptions,
    /// plus STATUS counts for INBOX and every mailbox in `poll`.
    ///
    /// STATUS failures for single mailboxes are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, LIST or LSUB fails.
    pub async fn snapshot<S: AsRef<str>>(&self, poll: &[S]) -> Result<Snapshot> {
        let mut session = connection::connect(&self.config).await?;

        let delimiter = root_delimiter(&mut session).await?;
        let mailboxes = list(&mut session, false).await?;
        let subscribed = list(&mut session, true)
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect();

        let mut snapshot = Snapshot {
            namespaces: derive_namespaces(delimiter.as_deref(), &mailboxes),
            mailboxes,
            subscribed,
            ..Snapshot::default()
        };

        let mut polled: Vec<&str> = vec![INBOX];
        polled.extend(poll.iter().map(AsRef::as_ref).filter(|m| *m != INBOX));
        for mailbox in polled {
            if !snapshot.mailboxes.iter().any(|entry| entry.name == mailbox) {
                debug!("Not polling {}: not listed by the server", mailbox);
                continue;
            }
            match status(&mut session, mailbox).await {
                Ok(status) => {
                    snapshot.status.insert(mailbox.to_string(), status);
                }
                Err(e) => warn!("{}", e),
            }
        }

        connection::logout(session).await;
        info!(
            "Captured {} mailbox(es), {} subscribed",
            snapshot.mailboxes.len(),
            snapshot.subscribed.len()
        );
        Ok(snapshot)
    }

    /// The namespaces the server's hierarchy implies.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or LIST fails.
    pub async fn namespaces(&self) -> Result<Vec<Namespace>> {
        let mut session = connection::connect(&self.config).await?;
        let delimiter = root_delimiter(&mut session).await?;
        let mailboxes = list(&mut session, false).await?;
        connection::logout(session).await;
        Ok(derive_namespaces(delimiter.as_deref(), &mailboxes))
    }

    /// SUBSCRIBE to `mailbox`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or SUBSCRIBE fails.
    pub async fn subscribe(&self, mailbox: &str) -> Result<()> {
        let mut session = connection::connect(&self.config).await?;
        session
            .subscribe(mailbox)
            .await
            .map_err(|e| Error::Imap(format!("Subscribe to {mailbox} failed: {e}")))?;
        connection::logout(session).await;
        Ok(())
    }

    /// UNSUBSCRIBE from `mailbox`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or UNSUBSCRIBE fails.
    pub async fn unsubscribe(&self, mailbox: &str) -> Result<()> {
        let mut session = connection::connect(&self.config).await?;
        session
            .unsubscribe(mailbox)
            .await
            .map_err(|e| Error::Imap(format!("Unsubscribe from {mailbox} failed: {e}")))?;
        connection::logout(session).await;
        Ok(())
    }
}

/// LIST (or LSUB) everything below the empty reference.
async fn list(session: &mut ImapSession, subscribed_only: bool) -> Result<Vec<ListEntry>> {
    if subscribed_only {
        let stream = session
            .lsub(Some(""), Some("*"))
            .await
            .map_err(|e| Error::Imap(format!("LSUB failed: {e}")))?;
        Ok(collect_entries(stream, "LSUB").await)
    } else {
        let stream = session
            .list(Some(""), Some("*"))
            .await
            .map_err(|e| Error::Imap(format!("LIST failed: {e}")))?;
        Ok(collect_entries(stream, "LIST").await)
    }
}

async fn collect_entries<S>(mut stream: S, command: &str) -> Vec<ListEntry>
where
    S: Stream<Item = async_imap::error::Result<Name>> + Unpin,
{
    let mut entries = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(name) => entries.push(list_entry(&name)),
            Err(e) => warn!("Skipping malformed {} response: {}", command, e),
        }
    }
    entries
}

async fn status(session: &mut ImapSession, mailbox: &str) -> Result<MailboxStatus> {
    let status = session
        .status(mailbox, "(MESSAGES RECENT UNSEEN)")
        .await
        .map_err(|e| Error::Imap(format!("STATUS failed for {mailbox}: {e}")))?;
    Ok(MailboxStatus {
        unseen: status.unseen.unwrap_or(0),
        messages: status.exists,
        recent: status.recent,
    })
}

/// The hierarchy delimiter of the root, from `LIST "" ""`.
async fn root_delimiter(session: &mut ImapSession) -> Result<Option<String>> {
    let stream = session
        .list(Some(""), None)
        .await
        .map_err(|e| Error::Imap(format!("LIST for the root delimiter failed: {e}")))?;
    Ok(collect_entries(stream, "LIST")
        .await
        .into_iter()
        .next()
        .map(|entry| entry.delimiter))
}

fn list_entry(name: &Name) -> ListEntry {
    ListEntry {
        name: name.name().to_string(),
        delimiter: name.delimiter().unwrap_or_default().to_string(),
        attributes: name.attributes().iter().filter_map(mailbox_attr).collect(),
    }
}

fn mailbox_attr(attr: &NameAttribute<'_>) -> Option<MailboxAttr> {
    let attr = match attr {
        NameAttribute::NoInferiors => MailboxAttr::NoInferiors,
        NameAttribute::NoSelect => MailboxAttr::NoSelect,
        NameAttribute::Marked => MailboxAttr::Marked,
        NameAttribute::Unmarked => MailboxAttr::Unmarked,
        NameAttribute::All => MailboxAttr::Extension("\\All".into()),
        NameAttribute::Archive => MailboxAttr::Extension("\\Archive".into()),
        NameAttribute::Drafts => MailboxAttr::Extension("\\Drafts".into()),
        NameAttribute::Flagged => MailboxAttr::Extension("\\Flagged".into()),
        NameAttribute::Junk => MailboxAttr::Extension("\\Junk".into()),
        NameAttribute::Sent => MailboxAttr::Extension("\\Sent".into()),
        NameAttribute::Trash => MailboxAttr::Extension("\\Trash".into()),
        NameAttribute::Extension(label) => MailboxAttr::from(label.as_ref()),
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(attr)
}

/// Namespaces implied by the hierarchy.
///
/// async-imap cannot parse NAMESPACE responses, so the personal
/// namespace is derived from the root delimiter (`LIST "" ""`) and the
/// listed names: a server that keeps every mailbox below `INBOX.` uses
/// that as its personal prefix. Top-level `#name` hierarchies become
/// shared namespaces.
fn derive_namespaces(root_delimiter: Option<&str>, mailboxes: &[ListEntry]) -> Vec<Namespace> {
    let delimiter = root_delimiter
        .filter(|d| !d.is_empty())
        .or_else(|| {
            mailboxes
                .iter()
                .map(|entry| entry.delimiter.as_str())
                .find(|d| !d.is_empty())
        })
        .unwrap_or_default()
        .to_string();

    let mut shared: Vec<String> = Vec::new();
    let mut personal = Vec::new();
    for entry in mailboxes {
        if let Some(rest) = entry.name.strip_prefix('#') {
            let root = match rest.split_once(delimiter.as_str()) {
                Some((root, _)) if !delimiter.is_empty() => root,
                _ => rest,
            };
            let prefix = format!("#{root}{delimiter}");
            if !shared.contains(&prefix) {
                shared.push(prefix);
            }
        } else if !entry.name.eq_ignore_ascii_case(INBOX) {
            personal.push(entry.name.as_str());
        }
    }

    let inbox_prefix = format!("{INBOX}{delimiter}");
    let prefix = if !delimiter.is_empty()
        && !personal.is_empty()
        && personal.iter().all(|name| {
            name.get(..inbox_prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(&inbox_prefix))
        }) {
        inbox_prefix
    } else {
        String::new()
    };

    let mut namespaces = vec![Namespace::new(prefix, delimiter.clone(), NamespaceKind::Personal)];
    namespaces.extend(
        shared
            .into_iter()
            .map(|prefix| Namespace::new(prefix, delimiter.clone(), NamespaceKind::Shared)),
    );
    debug!("Derived namespaces: {:?}", namespaces);
    namespaces
}
