//! Fake IMAP server for integration testing
//!
//! Serves a hierarchy built with [`MailboxBuilder`] over STARTTLS so
//! `MailboxClient` and the `folder-tree` binary can be tested against a
//! real socket.
//!
//! - `server`: listener, certificate and command loop
//! - `handlers/`: one module per command group
//! - `mailbox`: folders, subscriptions and counts
//! - `io`: line writing and argument splitting

mod handlers;
mod io;
pub mod mailbox;
mod server;

pub use mailbox::MailboxBuilder;
pub use server::FakeImapServer;
