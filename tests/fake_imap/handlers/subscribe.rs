//! SUBSCRIBE and UNSUBSCRIBE command handlers.
//!
//! These are the only handlers that change the mailbox, so they take
//! the shared `Mutex` and lock it just long enough to flip the flag.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle SUBSCRIBE (`subscribe` true) or UNSUBSCRIBE.
pub async fn handle_subscribe<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    name: &str,
    subscribe: bool,
    mailbox: &Mutex<Mailbox>,
    stream: &mut BufReader<S>,
) {
    let command = if subscribe { "SUBSCRIBE" } else { "UNSUBSCRIBE" };
    let found = {
        let mut mailbox = mailbox.lock().unwrap();
        mailbox
            .get_folder_mut(name)
            .map(|folder| folder.subscribed = subscribe)
            .is_some()
    };

    let resp = if found {
        format!("{tag} OK {command} completed\r\n")
    } else {
        format!("{tag} NO [NONEXISTENT] Mailbox does not exist\r\n")
    };
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, name: &str, subscribe: bool, mailbox: &Mutex<Mailbox>) -> String {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        handle_subscribe(tag, name, subscribe, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn toggles_subscription() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("Junk").unsubscribed().build());

        let output = run("U1", "Junk", true, &mailbox).await;
        assert_eq!(output, "U1 OK SUBSCRIBE completed\r\n");
        assert!(mailbox.lock().unwrap().get_folder("Junk").unwrap().subscribed);

        let output = run("U2", "Junk", false, &mailbox).await;
        assert_eq!(output, "U2 OK UNSUBSCRIBE completed\r\n");
        assert!(!mailbox.lock().unwrap().get_folder("Junk").unwrap().subscribed);
    }

    #[tokio::test]
    async fn unknown_folder_is_no() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("INBOX").build());
        let output = run("U3", "Missing", true, &mailbox).await;
        assert!(output.starts_with("U3 NO "));
    }
}
