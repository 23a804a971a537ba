//! LIST and LSUB command handlers.
//!
//! LIST answers with one `* LIST` line per matching folder, carrying
//! `\Noselect` and the RFC 3348 child attributes. An empty pattern
//! asks for the hierarchy delimiter only (RFC 3501 Section 6.3.8):
//!
//! ```text
//! A0002 LIST "" ""
//! * LIST (\Noselect) "/" ""
//! A0002 OK LIST completed
//! ```
//!
//! LSUB answers with the subscribed folders only.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle LIST (`subscribed_only` false) or LSUB.
pub async fn handle_list<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    pattern: &str,
    subscribed_only: bool,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) {
    let command = if subscribed_only { "LSUB" } else { "LIST" };
    let delimiter = quote(&mailbox.delimiter);

    if pattern.is_empty() {
        if !subscribed_only {
            let line = format!("* LIST (\\Noselect) {delimiter} \"\"\r\n");
            if write_line(stream, &line).await.is_err() {
                return;
            }
        }
    } else {
        for folder in mailbox.matching(pattern) {
            if subscribed_only && !folder.subscribed {
                continue;
            }

            let mut attrs = Vec::new();
            if !folder.selectable {
                attrs.push("\\Noselect");
            }
            if !subscribed_only {
                attrs.push(if mailbox.has_children(&folder.name) {
                    "\\HasChildren"
                } else {
                    "\\HasNoChildren"
                });
            }

            let line = format!(
                "* {command} ({}) {delimiter} {}\r\n",
                attrs.join(" "),
                quote(&folder.name)
            );
            if write_line(stream, &line).await.is_err() {
                return;
            }
        }
    }

    let resp = format!("{tag} OK {command} completed\r\n");
    let _ = write_line(stream, &resp).await;
}

/// IMAP quoted string.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, pattern: &str, subscribed_only: bool, mailbox: &Mailbox) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_list(tag, pattern, subscribed_only, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn hierarchy() -> Mailbox {
        MailboxBuilder::new()
            .folder("INBOX")
            .folder("Archive")
            .noselect()
            .folder("Archive/2020")
            .folder("Junk")
            .unsubscribed()
            .build()
    }

    #[tokio::test]
    async fn lists_all_folders_with_child_attributes() {
        let output = run("A1", "*", false, &hierarchy()).await;

        assert!(output.contains("* LIST (\\HasNoChildren) \"/\" \"INBOX\"\r\n"));
        assert!(output.contains("* LIST (\\Noselect \\HasChildren) \"/\" \"Archive\"\r\n"));
        assert!(output.contains("\"Archive/2020\""));
        assert!(output.contains("\"Junk\""));
        assert!(output.ends_with("A1 OK LIST completed\r\n"));
    }

    #[tokio::test]
    async fn percent_stays_on_one_level() {
        let output = run("A2", "%", false, &hierarchy()).await;
        assert!(output.contains("\"Archive\""));
        assert!(!output.contains("\"Archive/2020\""));
    }

    #[tokio::test]
    async fn empty_pattern_reports_delimiter() {
        let mailbox = MailboxBuilder::new().delimiter(".").folder("INBOX").build();
        let output = run("A3", "", false, &mailbox).await;
        assert_eq!(output, "* LIST (\\Noselect) \".\" \"\"\r\nA3 OK LIST completed\r\n");
    }

    #[tokio::test]
    async fn lsub_skips_unsubscribed() {
        let output = run("A4", "*", true, &hierarchy()).await;
        assert!(output.contains("* LSUB () \"/\" \"INBOX\"\r\n"));
        assert!(!output.contains("\"Junk\""));
        assert!(output.ends_with("A4 OK LSUB completed\r\n"));
    }

    #[tokio::test]
    async fn empty_mailbox_returns_only_ok() {
        let mailbox = MailboxBuilder::new().build();
        let output = run("T2", "*", false, &mailbox).await;

        assert_eq!(output, "T2 OK LIST completed\r\n");
    }
}
