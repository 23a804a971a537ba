//! STATUS command handler.
//!
//! Always reports MESSAGES, RECENT and UNSEEN, whatever items were
//! asked for:
//!
//! ```text
//! A0005 STATUS "INBOX" (MESSAGES RECENT UNSEEN)
//! * STATUS "INBOX" (MESSAGES 10 RECENT 1 UNSEEN 3)
//! A0005 OK STATUS completed
//! ```

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the STATUS command. Unknown and `\Noselect` folders get NO.
pub async fn handle_status<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    name: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) {
    let Some(folder) = mailbox.get_folder(name).filter(|f| f.selectable) else {
        let resp = format!("{tag} NO [NONEXISTENT] Mailbox does not exist\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };

    let line = format!(
        "* STATUS \"{}\" (MESSAGES {} RECENT {} UNSEEN {})\r\n",
        folder.name, folder.messages, folder.recent, folder.unseen
    );
    if write_line(stream, &line).await.is_err() {
        return;
    }
    let resp = format!("{tag} OK STATUS completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, name: &str, mailbox: &Mailbox) -> String {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        handle_status(tag, name, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn reports_counts() {
        let mailbox = MailboxBuilder::new().folder("INBOX").status(10, 1, 3).build();
        let output = run("S1", "INBOX", &mailbox).await;
        assert_eq!(
            output,
            "* STATUS \"INBOX\" (MESSAGES 10 RECENT 1 UNSEEN 3)\r\nS1 OK STATUS completed\r\n"
        );
    }

    #[tokio::test]
    async fn unknown_or_noselect_is_no() {
        let mailbox = MailboxBuilder::new().folder("Archive").noselect().build();
        assert!(run("S2", "Archive", &mailbox).await.starts_with("S2 NO "));
        assert!(run("S3", "Missing", &mailbox).await.starts_with("S3 NO "));
    }
}
