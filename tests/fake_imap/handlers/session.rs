//! Session-level command handlers: CAPABILITY, LOGIN, NOOP, LOGOUT.
//!
//! None of these touch the folder hierarchy. LOGIN checks the
//! credentials the mailbox was built with so tests can exercise
//! authentication failures.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the CAPABILITY command.
pub async fn handle_capability<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    stream: &mut BufReader<S>,
) {
    let _ = write_line(stream, "* CAPABILITY IMAP4rev1 STARTTLS LIST-EXTENDED\r\n").await;
    let resp = format!("{tag} OK CAPABILITY completed\r\n");
    let _ = write_line(stream, &resp).await;
}

/// Handle the LOGIN command.
///
/// Replies NO unless `username` and `password` match the mailbox.
/// Returns false if the client could not be written to.
pub async fn handle_login<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    username: Option<&str>,
    password: Option<&str>,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> bool {
    let valid = username == Some(mailbox.username.as_str())
        && password == Some(mailbox.password.as_str());
    let resp = if valid {
        format!("{tag} OK LOGIN completed\r\n")
    } else {
        format!("{tag} NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
    };
    write_line(stream, &resp).await.is_ok()
}

/// Handle the NOOP command.
pub async fn handle_noop<S: AsyncRead + AsyncWrite + Unpin>(tag: &str, stream: &mut BufReader<S>) {
    let resp = format!("{tag} OK NOOP completed\r\n");
    let _ = write_line(stream, &resp).await;
}

/// Handle the LOGOUT command. Sends BYE + tagged OK.
pub async fn handle_logout<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    stream: &mut BufReader<S>,
) {
    let _ = write_line(stream, "* BYE Logging out\r\n").await;
    let resp = format!("{tag} OK LOGOUT completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::{BufReader, DuplexStream};

    /// Create a `BufReader` over an in-memory duplex stream, run the
    /// handler, and return what was written to the client.
    async fn run<F, Fut>(handler: F) -> String
    where
        F: FnOnce(BufReader<DuplexStream>) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let (client, server) = tokio::io::duplex(1024);
        handler(BufReader::new(server)).await;

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn login_accepts_matching_credentials() {
        let mailbox = MailboxBuilder::new().build();
        let output = run(|mut stream| async move {
            assert!(
                handle_login("A0001", Some("testuser"), Some("testpass"), &mailbox, &mut stream)
                    .await
            );
        })
        .await;
        assert_eq!(output, "A0001 OK LOGIN completed\r\n");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let mailbox = MailboxBuilder::new().build();
        let output = run(|mut stream| async move {
            handle_login("A0001", Some("testuser"), Some("nope"), &mailbox, &mut stream).await;
        })
        .await;
        assert!(output.starts_with("A0001 NO "));
    }

    #[tokio::test]
    async fn capability_then_tagged_ok() {
        let output = run(|mut stream| async move {
            handle_capability("A1", &mut stream).await;
        })
        .await;
        assert!(output.contains("* CAPABILITY IMAP4rev1 STARTTLS"));
        assert!(output.ends_with("A1 OK CAPABILITY completed\r\n"));
    }

    #[tokio::test]
    async fn logout_says_bye_first() {
        let output = run(|mut stream| async move {
            handle_logout("T9", &mut stream).await;
        })
        .await;
        assert!(output.starts_with("* BYE"));
        assert!(output.ends_with("T9 OK LOGOUT completed\r\n"));
    }

    #[tokio::test]
    async fn noop_echoes_tag() {
        let output = run(|mut stream| async move {
            handle_noop("N1", &mut stream).await;
        })
        .await;
        assert_eq!(output, "N1 OK NOOP completed\r\n");
    }
}
