//! In-process fake IMAP server for integration testing
//!
//! A connection goes through three phases: a plain-text greeting and
//! STARTTLS, the TLS handshake, then the authenticated command loop.
//! Only the commands a folder pane needs are understood; message data
//! is never served.
//!
//! ```text
//!   S: * OK IMAP4rev1 Fake server ready
//!   C: A0001 STARTTLS
//!   S: A0001 OK Begin TLS negotiation now
//!      <handshake>
//!   C: A0002 LOGIN testuser testpass
//!   C: A0003 LIST "" ""
//!   S: * LIST (\Noselect) "/" ""
//!   C: A0004 LIST "" *
//!   C: A0005 LSUB "" *
//!   C: A0006 STATUS "INBOX" (MESSAGES RECENT UNSEEN)
//!   S: * STATUS "INBOX" (MESSAGES 10 RECENT 1 UNSEEN 3)
//!   C: A0007 LOGOUT
//! ```

use super::handlers::{
    handle_capability, handle_list, handle_login, handle_logout, handle_noop, handle_status,
    handle_subscribe,
};
use super::io::{arguments, write_line};
use super::mailbox::Mailbox;
use imap_codec::CommandCodec;
use imap_codec::decode::Decoder;
use imap_codec::imap_types::command::{Command, CommandBody};
use imap_codec::imap_types::mailbox::Mailbox as ImapMailbox;
use rcgen::generate_simple_self_signed;
use rustls::pki_types::PrivatePkcs8KeyDer;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

/// A fake IMAP server on `127.0.0.1` with an OS-assigned port.
///
/// Every connection shares one `Mailbox`, so subscription changes made
/// by one client are seen by the next. The accept loop is aborted when
/// the server is dropped.
pub struct FakeImapServer {
    port: u16,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeImapServer {
    /// Start serving `mailbox` with a freshly generated certificate.
    pub async fn start(mailbox: Mailbox) -> Self {
        // Tests race to install the provider; losing the race is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        let acceptor = self_signed_acceptor();
        let mailbox = Arc::new(Mutex::new(mailbox));

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                let mailbox = Arc::clone(&mailbox);
                tokio::spawn(async move {
                    if let Some(tls) = negotiate_tls(stream, &acceptor).await {
                        serve(tls, &mailbox).await;
                    }
                });
            }
        });

        Self { port, handle }
    }

    /// The port the server is listening on.
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for FakeImapServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// TLS acceptor for a certificate issued to `127.0.0.1`.
fn self_signed_acceptor() -> TlsAcceptor {
    let cert = generate_simple_self_signed(vec!["127.0.0.1".to_string()])
        .expect("generate self-signed cert");
    let key = PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert.cert.der().clone()], key.into())
        .expect("build server TLS config");
    TlsAcceptor::from(Arc::new(config))
}

/// Greet, wait for STARTTLS and run the handshake.
///
/// Returns `None` if the client hangs up or sends anything else first.
async fn negotiate_tls(
    stream: TcpStream,
    acceptor: &TlsAcceptor,
) -> Option<tokio_rustls::server::TlsStream<TcpStream>> {
    let mut reader = BufReader::new(stream);
    write_line(&mut reader, "* OK IMAP4rev1 Fake server ready\r\n")
        .await
        .ok()?;

    let mut line = String::new();
    reader.read_line(&mut line).await.ok()?;
    let (tag, command) = line.trim().split_once(' ')?;

    if !command.eq_ignore_ascii_case("STARTTLS") {
        let _ = write_line(&mut reader, &format!("{tag} BAD Expected STARTTLS\r\n")).await;
        return None;
    }
    let resp = format!("{tag} OK Begin TLS negotiation now\r\n");
    write_line(&mut reader, &resp).await.ok()?;

    acceptor.accept(reader.into_inner()).await.ok()
}

/// Folder name of a parsed mailbox argument.
fn mailbox_name(mb: &ImapMailbox<'_>) -> String {
    match mb {
        ImapMailbox::Inbox => "INBOX".to_string(),
        ImapMailbox::Other(other) => {
            let bytes: &[u8] = other.as_ref();
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Command loop of an established session.
///
/// `imap-codec` decides which command was sent; LOGIN credentials and
/// LIST patterns are read from the raw line. Read-only handlers get a
/// clone of the mailbox so no lock is held across an await.
async fn serve<S: AsyncRead + AsyncWrite + Unpin>(stream: S, mailbox: &Mutex<Mailbox>) {
    let mut reader = BufReader::new(stream);
    let codec = CommandCodec::default();

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Ok((_, command)) = codec.decode(line.as_bytes()) else {
            let tag = trimmed.split_whitespace().next().unwrap_or("*");
            if write_line(&mut reader, &format!("{tag} BAD Parse error\r\n"))
                .await
                .is_err()
            {
                break;
            }
            continue;
        };

        if !dispatch(command, trimmed, mailbox, &mut reader).await {
            break;
        }
    }
}

/// Run one command. Returns false when the session is over.
async fn dispatch<S: AsyncRead + AsyncWrite + Unpin>(
    command: Command<'_>,
    line: &str,
    mailbox: &Mutex<Mailbox>,
    reader: &mut BufReader<S>,
) -> bool {
    let tag = command.tag.inner();
    let args = arguments(line);
    let arg = |i: usize| args.get(i).map(String::as_str);
    let snapshot = mailbox.lock().unwrap().clone();

    match command.body {
        CommandBody::Capability => handle_capability(tag, reader).await,
        CommandBody::Noop => handle_noop(tag, reader).await,
        CommandBody::Login { .. } => {
            return handle_login(tag, arg(0), arg(1), &snapshot, reader).await;
        }
        CommandBody::List { .. } => {
            handle_list(tag, arg(1).unwrap_or(""), false, &snapshot, reader).await;
        }
        CommandBody::Lsub { .. } => {
            handle_list(tag, arg(1).unwrap_or(""), true, &snapshot, reader).await;
        }
        CommandBody::Status { mailbox: mb, .. } => {
            handle_status(tag, &mailbox_name(&mb), &snapshot, reader).await;
        }
        CommandBody::Subscribe { mailbox: mb } => {
            handle_subscribe(tag, &mailbox_name(&mb), true, mailbox, reader).await;
        }
        CommandBody::Unsubscribe { mailbox: mb } => {
            handle_subscribe(tag, &mailbox_name(&mb), false, mailbox, reader).await;
        }
        CommandBody::Logout => {
            handle_logout(tag, reader).await;
            return false;
        }
        _ => {
            let resp = format!("{tag} BAD Unknown command\r\n");
            return write_line(reader, &resp).await.is_ok();
        }
    }
    true
}
