//! IMAP connection and TLS helpers
//!
//! Provides the low-level `connect()` used by every `MailboxClient`
//! operation, and `logout()` to end a session.

use crate::config::ImapConfig;
use crate::error::{Error, Result};
use async_imap::{Client, Session};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{WebPkiSupportedAlgorithms, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info};

/// A TLS-wrapped IMAP session.
pub type ImapSession = Session<Compat<TlsStream<TcpStream>>>;

/// Open a fresh TLS-wrapped IMAP session.
///
/// Connects to `config.host:config.port`, upgrades the plain connection
/// with STARTTLS and logs in.
///
/// # Errors
///
/// Returns an error if the TCP connection, STARTTLS, the handshake or
/// LOGIN fails.
pub async fn connect(config: &ImapConfig) -> Result<ImapSession> {
    let addr = format!("{}:{}", config.host, config.port);
    debug!("Connecting to {}", addr);

    let tcp = TcpStream::connect(&addr).await?;
    let tls = starttls(tcp, &config.host).await?;

    let session = Client::new(tls.compat())
        .login(&config.username, &config.password)
        .await
        .map_err(|(e, _)| Error::Imap(format!("Login failed: {e}")))?;

    info!("Logged in to {} as {}", addr, config.username);
    Ok(session)
}

/// LOGOUT, ignoring failures: the work on the session is already done.
pub async fn logout(mut session: ImapSession) {
    if let Err(e) = session.logout().await {
        debug!("Logout failed: {}", e);
    }
}

/// Issue STARTTLS on a plain connection and run the handshake.
async fn starttls(tcp: TcpStream, host: &str) -> Result<TlsStream<TcpStream>> {
    let mut plain = Client::new(tcp.compat());
    plain
        .run_command_and_check_ok("STARTTLS", None)
        .await
        .map_err(|e| Error::Tls(format!("STARTTLS failed: {e}")))?;

    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|e| Error::Tls(format!("Invalid server name {host}: {e}")))?;

    let config = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert::new()))
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
        .connect(server_name, plain.into_inner().into_inner())
        .await
        .map_err(|e| Error::Tls(e.to_string()))
}

/// Trusts any server certificate but still checks handshake signatures.
///
/// Local IMAP bridges and test servers present self-signed certificates.
#[derive(Debug)]
struct AcceptAnyCert {
    algorithms: WebPkiSupportedAlgorithms,
}

impl AcceptAnyCert {
    fn new() -> Self {
        Self {
            algorithms: rustls::crypto::ring::default_provider().signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
