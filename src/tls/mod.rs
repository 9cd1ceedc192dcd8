//! TLS endpoints for both roles.
//!
//! The client side resolves, connects, and runs the TLS handshake with chain
//! verification against a configured trust-anchor file; the server side builds
//! a [`TlsAcceptor`] from PEM credentials. Handshake failure is terminal for
//! the connection in both roles and is never retried.

pub mod verify;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use tokio::net::TcpStream;
use tokio_rustls::{TlsAcceptor, TlsConnector, client};
use tracing::info;

use crate::config::TlsSettings;
use crate::error::TransferError;
use crate::tls::verify::ChainLoggingVerifier;

fn read_certs(path: &Path) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let certs: Result<Vec<_>, _> = rustls_pemfile::certs(&mut BufReader::new(file)).collect();
    let certs = certs.with_context(|| format!("invalid PEM in {}", path.display()))?;
    if certs.is_empty() {
        anyhow::bail!("no certificates found in {}", path.display());
    }
    Ok(certs)
}

fn read_private_key(path: &Path) -> anyhow::Result<PrivateKeyDer<'static>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .with_context(|| format!("invalid PEM in {}", path.display()))?
        .with_context(|| format!("no private key found in {}", path.display()))
}

/// Builds the client-side TLS configuration: trust anchors from
/// `tls.ca_file`, chain validation delegated to webpki behind the
/// observational [`ChainLoggingVerifier`].
pub fn client_config(tls: &TlsSettings) -> anyhow::Result<Arc<ClientConfig>> {
    let mut roots = RootCertStore::empty();
    for cert in read_certs(&tls.ca_file)? {
        roots
            .add(cert)
            .with_context(|| format!("untrusted anchor in {}", tls.ca_file.display()))?;
    }

    let verifier = ChainLoggingVerifier::new(Arc::new(roots))
        .context("cannot build certificate verifier")?;

    let config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();

    Ok(Arc::new(config))
}

/// Builds the server-side acceptor from the certificate chain and private key
/// named in `tls`. Key-exchange parameters are managed by rustls itself.
pub fn acceptor(tls: &TlsSettings) -> anyhow::Result<TlsAcceptor> {
    let chain = read_certs(&tls.cert_file)?;
    let key = read_private_key(&tls.key_file)?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .context("certificate chain and key do not form a valid identity")?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Opens a TCP connection to `host:port`.
///
/// Resolution or connect failure is [`TransferError::Connect`].
pub async fn open(host: &str, port: u16) -> Result<TcpStream, TransferError> {
    TcpStream::connect((host, port))
        .await
        .map_err(TransferError::Connect)
}

/// Runs the client-role handshake over an open TCP stream.
///
/// A failed negotiation (including chain verification) is
/// [`TransferError::Handshake`]; no retry is attempted.
pub async fn handshake(
    config: Arc<ClientConfig>,
    host: &str,
    tcp: TcpStream,
) -> Result<client::TlsStream<TcpStream>, TransferError> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| TransferError::InvalidTarget(host.to_string()))?;

    let stream = TlsConnector::from(config)
        .connect(server_name, tcp)
        .await
        .map_err(TransferError::Handshake)?;

    info!("TLS handshake complete with {host}");
    Ok(stream)
}
