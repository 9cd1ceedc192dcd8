//! Observational certificate-chain verifier.
//!
//! Logs the subject name of every certificate the peer presents, root first,
//! and returns the webpki verdict unchanged. The logging cannot veto a chain
//! that validates or rescue one that does not.

use std::sync::Arc;

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::{info, warn};

#[derive(Debug)]
pub struct ChainLoggingVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl ChainLoggingVerifier {
    pub fn new(roots: Arc<RootCertStore>) -> Result<Self, rustls::Error> {
        let inner = WebPkiServerVerifier::builder(roots)
            .build()
            .map_err(|e| rustls::Error::General(e.to_string()))?;
        Ok(Self { inner })
    }
}

fn log_subject(cert: &CertificateDer<'_>) {
    match x509_parser::parse_x509_certificate(cert.as_ref()) {
        Ok((_, parsed)) => info!("Verifying {}", parsed.subject()),
        Err(e) => warn!("Unparseable certificate in peer chain: {e}"),
    }
}

impl ServerCertVerifier for ChainLoggingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        // Root (or nearest-to-root intermediate) first, end entity last.
        for cert in intermediates.iter().rev() {
            log_subject(cert);
        }
        log_subject(end_entity);

        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
