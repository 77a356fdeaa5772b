//! Transport Layer Security configuration for sluice.
//!
//! Two TLS surfaces exist:
//!
//! - **Control plane** (scheduler↔adapter, adapter↔log bus): mutual TLS
//!   over gRPC, built from operator-provided CA/cert/key PEM files.
//! - **Drain egress** (`syslog-tls://`): one-way TLS against arbitrary
//!   operator drains, verified against the bundled web roots, with an
//!   opt-in mode that skips certificate verification for drains with
//!   self-signed material.
//!
//! All file loading happens at startup; a missing or unreadable file is a
//! fatal configuration error.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_rustls::TlsConnector;
use tonic::transport::{Certificate, ClientTlsConfig, Identity, ServerTlsConfig};

/// Tracks whether a default cryptography provider for `rustls` has been
/// installed for this process.
static DEFAULT_CRYPTO_PROVIDER_SET: OnceLock<()> = OnceLock::new();

/// Install the process-wide `rustls` cryptography provider if nothing has
/// installed one yet. Safe to call from multiple components.
fn ensure_crypto_provider() {
    DEFAULT_CRYPTO_PROVIDER_SET.get_or_init(|| {
        // Another library may have won the race; that is fine as long as
        // some provider is installed.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Errors from loading TLS material.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// A PEM file could not be read
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn read_pem(path: &Path) -> Result<Vec<u8>, TlsError> {
    std::fs::read(path).map_err(|source| TlsError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the client half of a mutual-TLS gRPC channel.
///
/// `domain` overrides the server name checked against the peer
/// certificate, so adapters addressed by IP can present a fixed CN.
pub fn client_mtls(
    ca: &Path,
    cert: &Path,
    key: &Path,
    domain: &str,
) -> Result<ClientTlsConfig, TlsError> {
    let ca = Certificate::from_pem(read_pem(ca)?);
    let identity = Identity::from_pem(read_pem(cert)?, read_pem(key)?);

    Ok(ClientTlsConfig::new()
        .ca_certificate(ca)
        .identity(identity)
        .domain_name(domain))
}

/// Build the server half of a mutual-TLS gRPC endpoint. Peers must present
/// a certificate signed by `ca`.
pub fn server_mtls(ca: &Path, cert: &Path, key: &Path) -> Result<ServerTlsConfig, TlsError> {
    let ca = Certificate::from_pem(read_pem(ca)?);
    let identity = Identity::from_pem(read_pem(cert)?, read_pem(key)?);

    Ok(ServerTlsConfig::new()
        .identity(identity)
        .client_ca_root(ca))
}

/// Build the connector used for `syslog-tls://` drains.
///
/// With `skip_verify` the server certificate is accepted unchecked; the
/// connection is still encrypted. Operators opt into this per deployment
/// for drains with self-signed certificates.
pub fn drain_connector(skip_verify: bool) -> TlsConnector {
    ensure_crypto_provider();

    let config = if skip_verify {
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerification::new()))
            .with_no_client_auth()
    } else {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth()
    };

    TlsConnector::from(Arc::new(config))
}

/// Certificate verifier that accepts any server certificate. Signature
/// checks still run so a garbled handshake fails rather than silently
/// passing.
#[derive(Debug)]
struct NoVerification {
    provider: CryptoProvider,
}

impl NoVerification {
    fn new() -> Self {
        Self {
            provider: rustls::crypto::ring::default_provider(),
        }
    }
}

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
