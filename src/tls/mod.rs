//! TLS certificate probing and validation.
//!
//! This module connects to a target, completes a TLS handshake without
//! enforcing trust, and turns the presented chain into a record:
//! - Serial, validity window, and issuer of the leaf
//! - CRL distribution points and OCSP responders
//! - The full chain, leaf first
//! - A chain validation verdict with failure reasons
//!
//! IP targets are additionally correlated with their reverse DNS name.
//!
//! Uses `tokio-rustls` for async TLS connections and `x509-parser` for certificate parsing.

mod extract;
mod validate;
mod verifier;

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use rustls::pki_types::{CertificateDer, ServerName};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::config::{TCP_CONNECT_TIMEOUT_SECS, TLS_HANDSHAKE_TIMEOUT_SECS};
use crate::dns::{reverse_dns_lookup, ReverseResolver};
use crate::error_handling::ScanError;
use crate::models::{AddressCertificateRecord, CertificateRecord};

pub(crate) use extract::{extract_ocsp_urls, parse_certificate};
pub use validate::{hostname_in_certificate, ChainValidator, ChainVerdict, VerificationName};

use extract::{build_record, extract_common_name, extract_dns_sans};
use verifier::AcceptAnyServerCert;

/// Probes one target and reports its certificate.
///
/// This is the seam the scan orchestrator dispatches through; [`TlsProber`]
/// is the network implementation.
pub trait Probe: Send + Sync + 'static {
    /// Probes `domain:port`.
    fn probe_domain(
        &self,
        domain: &str,
        port: u16,
    ) -> impl Future<Output = Result<CertificateRecord, ScanError>> + Send;

    /// Probes `ip:port` and correlates the certificate with reverse DNS.
    fn probe_address(
        &self,
        ip: IpAddr,
        port: u16,
    ) -> impl Future<Output = Result<AddressCertificateRecord, ScanError>> + Send;
}

/// Network prober backed by `tokio-rustls`.
pub struct TlsProber {
    connector: TlsConnector,
    validator: ChainValidator,
    resolver: Option<Arc<dyn ReverseResolver>>,
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl TlsProber {
    /// Creates a prober validating against `roots`.
    ///
    /// Without a `resolver`, IP targets are reported without a hostname.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring provider supports no safe protocol version.
    pub fn new(
        roots: RootCertStore,
        resolver: Option<Arc<dyn ReverseResolver>>,
    ) -> Result<Self, rustls::Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            validator: ChainValidator::new(roots),
            resolver,
            connect_timeout: Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS),
            handshake_timeout: Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS),
        })
    }

    /// Overrides the connect and handshake timeouts.
    pub fn with_timeouts(mut self, connect: Duration, handshake: Duration) -> Self {
        self.connect_timeout = connect;
        self.handshake_timeout = handshake;
        self
    }

    async fn fetch_chain(
        &self,
        label: &str,
        stream: impl Future<Output = std::io::Result<TcpStream>>,
        server_name: ServerName<'static>,
    ) -> Result<Vec<CertificateDer<'static>>, ScanError> {
        debug!("Attempting to connect to {label}");
        let sock = match tokio::time::timeout(self.connect_timeout, stream).await {
            Ok(Ok(sock)) => sock,
            Ok(Err(e)) => {
                return Err(ScanError::DialFailure {
                    target: label.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ScanError::DialTimeout {
                    target: label.to_string(),
                    secs: self.connect_timeout.as_secs(),
                })
            }
        };

        let tls_stream = match tokio::time::timeout(
            self.handshake_timeout,
            self.connector.connect(server_name, sock),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ScanError::Handshake {
                    target: label.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ScanError::HandshakeTimeout {
                    target: label.to_string(),
                    secs: self.handshake_timeout.as_secs(),
                })
            }
        };

        let chain = tls_stream
            .get_ref()
            .1
            .peer_certificates()
            .map(<[CertificateDer<'static>]>::to_vec)
            .unwrap_or_default();
        if chain.is_empty() {
            return Err(ScanError::NoCertificates(label.to_string()));
        }
        debug!("Received {} certificate(s) from {label}", chain.len());
        Ok(chain)
    }
}

impl Probe for TlsProber {
    async fn probe_domain(&self, domain: &str, port: u16) -> Result<CertificateRecord, ScanError> {
        let server_name = ServerName::try_from(domain)
            .map(|name| name.to_owned())
            .map_err(|_| ScanError::InvalidServerName(domain.to_string()))?;
        let label = format!("{domain}:{port}");

        let chain = self
            .fetch_chain(&label, TcpStream::connect((domain, port)), server_name)
            .await?;

        let mut record = build_record(domain, &chain)?;
        let verdict = self
            .validator
            .validate(&chain, VerificationName::Domain(domain));
        record.valid = verdict.valid;
        record.validation_errors = verdict.reasons;
        Ok(record)
    }

    async fn probe_address(
        &self,
        ip: IpAddr,
        port: u16,
    ) -> Result<AddressCertificateRecord, ScanError> {
        let addr = SocketAddr::new(ip, port);
        let label = addr.to_string();

        let chain = self
            .fetch_chain(&label, TcpStream::connect(addr), ServerName::IpAddress(ip.into()))
            .await?;

        let ip_literal = ip.to_string();
        let mut certificate = build_record(&ip_literal, &chain)?;
        let (common_name, sans) = {
            let leaf = parse_certificate(chain[0].as_ref())?;
            (extract_common_name(&leaf), extract_dns_sans(&leaf))
        };

        let hostname = match &self.resolver {
            Some(resolver) => reverse_dns_lookup(ip, resolver.as_ref()).await,
            None => None,
        };
        let hostname_in_cert = hostname
            .as_deref()
            .is_some_and(|h| hostname_in_certificate(h, common_name.as_deref(), &sans));

        let name = hostname
            .as_deref()
            .map_or(VerificationName::None, VerificationName::Hostname);
        let verdict = self.validator.validate(&chain, name);
        certificate.valid = verdict.valid;
        certificate.validation_errors = verdict.reasons;

        Ok(AddressCertificateRecord {
            certificate,
            ip: ip_literal,
            hostname,
            hostname_in_cert,
            sans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn closed_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn test_address_refused_is_dial_failure() {
        let prober = TlsProber::new(RootCertStore::empty(), None).unwrap();
        let port = closed_port().await;

        let err = prober
            .probe_address("127.0.0.1".parse().unwrap(), port)
            .await
            .unwrap_err();
        assert!(err.is_connection_error(), "unexpected error: {err}");
        assert!(err.to_string().starts_with("dial tcp 127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_domain_rejects_invalid_server_name() {
        let prober = TlsProber::new(RootCertStore::empty(), None).unwrap();
        let err = prober.probe_domain("not a host", 443).await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidServerName(_)));
    }

    #[tokio::test]
    async fn test_handshake_with_plain_tcp_peer_fails() {
        // A listener that closes immediately is reachable but speaks no TLS
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        let prober = TlsProber::new(RootCertStore::empty(), None).unwrap();
        let err = prober
            .probe_address("127.0.0.1".parse().unwrap(), port)
            .await
            .unwrap_err();
        assert!(!err.is_connection_error(), "unexpected error: {err}");
        assert!(matches!(err, ScanError::Handshake { .. }));
    }
}
