//! Certificate chain validation.
//!
//! Verifies a presented chain against a root store with rustls' webpki
//! verifier and turns failures into human-readable reasons. The leaf's own
//! validity window is re-checked separately so expiry is always reported.

use std::sync::Arc;
use std::time::SystemTime;

use log::warn;
use rustls::client::danger::ServerCertVerifier;
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, RootCertStore};

use super::extract::parse_certificate;

pub(crate) const REASON_EXPIRED_OR_NOT_YET_VALID: &str =
    "Certificate has expired or is not yet valid";
pub(crate) const REASON_NOT_AUTHORIZED_TO_SIGN: &str =
    "Certificate is not authorized to sign other certificates";
pub(crate) const REASON_INCOMPATIBLE_USAGE: &str =
    "Certificate usage is incompatible with the intended usage";
pub(crate) const REASON_CA_NOT_AUTHORIZED_FOR_NAME: &str = "CA is not authorized for this name";
pub(crate) const REASON_TOO_MANY_INTERMEDIATES: &str = "Too many intermediate certificates";
pub(crate) const REASON_UNKNOWN_AUTHORITY: &str =
    "Certificate signed by unknown authority (possibly self-signed)";
pub(crate) const REASON_NOT_YET_VALID: &str = "Certificate is not yet valid";
pub(crate) const REASON_EXPIRED: &str = "Certificate has expired";

/// Name the leaf is expected to cover.
#[derive(Debug, Clone, Copy)]
pub enum VerificationName<'a> {
    /// The scanned domain
    Domain(&'a str),
    /// The reverse DNS name of a scanned IP
    Hostname(&'a str),
    /// No name to check (IP target without a PTR record)
    None,
}

impl VerificationName<'_> {
    fn mismatch_reason(&self) -> Option<String> {
        match self {
            VerificationName::Domain(d) => Some(format!("Certificate is not valid for domain: {d}")),
            VerificationName::Hostname(h) => {
                Some(format!("Certificate is not valid for hostname: {h}"))
            }
            VerificationName::None => None,
        }
    }
}

/// Outcome of chain validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChainVerdict {
    /// True when no reason was recorded
    pub valid: bool,
    /// Failure reasons in the order they were found
    pub reasons: Vec<String>,
}

/// Validates presented chains against a fixed root store.
pub struct ChainValidator {
    verifier: Option<Arc<WebPkiServerVerifier>>,
}

impl ChainValidator {
    /// Builds a validator over `roots`.
    ///
    /// An empty store is accepted: every chain then fails as signed by an
    /// unknown authority.
    pub fn new(roots: RootCertStore) -> Self {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier =
            match WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider).build() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Chain verification has no usable trust anchors: {e}");
                    None
                }
            };
        Self { verifier }
    }

    /// Validates `chain` (leaf first) as of now.
    pub fn validate(&self, chain: &[CertificateDer<'_>], name: VerificationName<'_>) -> ChainVerdict {
        self.validate_at(chain, name, SystemTime::now())
    }

    /// Validates `chain` (leaf first) as of `now`.
    pub fn validate_at(
        &self,
        chain: &[CertificateDer<'_>],
        name: VerificationName<'_>,
        now: SystemTime,
    ) -> ChainVerdict {
        let mut reasons = Vec::new();

        let Some((leaf, intermediates)) = chain.split_first() else {
            return ChainVerdict {
                valid: false,
                reasons: vec!["Certificate validation error: empty certificate chain".to_string()],
            };
        };

        self.verify_trust(leaf, intermediates, name, now, &mut reasons);
        check_validity_window(leaf, now, &mut reasons);

        ChainVerdict {
            valid: reasons.is_empty(),
            reasons,
        }
    }

    fn verify_trust(
        &self,
        leaf: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        name: VerificationName<'_>,
        now: SystemTime,
        reasons: &mut Vec<String>,
    ) {
        let Some(verifier) = &self.verifier else {
            reasons.push(REASON_UNKNOWN_AUTHORITY.to_string());
            return;
        };

        let requested = match name {
            VerificationName::Domain(n) | VerificationName::Hostname(n) => Some(n),
            VerificationName::None => None,
        };
        // Without a name, an unspecified address stands in and its mismatch is ignored
        let parsed = requested.map(|n| ServerName::try_from(n).map(|s| s.to_owned()));
        let server_name = match parsed {
            Some(Ok(server_name)) => server_name,
            Some(Err(_)) => {
                reasons.extend(name.mismatch_reason());
                placeholder_name()
            }
            None => placeholder_name(),
        };

        let now = UnixTime::since_unix_epoch(
            now.duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default(),
        );

        match verifier.verify_server_cert(leaf, intermediates, &server_name, &[], now) {
            Ok(_) => {}
            Err(rustls::Error::InvalidCertificate(err)) => {
                if let Some(reason) = classify(&err, name) {
                    if !reasons.contains(&reason) {
                        reasons.push(reason);
                    }
                }
            }
            Err(other) => reasons.push(format!("Certificate validation error: {other}")),
        }
    }
}

fn placeholder_name() -> ServerName<'static> {
    ServerName::IpAddress(std::net::IpAddr::from([0u8, 0, 0, 0]).into())
}

/// Maps a webpki failure to a reason; `None` when it should not be reported.
fn classify(err: &CertificateError, name: VerificationName<'_>) -> Option<String> {
    let reason = match err {
        CertificateError::Expired
        | CertificateError::ExpiredContext { .. }
        | CertificateError::NotValidYet
        | CertificateError::NotValidYetContext { .. } => REASON_EXPIRED_OR_NOT_YET_VALID.to_string(),
        CertificateError::UnknownIssuer => REASON_UNKNOWN_AUTHORITY.to_string(),
        CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. } => {
            return name.mismatch_reason();
        }
        CertificateError::InvalidPurpose => REASON_INCOMPATIBLE_USAGE.to_string(),
        other => {
            let detail = format!("{other:?}");
            if detail.starts_with("InvalidPurpose") || detail.contains("RequiredEkuNotFound") {
                REASON_INCOMPATIBLE_USAGE.to_string()
            } else if detail.contains("CaUsedAsEndEntity")
                || detail.contains("EndEntityUsedAsCa")
                || detail.contains("PathLenConstraintViolated")
            {
                REASON_NOT_AUTHORIZED_TO_SIGN.to_string()
            } else if detail.contains("NameConstraint") {
                REASON_CA_NOT_AUTHORIZED_FOR_NAME.to_string()
            } else if detail.contains("MaximumPathDepthExceeded")
                || detail.contains("MaximumPathBuildCallsExceeded")
                || detail.contains("MaximumSignatureChecksExceeded")
            {
                REASON_TOO_MANY_INTERMEDIATES.to_string()
            } else {
                format!(
                    "Certificate validation error: {}",
                    rustls::Error::InvalidCertificate(other.clone())
                )
            }
        }
    };
    Some(reason)
}

fn check_validity_window(leaf: &CertificateDer<'_>, now: SystemTime, reasons: &mut Vec<String>) {
    let cert = match parse_certificate(leaf.as_ref()) {
        Ok(cert) => cert,
        Err(e) => {
            reasons.push(format!("Certificate validation error: {e}"));
            return;
        }
    };

    let now = match now.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(_) => 0,
    };
    let validity = cert.validity();
    if now < validity.not_before.timestamp() {
        reasons.push(REASON_NOT_YET_VALID.to_string());
    }
    if now > validity.not_after.timestamp() {
        reasons.push(REASON_EXPIRED.to_string());
    }
}

/// Checks `hostname` against the common name and DNS SANs.
///
/// Exact, case-sensitive comparison; wildcards are not expanded.
pub fn hostname_in_certificate(hostname: &str, common_name: Option<&str>, sans: &[String]) -> bool {
    common_name == Some(hostname) || sans.iter().any(|san| san == hostname)
}
