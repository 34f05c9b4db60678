//! Certificate field extraction.

use chrono::{DateTime, SecondsFormat};
use rustls::pki_types::CertificateDer;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{DistributionPointName, GeneralName, ParsedExtension};
use x509_parser::time::ASN1Time;

use crate::error_handling::ScanError;
use crate::models::{CertificateRecord, ChainCertificate};

/// id-ad-ocsp access method
const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";

/// Parses a DER certificate, mapping parser errors into [`ScanError`].
pub(crate) fn parse_certificate(der: &[u8]) -> Result<X509Certificate<'_>, ScanError> {
    x509_parser::parse_x509_certificate(der)
        .map(|(_, cert)| cert)
        .map_err(|e| ScanError::CertificateParse(e.to_string()))
}

/// Renders an ASN.1 time as RFC 3339 UTC.
pub(crate) fn format_time(time: &ASN1Time) -> String {
    DateTime::from_timestamp(time.timestamp(), 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| time.to_string())
}

/// Collects CRL distribution point URLs.
pub(crate) fn extract_crl_urls(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut urls = Vec::new();
    for ext in cert.extensions() {
        if let ParsedExtension::CRLDistributionPoints(points) = ext.parsed_extension() {
            for point in &points.points {
                if let Some(DistributionPointName::FullName(names)) = &point.distribution_point {
                    for name in names {
                        if let GeneralName::URI(uri) = name {
                            urls.push(uri.to_string());
                        }
                    }
                }
            }
        }
    }
    urls
}

/// Collects OCSP responder URLs from Authority Information Access.
pub(crate) fn extract_ocsp_urls(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut urls = Vec::new();
    for ext in cert.extensions() {
        if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
            for desc in &aia.accessdescs {
                if desc.access_method.to_id_string() != OID_AD_OCSP {
                    continue;
                }
                if let GeneralName::URI(uri) = &desc.access_location {
                    urls.push(uri.to_string());
                }
            }
        }
    }
    urls
}

/// Collects DNS-type subject alternative names.
pub(crate) fn extract_dns_sans(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut sans = Vec::new();
    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for name in &san.general_names {
                if let GeneralName::DNSName(dns) = name {
                    sans.push(dns.to_string());
                }
            }
        }
    }
    sans
}

/// First subject common name, if any.
pub(crate) fn extract_common_name(cert: &X509Certificate<'_>) -> Option<String> {
    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

fn chain_entry(der: &[u8]) -> Result<ChainCertificate, ScanError> {
    let cert = parse_certificate(der)?;
    Ok(ChainCertificate {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: cert.tbs_certificate.serial.to_string(),
        not_before: format_time(&cert.validity().not_before),
        not_after: format_time(&cert.validity().not_after),
        der: der.to_vec(),
    })
}

/// Builds an unvalidated record from a presented chain (leaf first).
///
/// `valid` starts out true; the chain validator settles it.
///
/// # Errors
///
/// Returns [`ScanError::NoCertificates`] for an empty chain and
/// [`ScanError::CertificateParse`] if any certificate is malformed.
pub(crate) fn build_record(
    target: &str,
    chain: &[CertificateDer<'_>],
) -> Result<CertificateRecord, ScanError> {
    let leaf_der = chain
        .first()
        .ok_or_else(|| ScanError::NoCertificates(target.to_string()))?;
    let leaf = parse_certificate(leaf_der.as_ref())?;

    let cert_chain = chain
        .iter()
        .map(|c| chain_entry(c.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CertificateRecord {
        domain: target.to_string(),
        serial: leaf.tbs_certificate.serial.to_string(),
        not_before: format_time(&leaf.validity().not_before),
        not_after: format_time(&leaf.validity().not_after),
        issuer: leaf.issuer().to_string(),
        crl: extract_crl_urls(&leaf),
        ocsp_server: extract_ocsp_urls(&leaf),
        cert_chain,
        valid: true,
        validation_errors: Vec::new(),
    })
}
