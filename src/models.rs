//! Scan result records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One certificate of a presented chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainCertificate {
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub not_before: String,
    pub not_after: String,
    /// Raw DER, kept in memory for revocation checks.
    #[serde(skip)]
    pub der: Vec<u8>,
}

/// Certificate facts for one scanned domain.
///
/// Created once per successful probe. `valid` and `validation_errors` carry
/// the chain validator's verdict; an invalid certificate is still a
/// successful scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub domain: String,
    /// Serial number in decimal
    pub serial: String,
    /// RFC 3339 UTC
    pub not_before: String,
    /// RFC 3339 UTC
    pub not_after: String,
    pub issuer: String,
    /// CRL distribution point URLs
    pub crl: Vec<String>,
    /// OCSP responder URLs
    pub ocsp_server: Vec<String>,
    /// Leaf first
    pub cert_chain: Vec<ChainCertificate>,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
}

impl CertificateRecord {
    /// DER of the leaf certificate.
    pub fn leaf_der(&self) -> Option<&[u8]> {
        self.cert_chain.first().map(|c| c.der.as_slice())
    }

    /// DER of the certificate that issued the leaf, when the peer sent it.
    pub fn issuer_der(&self) -> Option<&[u8]> {
        self.cert_chain.get(1).map(|c| c.der.as_slice())
    }
}

/// Certificate facts for one scanned IP address.
///
/// Wraps the base record (whose `domain` holds the IP literal) and adds the
/// reverse DNS correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCertificateRecord {
    #[serde(flatten)]
    pub certificate: CertificateRecord,
    pub ip: String,
    /// PTR name without the trailing root dot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Whether `hostname` equals the subject CN or a DNS SAN
    pub hostname_in_cert: bool,
    /// DNS subject alternative names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sans: Vec<String>,
}

impl fmt::Display for CertificateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Domain:{} Valid:{} ", self.domain, self.valid)?;
        if !self.validation_errors.is_empty() {
            write!(f, "ValidationErrors:[{}] ", self.validation_errors.join("; "))?;
        }
        write!(
            f,
            "Serial:{} NotBefore:{} NotAfter:{} Issuer:{} CRL:[{}] OCSPServer:[{}]",
            self.serial,
            self.not_before,
            self.not_after,
            self.issuer,
            self.crl.join(","),
            self.ocsp_server.join(",")
        )
    }
}

impl fmt::Display for AddressCertificateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IP:{} {}", self.ip, self.certificate)?;
        if let Some(hostname) = &self.hostname {
            write!(
                f,
                " Hostname:{} HostnameInCert:{}",
                hostname, self.hostname_in_cert
            )?;
        }
        if !self.sans.is_empty() {
            write!(f, " SANs:{}", self.sans.join(","))?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{address_record, record};

    #[test]
    fn test_record_json_field_names() {
        let json = serde_json::to_value(record("example.com")).unwrap();
        for key in [
            "domain",
            "serial",
            "not_before",
            "not_after",
            "issuer",
            "crl",
            "ocsp_server",
            "cert_chain",
            "valid",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        // Empty reasons are omitted, raw DER is never serialized
        assert!(json.get("validation_errors").is_none());
        assert!(json["cert_chain"][0].get("der").is_none());
    }

    #[test]
    fn test_address_record_flattens_base_fields() {
        let json = serde_json::to_value(address_record("192.0.2.10", None)).unwrap();
        assert_eq!(json["domain"], "192.0.2.10");
        assert_eq!(json["ip"], "192.0.2.10");
        assert_eq!(json["hostname_in_cert"], false);
        assert!(json.get("hostname").is_none());
        assert!(json.get("certificate").is_none());
        assert_eq!(json["sans"][0], "www.example.com");
    }

    #[test]
    fn test_display_includes_reasons_only_when_invalid() {
        let mut rec = record("example.com");
        assert!(!rec.to_string().contains("ValidationErrors"));

        rec.valid = false;
        rec.validation_errors = vec!["Certificate has expired".to_string()];
        let rendered = rec.to_string();
        assert!(rendered.starts_with("Domain:example.com Valid:false ValidationErrors:"));
        assert!(rendered.contains("Certificate has expired"));
    }

    #[test]
    fn test_address_display() {
        let rec = address_record("192.0.2.10", Some("www.example.com"));
        let rendered = rec.to_string();
        assert!(rendered.starts_with("IP:192.0.2.10 Domain:192.0.2.10"));
        assert!(rendered.contains("Hostname:www.example.com HostnameInCert:true"));
        assert!(rendered.ends_with("SANs:www.example.com,example.com"));
    }
}
