//! Signature checks for OCSP responses and delegated responder certificates.

use der::asn1::ObjectIdentifier;
use ring::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use x509_parser::certificate::X509Certificate;

use crate::error_handling::OcspError;

pub(crate) const OID_SHA1_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
pub(crate) const OID_SHA256_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
pub(crate) const OID_SHA384_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
pub(crate) const OID_SHA512_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");
pub(crate) const OID_ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
pub(crate) const OID_ECDSA_WITH_SHA384: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");

// Uncompressed SEC1 point lengths
const P256_POINT_LEN: usize = 65;
const P384_POINT_LEN: usize = 97;

/// Parses a DER certificate for OCSP use.
pub(crate) fn parse_certificate(der: &[u8]) -> Result<X509Certificate<'_>, OcspError> {
    x509_parser::parse_x509_certificate(der)
        .map(|(_, cert)| cert)
        .map_err(|e| OcspError::CertificateParse(e.to_string()))
}

/// Raw `subjectPublicKey` bits of a certificate.
pub(crate) fn public_key<'a>(cert: &'a X509Certificate<'_>) -> &'a [u8] {
    &cert.public_key().subject_public_key.data
}

/// Checks that `cert` was signed by the holder of `signer_key`.
pub(crate) fn verify_certificate(
    cert: &X509Certificate<'_>,
    signer_key: &[u8],
) -> Result<(), OcspError> {
    let algorithm = ObjectIdentifier::from_bytes(cert.signature_algorithm.algorithm.as_bytes())
        .map_err(|e| OcspError::CertificateParse(e.to_string()))?;
    verify_signature(
        algorithm,
        signer_key,
        cert.tbs_certificate.as_ref(),
        &cert.signature_value.data,
    )
}

fn verification_algorithm(
    oid: ObjectIdentifier,
    public_key: &[u8],
) -> Option<&'static dyn VerificationAlgorithm> {
    let algorithm: &'static dyn VerificationAlgorithm = match public_key.len() {
        P256_POINT_LEN if oid == OID_ECDSA_WITH_SHA256 => &signature::ECDSA_P256_SHA256_ASN1,
        P256_POINT_LEN if oid == OID_ECDSA_WITH_SHA384 => &signature::ECDSA_P256_SHA384_ASN1,
        P384_POINT_LEN if oid == OID_ECDSA_WITH_SHA256 => &signature::ECDSA_P384_SHA256_ASN1,
        P384_POINT_LEN if oid == OID_ECDSA_WITH_SHA384 => &signature::ECDSA_P384_SHA384_ASN1,
        _ if oid == OID_SHA1_WITH_RSA => &signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
        _ if oid == OID_SHA256_WITH_RSA => &signature::RSA_PKCS1_2048_8192_SHA256,
        _ if oid == OID_SHA384_WITH_RSA => &signature::RSA_PKCS1_2048_8192_SHA384,
        _ if oid == OID_SHA512_WITH_RSA => &signature::RSA_PKCS1_2048_8192_SHA512,
        _ => return None,
    };
    Some(algorithm)
}

/// Checks `signature` over `message` with the signer's public key bits.
pub(crate) fn verify_signature(
    algorithm: ObjectIdentifier,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), OcspError> {
    let algorithm = verification_algorithm(algorithm, public_key)
        .ok_or_else(|| OcspError::Signature("unsupported signature algorithm".to_string()))?;
    UnparsedPublicKey::new(algorithm, public_key)
        .verify(message, signature)
        .map_err(|_| OcspError::Signature("signature does not match signer key".to_string()))
}
