//! OCSP revocation check for a single certificate.
//!
//! Builds an RFC 6960 request for the leaf, POSTs it to the first responder
//! the leaf advertises, and verifies the signed answer against the issuer
//! (or a delegated responder certificate the issuer signed).
//!
//! This is an optional follow-up to a scan, never part of the bulk path:
//! there are no retries and no fallback to other responder URLs.

mod asn1;
mod signature;

use std::fmt;

use der::asn1::{Int, OctetString};
use der::{Any, Decode, Encode, Tag};
use log::debug;
use reqwest::header::CONTENT_TYPE;
use spki::AlgorithmIdentifierOwned;
use x509_parser::certificate::X509Certificate;

use crate::error_handling::OcspError;
use crate::tls::extract_ocsp_urls;

use asn1::{
    BasicOcspResponse, CertId, CertStatus, OcspRequest, OcspResponse, OcspResponseStatus,
    Request, ResponseData, SingleResponse, TbsRequest, OID_OCSP_BASIC, OID_SHA1,
};
use signature::{parse_certificate, public_key, verify_certificate, verify_signature};

const OCSP_REQUEST_CONTENT_TYPE: &str = "application/ocsp-request";

/// Revocation status reported by a responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcspStatus {
    /// Not revoked
    Good,
    /// Revoked by the issuer
    Revoked,
    /// The responder does not know the certificate
    Unknown,
}

impl fmt::Display for OcspStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OcspStatus::Good => "good",
            OcspStatus::Revoked => "revoked",
            OcspStatus::Unknown => "unknown",
        })
    }
}

/// Queries the leaf's OCSP responder and requires a `good` answer.
///
/// # Arguments
///
/// * `leaf_der` - DER of the certificate to check
/// * `issuer_der` - DER of the certificate that signed the leaf
/// * `client` - HTTP client; its timeout bounds the exchange
///
/// # Errors
///
/// - `OcspError::NoOcspServer` when the leaf lists no responder
/// - `OcspError::InvalidStatus` when the answer is `revoked` or `unknown`
/// - Transport, decoding, and signature failures otherwise
pub async fn check_ocsp_status(
    leaf_der: &[u8],
    issuer_der: &[u8],
    client: &reqwest::Client,
) -> Result<OcspStatus, OcspError> {
    let responder = responder_url(leaf_der)?;
    let request = build_request(leaf_der, issuer_der)?;

    debug!("Sending OCSP request to {responder}");
    let body = client
        .post(&responder)
        .header(CONTENT_TYPE, OCSP_REQUEST_CONTENT_TYPE)
        .body(request)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    match parse_response(&body, leaf_der, issuer_der)? {
        OcspStatus::Good => Ok(OcspStatus::Good),
        status => Err(OcspError::InvalidStatus(status)),
    }
}

fn responder_url(leaf_der: &[u8]) -> Result<String, OcspError> {
    let leaf = parse_certificate(leaf_der)?;
    extract_ocsp_urls(&leaf)
        .into_iter()
        .next()
        .ok_or(OcspError::NoOcspServer)
}

/// Encodes an `OCSPRequest` with a single SHA-1 `CertID` for the leaf.
pub(crate) fn build_request(leaf_der: &[u8], issuer_der: &[u8]) -> Result<Vec<u8>, OcspError> {
    let leaf = parse_certificate(leaf_der)?;
    let issuer = parse_certificate(issuer_der)?;

    let request = OcspRequest {
        tbs_request: TbsRequest {
            version: None,
            requestor_name: None,
            request_list: vec![Request {
                req_cert: cert_id(&leaf, &issuer)?,
                single_request_extensions: None,
            }],
            request_extensions: None,
        },
    };
    Ok(request.to_der()?)
}

fn cert_id(leaf: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> Result<CertId, OcspError> {
    Ok(CertId {
        hash_algorithm: AlgorithmIdentifierOwned {
            oid: OID_SHA1,
            parameters: Some(Any::new(Tag::Null, Vec::new())?),
        },
        issuer_name_hash: OctetString::new(sha1(issuer.subject().as_raw()))?,
        issuer_key_hash: OctetString::new(sha1(public_key(issuer)))?,
        serial_number: Int::new(leaf.raw_serial())?,
    })
}

fn sha1(data: &[u8]) -> Vec<u8> {
    ring::digest::digest(&ring::digest::SHA1_FOR_LEGACY_USE_ONLY, data)
        .as_ref()
        .to_vec()
}

/// Decodes and verifies an `OCSPResponse`, returning the leaf's status.
pub(crate) fn parse_response(
    body: &[u8],
    leaf_der: &[u8],
    issuer_der: &[u8],
) -> Result<OcspStatus, OcspError> {
    let leaf = parse_certificate(leaf_der)?;
    let issuer = parse_certificate(issuer_der)?;

    let response = OcspResponse::from_der(body)?;
    if response.response_status != OcspResponseStatus::Successful {
        return Err(OcspError::ResponderStatus(response.response_status as u8));
    }
    let bytes = response
        .response_bytes
        .ok_or_else(|| malformed("missing response bytes"))?;
    if bytes.response_type != OID_OCSP_BASIC {
        return Err(malformed("unsupported response type"));
    }

    let basic = BasicOcspResponse::from_der(bytes.response.as_bytes())?;
    let tbs = basic.tbs_response_data.to_der()?;
    let signature = basic
        .signature
        .as_bytes()
        .ok_or_else(|| malformed("unsupported BIT STRING padding"))?;

    let embedded = match basic.certs.as_ref().and_then(|certs| certs.first()) {
        Some(cert) => Some(cert.to_der()?),
        None => None,
    };
    let responder = embedded.as_deref().map(parse_certificate).transpose()?;

    // A delegated responder must itself be vouched for by the issuer
    let signer_key = match &responder {
        Some(responder) => {
            verify_certificate(responder, public_key(&issuer))?;
            public_key(responder)
        }
        None => public_key(&issuer),
    };
    verify_signature(basic.signature_algorithm.oid, signer_key, &tbs, signature)?;

    let data = ResponseData::from_der(&tbs)?;
    select_status(&data.responses, leaf.raw_serial())
}

fn select_status(responses: &[SingleResponse], serial: &[u8]) -> Result<OcspStatus, OcspError> {
    let single = match responses
        .iter()
        .find(|single| single.cert_id.serial_number.as_bytes() == serial)
    {
        Some(single) => single,
        None => match responses {
            [single] => single,
            [] => return Err(malformed("no single responses")),
            _ => return Err(malformed("no response for the certificate serial")),
        },
    };

    Ok(match &single.cert_status {
        CertStatus::Good(_) => OcspStatus::Good,
        CertStatus::Revoked(info) => {
            debug!("Certificate revoked, reason {:?}", info.revocation_reason);
            OcspStatus::Revoked
        }
        CertStatus::Unknown(_) => OcspStatus::Unknown,
    })
}

fn malformed(msg: &str) -> OcspError {
    OcspError::Malformed(msg.to_string())
}
