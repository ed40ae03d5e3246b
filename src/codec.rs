//! Transport encoding of bearer credentials
//!
//! A credential is three unpadded Base64URL segments joined by `.`:
//! header, claims and signature. Decoding is pure and stateless. The signing
//! input is always the caller's original bytes, never re-serialized JSON.

use crate::claims::Claims;
use crate::error::{Error, Result};
use crate::header::TokenHeader;
use crate::limits::{
    MAX_ALG_LENGTH, MAX_DECODED_HEADER_SIZE, MAX_DECODED_PAYLOAD_SIZE, MAX_DECODED_SIGNATURE_SIZE,
    MAX_KID_LENGTH, MAX_SIGNATURE_B64_SIZE, MAX_TOKEN_LENGTH,
};
use crate::utils::base64url;

/// A credential split into its decoded parts
#[derive(Debug, Clone)]
pub struct DecodedToken<'a> {
    pub header: TokenHeader,
    pub claims: Claims,
    /// Raw signature bytes
    pub signature: Vec<u8>,
    /// `header-segment.claims-segment`, borrowed verbatim from the input
    pub signing_input: &'a str,
}

/// Decode a credential into header, claims, signature and signing input
///
/// Nothing in the result has been verified.
pub fn decode(token: &str) -> Result<DecodedToken<'_>> {
    if token.len() > MAX_TOKEN_LENGTH {
        return Err(malformed(format!(
            "credential too large: {} bytes (maximum: {MAX_TOKEN_LENGTH} bytes)",
            token.len()
        )));
    }

    let mut parts = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed("expected three segments separated by '.'"));
    };

    if signature_b64.len() > MAX_SIGNATURE_B64_SIZE {
        return Err(malformed(format!(
            "signature segment too large: {} bytes (maximum: {MAX_SIGNATURE_B64_SIZE} bytes)",
            signature_b64.len()
        )));
    }

    let header_json = base64url::decode_string(header_b64, MAX_DECODED_HEADER_SIZE)
        .map_err(|e| malformed(format!("header: {e}")))?;
    let header: TokenHeader = miniserde::json::from_str(&header_json)
        .map_err(|_| malformed("header: not a valid header object"))?;

    if header.algorithm.len() > MAX_ALG_LENGTH {
        return Err(malformed("header: alg too long"));
    }
    if header.key_id.as_ref().is_some_and(|kid| kid.len() > MAX_KID_LENGTH) {
        return Err(malformed("header: kid too long"));
    }

    let claims_json = base64url::decode_string(claims_b64, MAX_DECODED_PAYLOAD_SIZE)
        .map_err(|e| malformed(format!("claims: {e}")))?;
    let claims: Claims = miniserde::json::from_str(&claims_json)
        .map_err(|_| malformed("claims: not a valid claims object"))?;
    claims.validate_string_lengths()?;

    let signature = base64url::decode_bytes(signature_b64, MAX_DECODED_SIGNATURE_SIZE)
        .map_err(|e| malformed(format!("signature: {e}")))?;

    let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];

    Ok(DecodedToken {
        header,
        claims,
        signature,
        signing_input,
    })
}

/// Build the signing input for a header and claims document
pub fn signing_input(header_json: &[u8], claims_json: &[u8]) -> String {
    format!(
        "{}.{}",
        base64url::encode(header_json),
        base64url::encode(claims_json)
    )
}

/// Encode header, claims and signature into the transport form
pub fn encode(header_json: &[u8], claims_json: &[u8], signature: &[u8]) -> String {
    format!(
        "{}.{}",
        signing_input(header_json, claims_json),
        base64url::encode(signature)
    )
}

/// Extract the credential from an `Authorization: Bearer <credential>` value
pub fn bearer_token(authorization: &str) -> Result<&str> {
    let (scheme, credential) = authorization
        .trim()
        .split_once(' ')
        .ok_or_else(|| malformed("authorization header is not 'Bearer <credential>'"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(malformed("authorization scheme is not Bearer"));
    }

    let credential = credential.trim();
    if credential.is_empty() || credential.contains(char::is_whitespace) {
        return Err(malformed("authorization header is not 'Bearer <credential>'"));
    }

    Ok(credential)
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::MalformedCredential(msg.into())
}
