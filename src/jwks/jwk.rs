//! JWK (JSON Web Key) wire format and conversion

use crate::algorithm::AlgorithmType;
use crate::error::{Error, Result};
use crate::jwks::VerificationKey;
use crate::limits::{MAX_JWK_E_SIZE, MAX_JWK_N_SIZE, MAX_KID_LENGTH};
use crate::utils::base64url;
use miniserde::Deserialize;

/// JSON Web Key Set document
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// JSON Web Key (JWK) structure
///
/// Only the members needed for RSA signature keys are read.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Jwk {
    /// Key type (e.g., "RSA")
    pub kty: Option<String>,
    /// Key ID
    pub kid: Option<String>,
    /// Algorithm the key is intended for
    pub alg: Option<String>,
    /// Key use: "sig" or "enc" (RFC 7517 Section 4.2)
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// RSA modulus (Base64URL-encoded)
    pub n: Option<String>,
    /// RSA exponent (Base64URL-encoded)
    pub e: Option<String>,
}

impl Jwk {
    /// Convert to a verification key
    ///
    /// Returns `Ok(None)` for keys that can never verify an accepted credential:
    /// other key types, encryption keys, other algorithms, or keys without a kid.
    /// Returns an error for RSA signing keys whose material is unusable.
    pub(crate) fn to_verification_key(&self) -> Result<Option<VerificationKey>> {
        let accepted = AlgorithmType::RS256;

        if self.kty.as_deref() != Some(accepted.key_type()) {
            return Ok(None);
        }
        if self.key_use.as_deref().is_some_and(|u| u != "sig") {
            return Ok(None);
        }
        if self.alg.as_deref().is_some_and(|a| a != accepted.as_str()) {
            return Ok(None);
        }
        let Some(kid) = self.kid.as_deref() else {
            return Ok(None);
        };

        if kid.len() > MAX_KID_LENGTH {
            return Err(jwk_error(format!(
                "kid too large: {} bytes (maximum: {MAX_KID_LENGTH} bytes)",
                kid.len()
            )));
        }

        let (n, e) = self.rsa_components()?;
        VerificationKey::rsa(kid, &n, &e).map(Some)
    }

    /// Decode modulus and exponent
    fn rsa_components(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        // Base64URL: 4 chars → 3 bytes
        const MAX_DECODED_JWK_N: usize = (MAX_JWK_N_SIZE * 3) / 4;
        const MAX_DECODED_JWK_E: usize = (MAX_JWK_E_SIZE * 3) / 4;

        let n = self
            .n
            .as_deref()
            .ok_or_else(|| jwk_error("rsa key missing n (modulus)"))?;
        let e = self
            .e
            .as_deref()
            .ok_or_else(|| jwk_error("rsa key missing e (exponent)"))?;

        if n.len() > MAX_JWK_N_SIZE {
            return Err(jwk_error(format!(
                "n too large: {} bytes (maximum: {MAX_JWK_N_SIZE} bytes)",
                n.len()
            )));
        }
        if e.len() > MAX_JWK_E_SIZE {
            return Err(jwk_error(format!(
                "e too large: {} bytes (maximum: {MAX_JWK_E_SIZE} bytes)",
                e.len()
            )));
        }

        let n = base64url::decode_bytes(n, MAX_DECODED_JWK_N)
            .map_err(|err| jwk_error(format!("invalid n: {err}")))?;
        let e = base64url::decode_bytes(e, MAX_DECODED_JWK_E)
            .map_err(|err| jwk_error(format!("invalid e: {err}")))?;

        Ok((n, e))
    }
}

fn jwk_error(msg: impl std::fmt::Display) -> Error {
    Error::KeySetUnavailable(format!("jwks: {msg}"))
}
