//! Signature algorithm for bearer credentials
//!
//! Only RS256 (RSASSA-PKCS1-v1_5 with SHA-256) is accepted. Every other
//! `alg` value, including `none` and the HMAC family, is rejected before any
//! key lookup so a public key can never be used as an HMAC secret.

use crate::error::{Error, Result};
use crate::jwks::VerificationKey;
use crate::limits::MAX_ALG_LENGTH;

use aws_lc_rs::signature::{self, UnparsedPublicKey};

/// Algorithm identifier from the credential header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmType {
    RS256,
}

impl AlgorithmType {
    pub(crate) fn from_str(s: &str) -> Result<Self> {
        if s.len() > MAX_ALG_LENGTH {
            return Err(Error::AlgorithmUnsupported(format!(
                "algorithm string too long: {} bytes",
                s.len()
            )));
        }

        match s {
            "RS256" => Ok(AlgorithmType::RS256),
            _ => Err(Error::AlgorithmUnsupported(s.into())),
        }
    }

    /// Convert to string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            AlgorithmType::RS256 => "RS256",
        }
    }

    /// JWK key type that carries keys for this algorithm
    pub(crate) const fn key_type(&self) -> &'static str {
        match self {
            AlgorithmType::RS256 => "RSA",
        }
    }

    fn verification_algorithm(&self) -> &'static dyn signature::VerificationAlgorithm {
        match self {
            AlgorithmType::RS256 => &signature::RSA_PKCS1_2048_8192_SHA256,
        }
    }

    /// Verify `signature` over the exact `signing_input` bytes
    pub(crate) fn verify_signature(
        &self,
        signing_input: &[u8],
        signature: &[u8],
        key: &VerificationKey,
    ) -> Result<()> {
        if key.key_type() != self.key_type() {
            return Err(Error::SignatureInvalid);
        }

        UnparsedPublicKey::new(self.verification_algorithm(), key.spki_der())
            .verify(signing_input, signature)
            .map_err(|_| Error::SignatureInvalid)
    }
}

impl std::fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
