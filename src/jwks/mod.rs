//! JSON Web Key Set (JWKS) module
//!
//! Fetched key sets are converted into immutable [`KeySetSnapshot`]s holding
//! only keys usable for RS256 verification, then cached per issuer by
//! [`KeySetCache`].

pub(crate) mod cache;
pub(crate) mod fetcher;
pub(crate) mod jwk;

pub use cache::{KeySetCache, KeySetCacheBuilder};
pub use fetcher::{BoxFuture, HttpKeySetFetcher, JwksLocation, KeySetFetcher};

use crate::error::{Error, Result};
use crate::limits::MAX_JWK_SET_SIZE;
use crate::utils::der::rsa_spki_from_n_e;
use jwk::JwkSet;
use std::collections::HashSet;

/// Public key material for one signing key
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationKey {
    kid: String,
    key_type: String,
    modulus: Vec<u8>,
    exponent: Vec<u8>,
    spki_der: Vec<u8>,
}

impl VerificationKey {
    /// Build an RSA verification key from big-endian modulus and exponent bytes
    pub fn rsa(kid: impl Into<String>, modulus: &[u8], exponent: &[u8]) -> Result<Self> {
        let spki_der = rsa_spki_from_n_e(modulus, exponent)?;
        Ok(Self {
            kid: kid.into(),
            key_type: "RSA".into(),
            modulus: modulus.to_vec(),
            exponent: exponent.to_vec(),
            spki_der,
        })
    }

    /// Key identifier (kid)
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Key type (kty), e.g. "RSA"
    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    /// RSA modulus (n), big-endian
    pub fn modulus(&self) -> &[u8] {
        &self.modulus
    }

    /// RSA public exponent (e), big-endian
    pub fn exponent(&self) -> &[u8] {
        &self.exponent
    }

    /// DER-encoded SubjectPublicKeyInfo
    pub(crate) fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.kid)
            .field("key_type", &self.key_type)
            .field("modulus_bits", &(self.modulus.len() * 8))
            .finish()
    }
}

/// Key set fetched for one issuer at one point in time
///
/// Snapshots are never modified; a refresh replaces the whole snapshot.
#[derive(Debug, Clone)]
pub struct KeySetSnapshot {
    keys: Vec<VerificationKey>,
    fetched_at: i64,
}

impl KeySetSnapshot {
    /// Create a snapshot, rejecting ambiguous or oversized key sets
    pub fn new(keys: Vec<VerificationKey>, fetched_at: i64) -> Result<Self> {
        if keys.len() > MAX_JWK_SET_SIZE {
            return Err(Error::KeySetUnavailable(format!(
                "jwks: too many keys: {} (maximum: {MAX_JWK_SET_SIZE})",
                keys.len()
            )));
        }

        let mut seen = HashSet::with_capacity(keys.len());
        for key in &keys {
            if !seen.insert(key.kid()) {
                return Err(Error::KeySetUnavailable(format!(
                    "jwks: duplicate kid '{}'",
                    key.kid()
                )));
            }
        }

        Ok(Self { keys, fetched_at })
    }

    /// Find the key with identifier `kid`
    pub fn find(&self, kid: &str) -> Option<&VerificationKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    /// Keys in the order the issuer published them
    pub fn keys(&self) -> &[VerificationKey] {
        &self.keys
    }

    /// Unix timestamp at which the key set was fetched
    pub fn fetched_at(&self) -> i64 {
        self.fetched_at
    }

    /// Whether the snapshot is younger than `ttl_seconds` at `now`
    pub fn is_fresh(&self, now: i64, ttl_seconds: u64) -> bool {
        now.saturating_sub(self.fetched_at) < i64::try_from(ttl_seconds).unwrap_or(i64::MAX)
    }
}

/// Parse a JWKS document into the keys usable for verification
///
/// Entries that are not RSA signing keys, or whose material does not decode,
/// are skipped. A document that is not a JWKS fails as a whole.
pub fn parse_jwks(body: &[u8]) -> Result<Vec<VerificationKey>> {
    let body = std::str::from_utf8(body)
        .map_err(|e| Error::KeySetUnavailable(format!("jwks: utf8 decode failed: {e}")))?;

    let set: JwkSet = miniserde::json::from_str(body)
        .map_err(|_| Error::KeySetUnavailable("jwks: invalid jwks json".into()))?;

    if set.keys.len() > MAX_JWK_SET_SIZE {
        return Err(Error::KeySetUnavailable(format!(
            "jwks: too many keys: {} (maximum: {MAX_JWK_SET_SIZE})",
            set.keys.len()
        )));
    }

    let mut keys = Vec::with_capacity(set.keys.len());
    for jwk in &set.keys {
        match jwk.to_verification_key() {
            Ok(Some(key)) => keys.push(key),
            Ok(None) => {
                tracing::warn!(kid = ?jwk.kid, kty = ?jwk.kty, "skipping non-RS256 key");
            }
            Err(e) => {
                tracing::warn!(kid = ?jwk.kid, error = %e, "skipping unusable key");
            }
        }
    }

    Ok(keys)
}
