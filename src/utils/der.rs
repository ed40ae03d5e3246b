//! DER encoding of RSA public keys
//!
//! Converts the modulus and exponent published in a JWK into the DER
//! SubjectPublicKeyInfo that aws-lc-rs verifies against, using the RustCrypto
//! `spki` and `der` crates.

use crate::error::{Error, Result};
use der::{Encode, Sequence, asn1::BitString, asn1::UintRef};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

/// rsaEncryption (PKCS #1)
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Largest accepted modulus: 8192 bits
const MAX_RSA_MODULUS_SIZE: usize = 1024;

fn jwks_error(operation: &str, details: impl std::fmt::Display) -> Error {
    Error::KeySetUnavailable(format!("jwks: {operation}: {details}"))
}

/// RSAPublicKey as defined in RFC 8017:
///
/// ```text
/// RSAPublicKey ::= SEQUENCE {
///     modulus           INTEGER,  -- n
///     publicExponent    INTEGER   -- e
/// }
/// ```
#[derive(Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

/// Build DER-encoded SubjectPublicKeyInfo from big-endian modulus and exponent bytes
pub(crate) fn rsa_spki_from_n_e(n: &[u8], e: &[u8]) -> Result<Vec<u8>> {
    if n.is_empty() || e.is_empty() {
        return Err(jwks_error("rsa key missing n or e", "empty value"));
    }

    // Leading zero octets do not count towards the key size
    let significant = n.iter().skip_while(|b| **b == 0).count();
    if significant > MAX_RSA_MODULUS_SIZE {
        return Err(jwks_error(
            "RSA modulus too large",
            format!("{significant} bytes (maximum: {MAX_RSA_MODULUS_SIZE} bytes)"),
        ));
    }

    let rsa_pubkey = RsaPublicKey {
        modulus: UintRef::new(n).map_err(|e| jwks_error("failed to encode RSA modulus", e))?,
        public_exponent: UintRef::new(e)
            .map_err(|e| jwks_error("failed to encode RSA exponent", e))?,
    };

    let rsa_pubkey_der = rsa_pubkey
        .to_der()
        .map_err(|e| jwks_error("failed to encode RSA public key", e))?;

    let spki = SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: RSA_ENCRYPTION_OID,
            parameters: Some(der::asn1::AnyRef::NULL.into()),
        },
        subject_public_key: BitString::new(0, rsa_pubkey_der)
            .map_err(|e| jwks_error("failed to create bit string", e))?,
    };

    spki.to_der()
        .map_err(|e| jwks_error("failed to encode SPKI", e))
}
