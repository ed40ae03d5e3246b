//! Shared fixtures for integration tests
//!
//! RSA keys are generated once per test binary. Tokens are signed with
//! aws-lc-rs over JSON built with serde_json, so the bytes under test never
//! come from the code being tested.

#![allow(dead_code)]

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{RSA_PKCS1_SHA256, RsaKeyPair};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, pkcs8::EncodePrivateKey};
use serde_json::{Value, json};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// RSA signing key with its public parts
pub struct TestKey {
    pub kid: &'static str,
    pub keypair: RsaKeyPair,
    pub modulus: Vec<u8>,
    pub exponent: Vec<u8>,
}

impl TestKey {
    fn generate(kid: &'static str) -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate key");
        let pkcs8_doc = private_key
            .to_pkcs8_der()
            .expect("Failed to serialize to PKCS#8");

        Self {
            kid,
            keypair: RsaKeyPair::from_pkcs8(pkcs8_doc.as_bytes()).expect("Failed to load key"),
            modulus: private_key.n().to_bytes_be(),
            exponent: private_key.e().to_bytes_be(),
        }
    }

    /// Public JWK for this key
    pub fn jwk(&self) -> Value {
        json!({
            "kty": "RSA",
            "kid": self.kid,
            "use": "sig",
            "alg": "RS256",
            "n": URL_SAFE_NO_PAD.encode(&self.modulus),
            "e": URL_SAFE_NO_PAD.encode(&self.exponent),
        })
    }

    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut signature = vec![0u8; self.keypair.public_modulus_len()];
        self.keypair
            .sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), data, &mut signature)
            .expect("Failed to sign");
        signature
    }
}

/// Current signing key
pub fn primary_key() -> &'static TestKey {
    static KEY: OnceLock<TestKey> = OnceLock::new();
    KEY.get_or_init(|| TestKey::generate("key-1"))
}

/// Key that replaces [`primary_key`] after a rotation
pub fn rotated_key() -> &'static TestKey {
    static KEY: OnceLock<TestKey> = OnceLock::new();
    KEY.get_or_init(|| TestKey::generate("key-2"))
}

/// JWKS document publishing `keys`
pub fn jwks_json(keys: &[&TestKey]) -> String {
    json!({ "keys": keys.iter().map(|k| k.jwk()).collect::<Vec<_>>() }).to_string()
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs() as i64
}

/// Builder for signed test credentials
pub struct TokenBuilder {
    header: Value,
    claims: Value,
}

impl TokenBuilder {
    /// RS256 credential for `issuer` with subject `user_123`, signed by [`primary_key`]
    pub fn new(issuer: &str) -> Self {
        Self {
            header: json!({ "alg": "RS256", "typ": "JWT", "kid": primary_key().kid }),
            claims: json!({ "sub": "user_123", "iss": issuer }),
        }
    }

    pub fn header(mut self, name: &str, value: Value) -> Self {
        self.header[name] = value;
        self
    }

    pub fn without_header(mut self, name: &str) -> Self {
        if let Some(header) = self.header.as_object_mut() {
            header.remove(name);
        }
        self
    }

    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims[name] = value;
        self
    }

    pub fn without_claim(mut self, name: &str) -> Self {
        if let Some(claims) = self.claims.as_object_mut() {
            claims.remove(name);
        }
        self
    }

    pub fn expiration(self, exp: i64) -> Self {
        self.claim("exp", json!(exp))
    }

    pub fn sign_with(self, key: &TestKey) -> String {
        let header = URL_SAFE_NO_PAD.encode(self.header.to_string());
        let claims = URL_SAFE_NO_PAD.encode(self.claims.to_string());
        let signing_input = format!("{header}.{claims}");
        let signature = URL_SAFE_NO_PAD.encode(key.sign(signing_input.as_bytes()));
        format!("{signing_input}.{signature}")
    }

    pub fn sign(self) -> String {
        self.sign_with(primary_key())
    }
}
