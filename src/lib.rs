//! Bearer credential and webhook signature verification.
//!
//! **trustgate** decides whether an inbound request may be trusted. It covers two paths:
//!
//! - **Bearer credentials**: RS256-signed tokens from a trusted identity provider, verified
//!   against the provider's published key set. Key sets are fetched over HTTPS and cached per
//!   issuer with a fixed lifetime, so signing key rotation is picked up without a restart.
//! - **Webhooks**: deliveries signed with HMAC-SHA256 over `"{timestamp}.{body}"` and a
//!   shared secret, checked against a replay window before the body is parsed.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use trustgate::*;
//!
//! let cache = Arc::new(KeySetCache::new(HttpKeySetFetcher::with_default_client()?));
//! let verifier = TokenVerifier::new(cache)
//!     .trusted_issuers([IssuerPattern::parse("https://auth.example.com")?])
//!     .build();
//!
//! let identity = verifier.verify_bearer(authorization_header).await?;
//! println!("Subject: {}", identity.subject());
//!
//! let webhooks = WebhookVerifier::new(WebhookSecret::new(secret)?).build();
//! let delivery = webhooks.verify(body, signature_header)?;
//! ```
//!
//! ## Verification order
//!
//! Credentials are checked cheapest first, and a failure stops the pipeline:
//!
//! ```text
//! decode ─▶ kid ─▶ alg ─▶ iss ─▶ exp ─▶ azp ─▶ key set ─▶ kid lookup ─▶ signature
//! ```
//!
//! Nothing before the key set step touches the network, so malformed, untrusted and
//! expired credentials never cause a fetch. Only [`TokenVerifier`] constructs a
//! [`VerifiedIdentity`].
//!
//! ## Key set freshness
//!
//! A cached key set is served while `now - fetched_at < ttl` (default one hour). After that
//! it is refetched; if the refetch fails the request fails with
//! [`Error::KeySetUnavailable`]. Stale keys are never served.
//!
//! ## Configuration
//!
//! [`TrustConfig::from_env`] reads `TRUSTGATE_*` variables and builds the cache and both
//! verifiers. See [`TrustConfig`] for the variable list.

mod error;
mod jwks;

// Internal modules
pub(crate) mod algorithm;
pub(crate) mod claims;
pub(crate) mod clock;
pub(crate) mod config;
pub(crate) mod discovery;
pub(crate) mod header;
pub(crate) mod issuer;
pub(crate) mod url;
pub(crate) mod utils;
pub(crate) mod verifier;
pub(crate) mod webhook;

pub mod codec;

mod identity;

// Public Interface
pub use algorithm::AlgorithmType;
pub use claims::Claims;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{DecodedToken, bearer_token};
pub use config::TrustConfig;
pub use error::{Error, Result};
pub use header::TokenHeader;
pub use identity::VerifiedIdentity;
pub use issuer::IssuerPattern;
pub use jwks::{
    BoxFuture, HttpKeySetFetcher, JwksLocation, KeySetCache, KeySetCacheBuilder, KeySetFetcher,
    KeySetSnapshot, VerificationKey, parse_jwks,
};
pub use limits::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_KEY_SET_TTL, DEFAULT_WEBHOOK_FUTURE_SKEW,
    DEFAULT_WEBHOOK_TOLERANCE,
};
pub use verifier::TokenVerifier;
pub use webhook::{
    SignatureHeader, VerifiedWebhook, WebhookSecret, WebhookVerifier, compute_signature,
    sign_header,
};

pub(crate) mod limits;
