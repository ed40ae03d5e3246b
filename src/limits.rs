//! Size limit and time window constants

use std::time::Duration;

/// Maximum length for a credential string (64KB)
pub(crate) const MAX_TOKEN_LENGTH: usize = 64 * 1024;

/// Maximum length for issuer URLs (2048 characters)
pub(crate) const MAX_ISSUER_URL_LENGTH: usize = 2048;

/// Maximum length for JWKS URIs (2048 characters)
pub(crate) const MAX_JWKS_URI_LENGTH: usize = 2048;

/// Maximum size for OIDC discovery response (64KB)
pub(crate) const MAX_DISCOVERY_RESPONSE_SIZE: usize = 64 * 1024;

/// Maximum size for JWKS response (512KB)
pub(crate) const MAX_JWKS_RESPONSE_SIZE: usize = 512 * 1024;

/// Maximum number of keys in a JWK set (100 keys)
pub(crate) const MAX_JWK_SET_SIZE: usize = 100;

// ============================================================================
// Decoded segment size limits
// ============================================================================

/// Maximum size for decoded header JSON (8KB)
pub(crate) const MAX_DECODED_HEADER_SIZE: usize = 8 * 1024;

/// Maximum size for decoded claims JSON (64KB)
pub(crate) const MAX_DECODED_PAYLOAD_SIZE: usize = 64 * 1024;

/// Maximum size for decoded signature bytes (1KB)
/// An RS256 signature is as long as the modulus: 256-1024 bytes for 2048-8192 bit keys
pub(crate) const MAX_DECODED_SIGNATURE_SIZE: usize = 1024;

/// Maximum size for Base64URL-encoded signature segment (1.5KB)
pub(crate) const MAX_SIGNATURE_B64_SIZE: usize = 1536;

// ============================================================================
// JWK field size limits
// ============================================================================

/// Maximum size for Base64URL-encoded RSA modulus (n) field (12KB)
pub(crate) const MAX_JWK_N_SIZE: usize = 12 * 1024;

/// Maximum size for Base64URL-encoded RSA exponent (e) field (64 bytes)
pub(crate) const MAX_JWK_E_SIZE: usize = 64;

// ============================================================================
// Header and claim limits
// ============================================================================

/// Maximum length for algorithm (alg) field in the header (16 bytes)
pub(crate) const MAX_ALG_LENGTH: usize = 16;

/// Maximum length for key ID (kid), in the header and in JWKs (256 bytes)
pub(crate) const MAX_KID_LENGTH: usize = 256;

/// Maximum length for claim string values (2048 bytes)
pub(crate) const MAX_CLAIM_STRING_LENGTH: usize = 2048;

// ============================================================================
// Key set cache
// ============================================================================

/// Default lifetime of a fetched key set snapshot (1 hour)
pub const DEFAULT_KEY_SET_TTL: Duration = Duration::from_secs(3600);

/// Longest key set lifetime accepted from configuration (1 day)
pub(crate) const MAX_KEY_SET_TTL: Duration = Duration::from_secs(24 * 3600);

/// Default number of issuers whose key sets are cached
pub(crate) const DEFAULT_MAX_CACHED_ISSUERS: u64 = 64;

/// Default timeout for the outbound key set request
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Webhooks
// ============================================================================

/// Maximum length of the webhook signature header (8KB)
pub(crate) const MAX_SIGNATURE_HEADER_LENGTH: usize = 8 * 1024;

/// Default replay window for webhook timestamps (300 seconds)
pub const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(300);

/// Longest replay window accepted from configuration (1 hour)
pub(crate) const MAX_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(3600);

/// Default allowance for webhook timestamps ahead of the local clock (60 seconds)
pub const DEFAULT_WEBHOOK_FUTURE_SKEW: Duration = Duration::from_secs(60);

/// Upper bound for the future skew allowance (300 seconds)
/// Larger values would let a captured request be replayed long after delivery
pub(crate) const MAX_WEBHOOK_FUTURE_SKEW_SECONDS: u64 = 300;
