//! Errors for trustgate

use thiserror::Error;

/// Verification failures
///
/// Every variant is terminal for the current verification attempt. Messages
/// never contain secrets, key material or signature bytes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Bearer Token Errors
    // ============================================================================
    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    #[error("Credential header has no key id (kid)")]
    KeyIdMissing,

    #[error("Credential algorithm '{0}' is not accepted")]
    AlgorithmUnsupported(String),

    #[error("Credential claims have no issuer (iss)")]
    IssuerMissing,

    #[error("Issuer '{0}' is not trusted")]
    UntrustedIssuer(String),

    #[error("Token expired at {expired_at} (now: {now})")]
    TokenExpired { expired_at: i64, now: i64 },

    #[error("Authorized party '{0}' is not allowed")]
    UnauthorizedParty(String),

    #[error("Key set unavailable: {0}")]
    KeySetUnavailable(String),

    #[error("No signing key with kid '{0}' in key set")]
    SigningKeyNotFound(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    // ============================================================================
    // Webhook Errors
    // ============================================================================
    #[error("Malformed webhook signature header: {0}")]
    MalformedSignatureHeader(String),

    #[error("Webhook timestamp {timestamp} outside tolerance (now: {now}, tolerance: {tolerance}s)")]
    ReplayedOrStaleWebhook {
        timestamp: i64,
        now: i64,
        tolerance: u64,
    },

    #[error("Webhook signature mismatch")]
    SignatureMismatch,

    #[error("Webhook payload could not be parsed: {0}")]
    MalformedWebhookPayload(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

impl Error {
    /// Short, stable name of the failure kind
    ///
    /// Suitable for log fields and metrics labels; never contains input data.
    pub const fn kind(&self) -> &'static str {
        match self {
            Error::MalformedCredential(_) => "malformed_credential",
            Error::KeyIdMissing => "key_id_missing",
            Error::AlgorithmUnsupported(_) => "algorithm_unsupported",
            Error::IssuerMissing => "issuer_missing",
            Error::UntrustedIssuer(_) => "untrusted_issuer",
            Error::TokenExpired { .. } => "token_expired",
            Error::UnauthorizedParty(_) => "unauthorized_party",
            Error::KeySetUnavailable(_) => "key_set_unavailable",
            Error::SigningKeyNotFound(_) => "signing_key_not_found",
            Error::SignatureInvalid => "signature_invalid",
            Error::MalformedSignatureHeader(_) => "malformed_signature_header",
            Error::ReplayedOrStaleWebhook { .. } => "replayed_or_stale_webhook",
            Error::SignatureMismatch => "signature_mismatch",
            Error::MalformedWebhookPayload(_) => "malformed_webhook_payload",
            Error::ConfigurationInvalid(_) => "configuration_invalid",
        }
    }
}

/// Result type alias for trustgate operations
pub type Result<T> = std::result::Result<T, Error>;
