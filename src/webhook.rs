//! Signed webhook verification
//!
//! Payment processors sign each delivery with a shared secret and send the
//! signature in a header of the form `t=<unix-seconds>,v1=<hex-hmac>`. The
//! signed content is `"{t}.{raw body}"` and the MAC is HMAC-SHA256.
//!
//! Verification order is fixed: parse the header, check the timestamp window,
//! then compare MACs in constant time. The body is only parsed after all three
//! succeed.

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::limits::{
    DEFAULT_WEBHOOK_FUTURE_SKEW, DEFAULT_WEBHOOK_TOLERANCE, MAX_SIGNATURE_HEADER_LENGTH,
    MAX_WEBHOOK_FUTURE_SKEW_SECONDS,
};

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;

/// Shared webhook signing secret
///
/// `Debug` output is redacted.
#[derive(Clone)]
pub struct WebhookSecret(Arc<[u8]>);

impl WebhookSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(Error::ConfigurationInvalid(
                "webhook secret must not be empty".into(),
            ));
        }
        Ok(Self(secret.into()))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

/// Parsed webhook signature header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader<'a> {
    /// Timestamp as sent; the signed content uses this exact text
    timestamp_text: &'a str,
    timestamp: i64,
    signatures: Vec<&'a str>,
}

impl<'a> SignatureHeader<'a> {
    /// Parse `t=<unix-seconds>,v1=<hex>[,v1=<hex>...]`
    ///
    /// Unknown keys, including other scheme versions, are ignored.
    pub fn parse(header: &'a str) -> Result<Self> {
        if header.len() > MAX_SIGNATURE_HEADER_LENGTH {
            return Err(Error::MalformedSignatureHeader(format!(
                "header too long: {} bytes (maximum: {MAX_SIGNATURE_HEADER_LENGTH} bytes)",
                header.len()
            )));
        }

        let mut timestamp_text = None;
        let mut signatures = Vec::new();

        for (key, value) in header
            .split(',')
            .filter_map(|item| item.split_once('='))
            .map(|(key, value)| (key.trim(), value.trim()))
        {
            match key {
                "t" if timestamp_text.is_none() => timestamp_text = Some(value),
                "v1" => signatures.push(value),
                _ => {}
            }
        }

        let timestamp_text = timestamp_text.ok_or_else(|| {
            Error::MalformedSignatureHeader("missing timestamp (t)".into())
        })?;
        let timestamp = timestamp_text
            .parse::<i64>()
            .map_err(|_| Error::MalformedSignatureHeader("timestamp (t) is not an integer".into()))?;

        if signatures.is_empty() {
            return Err(Error::MalformedSignatureHeader(
                "missing v1 signature".into(),
            ));
        }

        Ok(Self {
            timestamp_text,
            timestamp,
            signatures,
        })
    }

    /// Timestamp (t) in Unix seconds
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Number of v1 signatures supplied
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }
}

/// A webhook body whose signature and timestamp were verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedWebhook<'a> {
    timestamp: i64,
    payload: &'a [u8],
}

impl<'a> VerifiedWebhook<'a> {
    /// Timestamp (t) the sender signed
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The verified raw body
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Parse the verified body as a JSON event
    pub fn parse<T: miniserde::Deserialize>(&self) -> Result<T> {
        let body = std::str::from_utf8(self.payload)
            .map_err(|e| Error::MalformedWebhookPayload(format!("utf8 decode failed: {e}")))?;
        miniserde::json::from_str(body)
            .map_err(|_| Error::MalformedWebhookPayload("invalid event json".into()))
    }
}

/// Verifier for HMAC-SHA256 signed webhooks
///
/// Configured once per endpoint and reused for every delivery.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: WebhookSecret,
    tolerance_seconds: u64,
    future_skew_seconds: u64,
    clock: Arc<dyn Clock>,
}

impl WebhookVerifier {
    /// Create a verifier with a 300 second replay window and 60 second future skew
    pub fn new(secret: WebhookSecret) -> Self {
        Self {
            secret,
            tolerance_seconds: DEFAULT_WEBHOOK_TOLERANCE.as_secs(),
            future_skew_seconds: DEFAULT_WEBHOOK_FUTURE_SKEW.as_secs(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Maximum accepted age of a delivery
    pub fn tolerance(&mut self, tolerance: Duration) -> &mut Self {
        self.tolerance_seconds = tolerance.as_secs();
        self
    }

    /// Maximum accepted distance of a timestamp ahead of the local clock
    ///
    /// # Security
    /// Capped at 300 seconds. Larger values are clamped.
    pub fn future_skew(&mut self, skew: Duration) -> &mut Self {
        self.future_skew_seconds = skew.as_secs().min(MAX_WEBHOOK_FUTURE_SKEW_SECONDS);
        self
    }

    /// Time source (default: system clock)
    pub fn clock(&mut self, clock: Arc<dyn Clock>) -> &mut Self {
        self.clock = clock;
        self
    }

    pub fn build(&mut self) -> Self {
        self.clone()
    }

    /// Verify a delivery's raw body against its signature header
    pub fn verify<'a>(&self, payload: &'a [u8], signature_header: &str) -> Result<VerifiedWebhook<'a>> {
        let result = self.verify_inner(payload, signature_header);
        if let Err(e) = &result {
            tracing::debug!(reason = e.kind(), "webhook rejected");
        }
        result
    }

    /// Verify a delivery, then parse its body as a JSON event
    pub fn verify_event<T: miniserde::Deserialize>(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<T> {
        self.verify(payload, signature_header)?.parse()
    }

    fn verify_inner<'a>(&self, payload: &'a [u8], signature_header: &str) -> Result<VerifiedWebhook<'a>> {
        let header = SignatureHeader::parse(signature_header)?;

        let now = self.clock.now();
        let age = now.saturating_sub(header.timestamp);
        let tolerance = i64::try_from(self.tolerance_seconds).unwrap_or(i64::MAX);
        let future_skew = i64::try_from(self.future_skew_seconds).unwrap_or(i64::MAX);
        if age > tolerance || age.saturating_neg() > future_skew {
            return Err(Error::ReplayedOrStaleWebhook {
                timestamp: header.timestamp,
                now,
                tolerance: self.tolerance_seconds,
            });
        }

        let expected = signature_hex(self.secret.as_bytes(), header.timestamp_text, payload)?;

        let mut matched = false;
        for provided in &header.signatures {
            // No early exit: every candidate is compared
            matched |= constant_time_eq(
                expected.as_bytes(),
                provided.to_ascii_lowercase().as_bytes(),
            );
        }

        if !matched {
            return Err(Error::SignatureMismatch);
        }

        Ok(VerifiedWebhook {
            timestamp: header.timestamp,
            payload,
        })
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &self.secret)
            .field("tolerance_seconds", &self.tolerance_seconds)
            .field("future_skew_seconds", &self.future_skew_seconds)
            .finish_non_exhaustive()
    }
}

fn signature_hex(secret: &[u8], timestamp: &str, payload: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|_| Error::ConfigurationInvalid("invalid webhook secret".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Hex-encoded HMAC-SHA256 of `"{timestamp}.{payload}"`
pub fn compute_signature(secret: &WebhookSecret, timestamp: i64, payload: &[u8]) -> Result<String> {
    signature_hex(secret.as_bytes(), &timestamp.to_string(), payload)
}

/// Build a `t=...,v1=...` header for `payload` signed at `timestamp`
pub fn sign_header(secret: &WebhookSecret, timestamp: i64, payload: &[u8]) -> Result<String> {
    let signature = compute_signature(secret, timestamp, payload)?;
    Ok(format!("t={timestamp},v1={signature}"))
}
