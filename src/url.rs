//! URL validation utilities
//!
//! Issuer values come from unverified claims and are later used to build the
//! key set request, so they are checked for shape and size before anything
//! is fetched.

use crate::error::{Error, Result};
use crate::limits::{MAX_ISSUER_URL_LENGTH, MAX_JWKS_URI_LENGTH};

/// Common URL validation logic, returning a plain message on failure
fn validate_url_common(
    url: &str,
    max_length: usize,
    name: &str,
) -> std::result::Result<url::Url, String> {
    if url.trim().is_empty() {
        return Err(format!("{name} cannot be empty"));
    }

    if url.len() > max_length {
        return Err(format!(
            "{name} too long: {} characters (maximum: {max_length} characters)",
            url.len()
        ));
    }

    let parsed = url
        .parse::<url::Url>()
        .map_err(|e| format!("invalid {name}: {e}"))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!("{name} must use http or https scheme"));
    }

    if parsed.host_str().is_none() {
        return Err(format!("{name} must have a valid host"));
    }

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(format!("{name} must not carry credentials"));
    }

    Ok(parsed)
}

/// Validate issuer URL format and size
///
/// Failures are reported as [`Error::UntrustedIssuer`].
pub(crate) fn validate_issuer_url(issuer: &str) -> Result<()> {
    let parsed = validate_url_common(issuer, MAX_ISSUER_URL_LENGTH, "issuer URL")
        .map_err(|_| Error::UntrustedIssuer(truncate(issuer)))?;

    // OIDC issuers carry no trailing slash, query or fragment
    if issuer.ends_with('/') || parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(Error::UntrustedIssuer(truncate(issuer)));
    }

    Ok(())
}

/// Validate JWKS URI format and size
///
/// Failures are reported as [`Error::KeySetUnavailable`].
pub(crate) fn validate_jwks_uri(uri: &str) -> Result<()> {
    validate_url_common(uri, MAX_JWKS_URI_LENGTH, "JWKS URI")
        .map(|_| ())
        .map_err(|msg| Error::KeySetUnavailable(format!("jwks: {msg}")))
}

/// Build the well-known key set location for an issuer
pub(crate) fn well_known_jwks_url(issuer: &str) -> String {
    format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'))
}

/// Build the OIDC discovery document location for an issuer
pub(crate) fn well_known_discovery_url(issuer: &str) -> String {
    format!(
        "{}/.well-known/openid-configuration",
        issuer.trim_end_matches('/')
    )
}

/// Keep attacker-controlled values short when echoed in errors
fn truncate(value: &str) -> String {
    const MAX_ECHO: usize = 256;
    if value.len() <= MAX_ECHO {
        return value.to_string();
    }
    let mut end = MAX_ECHO;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &value[..end])
}
