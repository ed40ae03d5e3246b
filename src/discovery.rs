//! OIDC Discovery
//!
//! Resolves the key set location from an issuer's
//! `/.well-known/openid-configuration` document, for issuers that do not
//! publish at the default well-known JWKS path.

use crate::error::{Error, Result};
use crate::jwks::fetcher::fetch_url;
use crate::limits::MAX_DISCOVERY_RESPONSE_SIZE;
use crate::url::{validate_jwks_uri, well_known_discovery_url};
use miniserde::Deserialize;

/// Minimal OIDC discovery document containing the JWKS URI
#[derive(Debug, Clone, Deserialize)]
struct OidcDiscovery {
    jwks_uri: String,
}

/// Discover the JWKS URI using the OIDC well-known configuration
///
/// Not cached on its own: discovery only runs when the key set cache misses.
pub(crate) async fn discover_jwks_uri(client: &reqwest::Client, issuer: &str) -> Result<String> {
    let url = well_known_discovery_url(issuer);
    tracing::debug!(issuer, url = %url, "discovering key set location");

    let bytes = fetch_url(client, &url, MAX_DISCOVERY_RESPONSE_SIZE).await?;

    let body = std::str::from_utf8(&bytes)
        .map_err(|e| Error::KeySetUnavailable(format!("discovery: utf8 decode failed: {e}")))?;

    let doc: OidcDiscovery = miniserde::json::from_str(body)
        .map_err(|_| Error::KeySetUnavailable("discovery: invalid discovery json".into()))?;

    if doc.jwks_uri.trim().is_empty() {
        return Err(Error::KeySetUnavailable(
            "discovery: missing or empty jwks_uri".into(),
        ));
    }

    validate_jwks_uri(&doc.jwks_uri)?;

    Ok(doc.jwks_uri)
}
