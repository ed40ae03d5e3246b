//! Retrieval of issuer key sets
//!
//! [`KeySetCache`](crate::KeySetCache) calls a [`KeySetFetcher`] on every miss.
//! Production code uses [`HttpKeySetFetcher`]; tests inject their own.

use crate::discovery::discover_jwks_uri;
use crate::error::{Error, Result};
use crate::jwks::{VerificationKey, parse_jwks};
use crate::limits::{DEFAULT_FETCH_TIMEOUT, MAX_JWKS_RESPONSE_SIZE};
use crate::url::{validate_issuer_url, validate_jwks_uri, well_known_jwks_url};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future returned by [`KeySetFetcher::fetch`]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of key sets for an issuer
///
/// Implementations report every failure as [`Error::KeySetUnavailable`] and
/// must not block the calling thread.
pub trait KeySetFetcher: Send + Sync + 'static {
    /// Fetch the current verification keys published by `issuer`
    fn fetch<'a>(&'a self, issuer: &'a str) -> BoxFuture<'a, Result<Vec<VerificationKey>>>;
}

/// Where an issuer publishes its key set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JwksLocation {
    /// `<issuer>/.well-known/jwks.json`
    #[default]
    WellKnown,
    /// The `jwks_uri` named by `<issuer>/.well-known/openid-configuration`
    Discovery,
}

/// Key set fetcher over HTTP(S) using reqwest
///
/// Request timeouts are the client's responsibility; use
/// [`HttpKeySetFetcher::with_default_client`] for a client with one.
#[derive(Debug, Clone)]
pub struct HttpKeySetFetcher {
    client: reqwest::Client,
    location: JwksLocation,
}

impl HttpKeySetFetcher {
    /// Create a fetcher using an existing client
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            location: JwksLocation::default(),
        }
    }

    /// Create a fetcher with a client that times out after 10 seconds
    pub fn with_default_client() -> Result<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a fetcher with a client that times out after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConfigurationInvalid(format!("http client: {e}")))?;
        Ok(Self::new(client))
    }

    /// Choose where key sets are looked up
    pub fn location(mut self, location: JwksLocation) -> Self {
        self.location = location;
        self
    }

    async fn fetch_keys(&self, issuer: &str) -> Result<Vec<VerificationKey>> {
        validate_issuer_url(issuer)
            .map_err(|_| Error::KeySetUnavailable("jwks: invalid issuer URL".into()))?;

        let jwks_uri = match self.location {
            JwksLocation::WellKnown => well_known_jwks_url(issuer),
            JwksLocation::Discovery => discover_jwks_uri(&self.client, issuer).await?,
        };
        validate_jwks_uri(&jwks_uri)?;

        tracing::debug!(issuer, jwks_uri = %jwks_uri, "fetching key set");
        let body = fetch_url(&self.client, &jwks_uri, MAX_JWKS_RESPONSE_SIZE).await?;

        parse_jwks(&body)
    }
}

impl KeySetFetcher for HttpKeySetFetcher {
    fn fetch<'a>(&'a self, issuer: &'a str) -> BoxFuture<'a, Result<Vec<VerificationKey>>> {
        Box::pin(self.fetch_keys(issuer))
    }
}

/// GET `url`, reading at most `max_size` bytes of body
pub(crate) async fn fetch_url(
    client: &reqwest::Client,
    url: &str,
    max_size: usize,
) -> Result<Vec<u8>> {
    let mut response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| Error::KeySetUnavailable(format!("network: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::KeySetUnavailable(format!(
            "http: status {}",
            response.status()
        )));
    }

    let too_large = |size: usize| {
        Error::KeySetUnavailable(format!(
            "response too large: {size} bytes (maximum: {max_size} bytes)"
        ))
    };

    if let Some(length) = response.content_length() {
        if length > max_size as u64 {
            return Err(too_large(length as usize));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::KeySetUnavailable(format!("network: {e}")))?
    {
        if body.len() + chunk.len() > max_size {
            return Err(too_large(body.len() + chunk.len()));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
