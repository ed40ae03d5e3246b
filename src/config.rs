//! Deployment configuration sourced from environment variables

use crate::error::{Error, Result};
use crate::issuer::IssuerPattern;
use crate::jwks::{HttpKeySetFetcher, JwksLocation, KeySetCache};
use crate::limits::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_KEY_SET_TTL, DEFAULT_WEBHOOK_TOLERANCE, MAX_KEY_SET_TTL,
    MAX_WEBHOOK_TOLERANCE,
};
use crate::verifier::TokenVerifier;
use crate::webhook::{WebhookSecret, WebhookVerifier};
use std::sync::Arc;
use std::time::Duration;

const ENV_ISSUERS: &str = "TRUSTGATE_ISSUERS";
const ENV_AUTHORIZED_PARTIES: &str = "TRUSTGATE_AUTHORIZED_PARTIES";
const ENV_JWKS_TTL_SECS: &str = "TRUSTGATE_JWKS_TTL_SECS";
const ENV_JWKS_FETCH_TIMEOUT_SECS: &str = "TRUSTGATE_JWKS_FETCH_TIMEOUT_SECS";
const ENV_JWKS_DISCOVERY: &str = "TRUSTGATE_JWKS_DISCOVERY";
const ENV_WEBHOOK_SECRET: &str = "TRUSTGATE_WEBHOOK_SECRET";
const ENV_WEBHOOK_TOLERANCE_SECS: &str = "TRUSTGATE_WEBHOOK_TOLERANCE_SECS";

/// Trust configuration for one deployment
///
/// | Variable | Default |
/// |---|---|
/// | `TRUSTGATE_ISSUERS` | required, comma-separated issuer patterns |
/// | `TRUSTGATE_AUTHORIZED_PARTIES` | unset (any azp accepted) |
/// | `TRUSTGATE_JWKS_TTL_SECS` | 3600, at most 86400 |
/// | `TRUSTGATE_JWKS_FETCH_TIMEOUT_SECS` | 10 |
/// | `TRUSTGATE_JWKS_DISCOVERY` | false |
/// | `TRUSTGATE_WEBHOOK_SECRET` | unset (webhooks disabled) |
/// | `TRUSTGATE_WEBHOOK_TOLERANCE_SECS` | 300, at most 3600 |
#[derive(Debug, Clone)]
pub struct TrustConfig {
    /// Issuers whose credentials are accepted
    pub issuers: Vec<IssuerPattern>,
    /// Accepted authorized parties; `None` accepts any
    pub authorized_parties: Option<Vec<String>>,
    /// Key set snapshot lifetime
    pub jwks_ttl: Duration,
    /// Timeout for outbound key set requests
    pub jwks_fetch_timeout: Duration,
    /// Where key sets are looked up
    pub jwks_location: JwksLocation,
    /// Webhook signing secret, if webhooks are accepted
    pub webhook_secret: Option<WebhookSecret>,
    /// Webhook replay window
    pub webhook_tolerance: Duration,
}

impl TrustConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value if set
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let issuers = lookup(ENV_ISSUERS)
            .map(|value| {
                split_list(&value)
                    .map(IssuerPattern::parse)
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();
        if issuers.is_empty() {
            return Err(Error::ConfigurationInvalid(format!(
                "{ENV_ISSUERS} must name at least one issuer"
            )));
        }

        let authorized_parties = lookup(ENV_AUTHORIZED_PARTIES)
            .map(|value| split_list(&value).map(str::to_string).collect::<Vec<_>>())
            .filter(|parties| !parties.is_empty());

        let jwks_ttl = seconds(&lookup, ENV_JWKS_TTL_SECS)?.unwrap_or(DEFAULT_KEY_SET_TTL);
        at_most(ENV_JWKS_TTL_SECS, jwks_ttl, MAX_KEY_SET_TTL)?;
        let jwks_fetch_timeout =
            seconds(&lookup, ENV_JWKS_FETCH_TIMEOUT_SECS)?.unwrap_or(DEFAULT_FETCH_TIMEOUT);
        if jwks_fetch_timeout.is_zero() {
            return Err(Error::ConfigurationInvalid(format!(
                "{ENV_JWKS_FETCH_TIMEOUT_SECS} must be greater than zero"
            )));
        }

        let jwks_location = match lookup(ENV_JWKS_DISCOVERY).as_deref().map(str::trim) {
            None | Some("") => JwksLocation::WellKnown,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => JwksLocation::Discovery,
                "0" | "false" | "no" => JwksLocation::WellKnown,
                _ => {
                    return Err(Error::ConfigurationInvalid(format!(
                        "{ENV_JWKS_DISCOVERY} must be true or false"
                    )));
                }
            },
        };

        let webhook_secret = lookup(ENV_WEBHOOK_SECRET)
            .filter(|secret| !secret.is_empty())
            .map(WebhookSecret::new)
            .transpose()?;
        let webhook_tolerance =
            seconds(&lookup, ENV_WEBHOOK_TOLERANCE_SECS)?.unwrap_or(DEFAULT_WEBHOOK_TOLERANCE);
        at_most(ENV_WEBHOOK_TOLERANCE_SECS, webhook_tolerance, MAX_WEBHOOK_TOLERANCE)?;

        Ok(Self {
            issuers,
            authorized_parties,
            jwks_ttl,
            jwks_fetch_timeout,
            jwks_location,
            webhook_secret,
            webhook_tolerance,
        })
    }

    /// Build an HTTP-backed key set cache
    pub fn key_set_cache(&self) -> Result<KeySetCache> {
        let fetcher =
            HttpKeySetFetcher::with_timeout(self.jwks_fetch_timeout)?.location(self.jwks_location);
        Ok(KeySetCache::builder(fetcher).ttl(self.jwks_ttl).build())
    }

    /// Build a token verifier over `cache` with the configured trust settings
    pub fn token_verifier(&self, cache: Arc<KeySetCache>) -> TokenVerifier {
        let mut verifier = TokenVerifier::new(cache);
        verifier.trusted_issuers(self.issuers.iter().cloned());
        if let Some(parties) = &self.authorized_parties {
            verifier.authorized_parties(parties.iter().cloned());
        }
        verifier.build()
    }

    /// Build a webhook verifier, if a secret is configured
    pub fn webhook_verifier(&self) -> Option<WebhookVerifier> {
        self.webhook_secret.clone().map(|secret| {
            WebhookVerifier::new(secret)
                .tolerance(self.webhook_tolerance)
                .build()
        })
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn seconds<F>(lookup: &F, name: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    Error::ConfigurationInvalid(format!("{name} must be a whole number of seconds"))
                })
        })
        .transpose()
}

fn at_most(name: &str, value: Duration, max: Duration) -> Result<()> {
    if value > max {
        return Err(Error::ConfigurationInvalid(format!(
            "{name} must be at most {} seconds",
            max.as_secs()
        )));
    }
    Ok(())
}
