use crate::algorithm::AlgorithmType;
use crate::clock::Clock;
use crate::codec;
use crate::error::{Error, Result};
use crate::identity::VerifiedIdentity;
use crate::issuer::IssuerPattern;
use crate::jwks::KeySetCache;
use crate::url::validate_issuer_url;
use std::collections::HashSet;
use std::sync::Arc;

/// Validator function for issuer validation
///
/// Returns `true` if the issuer is trusted, `false` otherwise.
#[allow(clippy::type_complexity)]
pub(crate) type IssuerValidator = Arc<dyn Fn(&str) -> bool + Send + Sync + 'static>;

/// Bearer credential verifier
///
/// The verifier is configured once and reused for every request. Clones share
/// the key set cache. No issuer is trusted until [`issuer`](Self::issuer) or
/// [`trusted_issuers`](Self::trusted_issuers) is configured.
#[derive(Clone)]
pub struct TokenVerifier {
    config_issuer: IssuerValidator,
    config_parties: Option<Arc<HashSet<String>>>,
    cache: Arc<KeySetCache>,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    /// Create a verifier backed by `cache`, trusting no issuer
    ///
    /// Expiry uses the cache's clock unless [`clock`](Self::clock) overrides it.
    pub fn new(cache: Arc<KeySetCache>) -> Self {
        Self {
            config_issuer: Arc::new(|_: &str| false),
            config_parties: None,
            clock: cache.clock(),
            cache,
        }
    }

    /// Configure issuer trust
    ///
    /// The validator function receives the issuer string and returns `true` if
    /// trusted. It is only called for well-formed http(s) issuer URLs.
    pub fn issuer<F>(&mut self, validator: F) -> &mut Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.config_issuer = Arc::new(validator);
        self
    }

    /// Trust issuers matching any of `patterns`
    pub fn trusted_issuers(&mut self, patterns: impl IntoIterator<Item = IssuerPattern>) -> &mut Self {
        let patterns: Vec<IssuerPattern> = patterns.into_iter().collect();
        self.issuer(move |iss| patterns.iter().any(|p| p.matches(iss)))
    }

    /// Restrict accepted authorized parties (azp)
    ///
    /// Credentials without an `azp` claim are still accepted.
    pub fn authorized_parties<I, S>(&mut self, parties: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_parties = Some(Arc::new(parties.into_iter().map(Into::into).collect()));
        self
    }

    /// Time source for expiry checks
    pub fn clock(&mut self, clock: Arc<dyn Clock>) -> &mut Self {
        self.clock = clock;
        self
    }

    pub fn build(&mut self) -> Self {
        self.clone()
    }
}

impl TokenVerifier {
    /// Verify a raw credential and return the identity it asserts
    ///
    /// Cheap checks run first: a credential that is malformed, untrusted or
    /// expired never causes a key set fetch.
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
        let result = self.verify_inner(token).await;
        if let Err(e) = &result {
            tracing::debug!(reason = e.kind(), "credential rejected");
        }
        result
    }

    /// Verify the credential in an `Authorization: Bearer ...` header value
    pub async fn verify_bearer(&self, authorization: &str) -> Result<VerifiedIdentity> {
        let token = codec::bearer_token(authorization).inspect_err(|e| {
            tracing::debug!(reason = e.kind(), "authorization header rejected");
        })?;
        self.verify(token).await
    }

    async fn verify_inner(&self, token: &str) -> Result<VerifiedIdentity> {
        // 1. Decode header, claims and signature
        let decoded = codec::decode(token)?;

        // 2. Key id is required for key set lookup
        let kid = decoded
            .header
            .key_id
            .as_deref()
            .filter(|kid| !kid.is_empty())
            .ok_or(Error::KeyIdMissing)?;

        // 3. Algorithm
        let algorithm = AlgorithmType::from_str(&decoded.header.algorithm)?;

        // 4. Issuer must be present, well-formed and trusted
        let issuer = decoded
            .claims
            .issuer
            .as_deref()
            .filter(|iss| !iss.is_empty())
            .ok_or(Error::IssuerMissing)?;
        validate_issuer_url(issuer)?;
        if !(self.config_issuer)(issuer) {
            return Err(Error::UntrustedIssuer(issuer.to_string()));
        }

        // 5. Expiration
        let now = self.clock.now();
        if let Some(exp) = decoded.claims.expiration {
            if now >= exp {
                return Err(Error::TokenExpired {
                    expired_at: exp,
                    now,
                });
            }
        }

        // 6. Authorized party, when both configured and present
        if let (Some(parties), Some(azp)) = (&self.config_parties, &decoded.claims.authorized_party) {
            if !parties.contains(azp) {
                return Err(Error::UnauthorizedParty(azp.clone()));
            }
        }

        // 7. Key lookup
        let key_set = self.cache.get(issuer).await?;
        let key = key_set
            .find(kid)
            .ok_or_else(|| Error::SigningKeyNotFound(kid.to_string()))?;

        // 8. Signature over the original signing input
        algorithm.verify_signature(
            decoded.signing_input.as_bytes(),
            &decoded.signature,
            key,
        )?;

        tracing::trace!(issuer, kid, "credential verified");

        let issuer = issuer.to_string();
        Ok(VerifiedIdentity::from_claims(decoded.claims, issuer))
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("authorized_parties", &self.config_parties)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
