//! Per-issuer key set cache
//!
//! Holds at most one [`KeySetSnapshot`] per issuer. A snapshot is served
//! while it is younger than the TTL according to the injected [`Clock`];
//! otherwise the [`KeySetFetcher`] is called and the entry is replaced with a
//! complete new snapshot. Failed fetches leave the entry untouched and are
//! never answered with stale keys.

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::jwks::KeySetSnapshot;
use crate::jwks::fetcher::KeySetFetcher;
use crate::limits::{DEFAULT_KEY_SET_TTL, DEFAULT_MAX_CACHED_ISSUERS, MAX_KEY_SET_TTL};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Cache of issuer key sets
///
/// Concurrent misses for one issuer may each fetch; the last completed fetch
/// wins. Readers only ever see complete snapshots.
pub struct KeySetCache {
    entries: Cache<String, Arc<KeySetSnapshot>>,
    fetcher: Arc<dyn KeySetFetcher>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl KeySetCache {
    /// Create a cache with default TTL (1 hour), system clock and capacity
    pub fn new(fetcher: impl KeySetFetcher) -> Self {
        Self::builder(fetcher).build()
    }

    /// Configure a cache
    pub fn builder(fetcher: impl KeySetFetcher) -> KeySetCacheBuilder {
        KeySetCacheBuilder {
            fetcher: Arc::new(fetcher),
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_KEY_SET_TTL,
            max_issuers: DEFAULT_MAX_CACHED_ISSUERS,
        }
    }

    /// Key set for `issuer`, no older than the TTL
    ///
    /// Fetches when the cached snapshot is absent or expired.
    pub async fn get(&self, issuer: &str) -> Result<Arc<KeySetSnapshot>> {
        let now = self.clock.now();

        match self.entries.get(issuer).await {
            Some(snapshot) if snapshot.is_fresh(now, self.ttl.as_secs()) => {
                tracing::debug!(issuer, "key set cache hit");
                return Ok(snapshot);
            }
            Some(snapshot) => {
                tracing::debug!(
                    issuer,
                    fetched_at = snapshot.fetched_at(),
                    "key set expired, refreshing"
                );
            }
            None => {
                tracing::debug!(issuer, "key set cache miss");
            }
        }

        let keys = self.fetcher.fetch(issuer).await.map_err(|e| {
            tracing::warn!(issuer, error = %e, "key set fetch failed");
            match e {
                Error::KeySetUnavailable(_) => e,
                other => Error::KeySetUnavailable(other.to_string()),
            }
        })?;

        let snapshot = KeySetSnapshot::new(keys, self.clock.now())
            .map(Arc::new)
            .inspect_err(|e| {
                tracing::warn!(issuer, error = %e, "key set rejected");
            })?;
        self.entries
            .insert(issuer.to_string(), Arc::clone(&snapshot))
            .await;

        tracing::debug!(
            issuer,
            keys = snapshot.keys().len(),
            "key set refreshed"
        );

        Ok(snapshot)
    }

    /// Drop the cached key set for `issuer`; the next `get` fetches
    pub async fn invalidate(&self, issuer: &str) {
        self.entries.invalidate(issuer).await;
    }

    /// Snapshot currently cached for `issuer`, regardless of age
    pub async fn peek(&self, issuer: &str) -> Option<Arc<KeySetSnapshot>> {
        self.entries.get(issuer).await
    }

    /// The clock this cache measures freshness with
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Snapshot lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.entry_count())
            .finish_non_exhaustive()
    }
}

/// Builder for [`KeySetCache`]
pub struct KeySetCacheBuilder {
    fetcher: Arc<dyn KeySetFetcher>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    max_issuers: u64,
}

impl KeySetCacheBuilder {
    /// Snapshot lifetime (default: 1 hour)
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Time source used for freshness (default: system clock)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Maximum number of issuers kept (default: 64)
    pub fn max_issuers(mut self, max_issuers: u64) -> Self {
        self.max_issuers = max_issuers;
        self
    }

    pub fn build(self) -> KeySetCache {
        // moka's own TTL only bounds memory; freshness is decided against `clock`
        let entries = Cache::builder()
            .max_capacity(self.max_issuers)
            .time_to_live(self.ttl.clamp(Duration::from_secs(1), MAX_KEY_SET_TTL))
            .build();

        KeySetCache {
            entries,
            fetcher: self.fetcher,
            clock: self.clock,
            ttl: self.ttl,
        }
    }
}
