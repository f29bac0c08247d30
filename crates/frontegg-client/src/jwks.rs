//! Vendor key-set resolution
//!
//! Fetches the platform's published JWKS from the vendor plane's well-known
//! endpoint and finds verification keys by `kid`. The baseline resolves a
//! fresh set on every call; an opt-in bounded-TTL cache is available so a
//! rotated or revoked key can never be served past the TTL.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use jsonwebtoken::jwk::{Jwk, JwkSet};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpRequest, Transport};

/// Media type requested from the key-set endpoint
pub const JWK_SET_CONTENT_TYPE: &str = "application/jwk-set+json";

#[derive(Debug, Clone)]
struct CachedKeySet {
    keys: JwkSet,
    cached_at: SystemTime,
    ttl: Duration,
}

impl CachedKeySet {
    fn is_valid(&self) -> bool {
        match SystemTime::now().duration_since(self.cached_at) {
            Ok(age) => age < self.ttl,
            Err(_) => false, // Clock went backwards, invalidate
        }
    }
}

/// Fetches the vendor's published verification keys on demand
pub struct KeySetResolver {
    jwks_url: String,
    transport: Arc<dyn Transport>,
    // Cache keyed by this resolver's URL; None means fetch-per-call.
    cache_ttl: Option<Duration>,
    cache: RwLock<Option<CachedKeySet>>,
}

impl std::fmt::Debug for KeySetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetResolver")
            .field("jwks_url", &self.jwks_url)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl KeySetResolver {
    /// Create a resolver that fetches a fresh key set on every call
    pub fn new(jwks_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            transport,
            cache_ttl: None,
            cache: RwLock::new(None),
        }
    }

    /// Enable the in-process cache with a bounded time-to-live
    ///
    /// Keys are at most `ttl` stale; after that the next resolution fetches
    /// again.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// The key-set endpoint this resolver reads from
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch the key set, honoring the cache when one is configured
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::KeyFetch`] for a non-2xx response or an
    /// unparsable body, [`ClientError::Transport`] for network faults.
    pub async fn fetch(&self) -> ClientResult<JwkSet> {
        if self.cache_ttl.is_some() {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    debug!(jwks_url = %self.jwks_url, "Using cached key set");
                    return Ok(cached.keys.clone());
                }
            }
        }

        let keys = self.fetch_fresh().await?;

        if let Some(ttl) = self.cache_ttl {
            let mut cache = self.cache.write().await;
            *cache = Some(CachedKeySet {
                keys: keys.clone(),
                cached_at: SystemTime::now(),
                ttl,
            });
        }
        Ok(keys)
    }

    /// Fetch the key set and find the key matching `kid`
    ///
    /// # Errors
    ///
    /// [`ClientError::KeyNotFound`] when no entry carries the identifier;
    /// the fetch failure modes of [`Self::fetch`] otherwise.
    pub async fn resolve(&self, kid: &str) -> ClientResult<Jwk> {
        let keys = self.fetch().await?;
        keys.find(kid).cloned().ok_or_else(|| {
            error!(kid, jwks_url = %self.jwks_url, "Key identifier not in vendor key set");
            ClientError::KeyNotFound {
                kid: kid.to_string(),
            }
        })
    }

    async fn fetch_fresh(&self) -> ClientResult<JwkSet> {
        info!(jwks_url = %self.jwks_url, "Fetching vendor key set");

        let request = HttpRequest::get(&self.jwks_url).header("Accept", JWK_SET_CONTENT_TYPE);
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            error!(
                jwks_url = %self.jwks_url,
                status = response.status,
                "Key-set endpoint returned error status"
            );
            return Err(ClientError::KeyFetch(format!(
                "key-set endpoint returned status {}",
                response.status
            )));
        }

        let keys: JwkSet = response
            .json()
            .map_err(|e| ClientError::KeyFetch(format!("invalid key set: {e}")))?;

        debug!(key_count = keys.keys.len(), "Fetched vendor key set");
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_key_set_validity_window() {
        let keys = JwkSet { keys: vec![] };
        let fresh = CachedKeySet {
            keys: keys.clone(),
            cached_at: SystemTime::now(),
            ttl: Duration::from_secs(300),
        };
        assert!(fresh.is_valid());

        let stale = CachedKeySet {
            keys,
            cached_at: SystemTime::now() - Duration::from_secs(301),
            ttl: Duration::from_secs(300),
        };
        assert!(!stale.is_valid());
    }
}
