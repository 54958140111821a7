//! Host auth token caching.
//!
//! Embedded hosts hand out short-lived auth tokens for API calls made on
//! the player's behalf. The cache is an explicitly owned object with an
//! explicit invalidate, not ambient module state; whoever needs tokens gets
//! handed the cache.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

/// Tokens are refreshed while this much validity remains.
pub const EXPIRY_BUFFER: Duration = Duration::from_secs(5 * 60);

/// Assumed token lifetime; hosts issue hour-long tokens, refresh at 55.
pub const ASSUMED_LIFETIME: Duration = Duration::from_secs(55 * 60);

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("token fetch failed: {0}")]
    Fetch(String),
}

/// Obtains a fresh token from the host.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch_token(&self) -> Result<String, AuthError>;
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Explicitly lifetimed token cache over an injected fetcher.
pub struct AuthTokenCache {
    fetcher: Arc<dyn TokenFetcher>,
    slot: Mutex<Option<CachedToken>>,
}

impl AuthTokenCache {
    pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self {
            fetcher,
            slot: Mutex::new(None),
        }
    }

    /// The cached token while it remains comfortably valid, a freshly
    /// fetched one otherwise.
    pub async fn token(&self) -> Result<String, AuthError> {
        {
            let slot = self.slot.lock().unwrap();
            if let Some(cached) = slot.as_ref() {
                if cached.expires_at > Instant::now() + EXPIRY_BUFFER {
                    return Ok(cached.token.clone());
                }
            }
        }

        tracing::debug!("auth token missing or near expiry, fetching");
        let token = self.fetcher.fetch_token().await?;
        *self.slot.lock().unwrap() = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + ASSUMED_LIFETIME,
        });
        Ok(token)
    }

    /// Drop the cached token (logout, permission change).
    pub fn invalidate(&self) {
        *self.slot.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingFetcher {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl TokenFetcher for CountingFetcher {
        async fn fetch_token(&self) -> Result<String, AuthError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("token-{n}"))
        }
    }

    fn cache() -> (AuthTokenCache, Arc<CountingFetcher>) {
        let fetcher = Arc::new(CountingFetcher {
            fetches: AtomicUsize::new(0),
        });
        (AuthTokenCache::new(fetcher.clone()), fetcher)
    }

    #[tokio::test(start_paused = true)]
    async fn token_is_cached_until_near_expiry() {
        let (cache, fetcher) = cache();

        assert_eq!(cache.token().await.unwrap(), "token-1");
        assert_eq!(cache.token().await.unwrap(), "token-1");
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);

        // Still comfortably inside the lifetime: cached.
        tokio::time::advance(ASSUMED_LIFETIME - EXPIRY_BUFFER - Duration::from_secs(60)).await;
        assert_eq!(cache.token().await.unwrap(), "token-1");

        // Inside the expiry buffer: refreshed.
        tokio::time::advance(Duration::from_secs(2 * 60)).await;
        assert_eq!(cache.token().await.unwrap(), "token-2");
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_a_fresh_fetch() {
        let (cache, fetcher) = cache();

        assert_eq!(cache.token().await.unwrap(), "token-1");
        cache.invalidate();
        assert_eq!(cache.token().await.unwrap(), "token-2");
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
    }
}
