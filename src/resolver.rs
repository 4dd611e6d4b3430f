//! Memoized asynchronous lookups.
//!
//! [`MemoizedResolver`] caches the outcome of an expensive lookup (reverse
//! geocoding in practice) per key, so each distinct key reaches the network
//! at most once for the lifetime of the resolver.
//!
//! Failed lookups are cached as `None` and never retried automatically. A
//! key whose first lookup failed keeps resolving to `None` until the owner
//! calls [`MemoizedResolver::invalidate`].
//!
//! Concurrent calls for the same uncached key share one in-flight fetch.
//! The entry map is locked only to find or insert the per-key cell, never
//! while a fetch is running, so lookups for other keys proceed freely.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Returned by [`MemoizedResolver::resolve_or_unknown`] when no address is known.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Upper bound on a single fetch. A fetch that exceeds it counts as failed.
    pub fetch_timeout: Option<Duration>,
}

#[derive(Debug, Error)]
enum LookupFailure {
    #[error("lookup timed out after {0:?}")]
    TimedOut(Duration),
    #[error("{0}")]
    Fetch(String),
}

type Slot<V> = Arc<OnceCell<Option<V>>>;

pub struct MemoizedResolver<V> {
    config: ResolverConfig,
    entries: Mutex<HashMap<String, Slot<V>>>,
}

impl<V> Default for MemoizedResolver<V> {
    fn default() -> Self {
        Self::with_config(ResolverConfig::default())
    }
}

impl<V> MemoizedResolver<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of keys with a settled outcome, negative results included.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the entry for `key`; the next `resolve` fetches again.
    ///
    /// A fetch already in flight for `key` still completes for its current
    /// waiters but no longer populates the cache.
    pub fn invalidate(&self, key: &str) {
        if self.lock().remove(key).is_some() {
            debug!(key, "cache entry invalidated");
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<V>>> {
        // No operation leaves the map mid-update, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &str) -> Slot<V> {
        Arc::clone(self.lock().entry(key.to_owned()).or_default())
    }
}

impl<V: Clone> MemoizedResolver<V> {
    /// Peeks at the cached outcome without fetching.
    ///
    /// `None` means the key has not been resolved yet; `Some(None)` is a
    /// cached negative result.
    pub fn cached(&self, key: &str) -> Option<Option<V>> {
        self.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Returns the cached outcome for `key`, fetching it on first use.
    ///
    /// `fetch` runs at most once per key. Its error and a timeout are both
    /// logged and cached as `None`.
    pub async fn resolve<F, Fut, E>(&self, key: &str, fetch: F) -> Option<V>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
        E: Display,
    {
        let slot = self.slot(key);
        if let Some(value) = slot.get() {
            debug!(key, "cache hit");
            return value.clone();
        }

        slot.get_or_init(|| self.fetch_once(key, fetch))
            .await
            .clone()
    }

    async fn fetch_once<F, Fut, E>(&self, key: &str, fetch: F) -> Option<V>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
        E: Display,
    {
        debug!(key, "cache miss, fetching");
        let pending = fetch(key.to_owned());
        let outcome = match self.config.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(result) => result.map_err(|err| LookupFailure::Fetch(err.to_string())),
                Err(_) => Err(LookupFailure::TimedOut(limit)),
            },
            None => pending
                .await
                .map_err(|err| LookupFailure::Fetch(err.to_string())),
        };

        match outcome {
            Ok(value) => value,
            Err(failure) => {
                warn!(key, error = %failure, "lookup failed, caching negative result");
                None
            }
        }
    }
}

impl MemoizedResolver<String> {
    /// Like [`resolve`](Self::resolve), but maps a missing value to
    /// [`UNKNOWN_LOCATION`].
    pub async fn resolve_or_unknown<F, Fut, E>(&self, key: &str, fetch: F) -> String
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Option<String>, E>>,
        E: Display,
    {
        self.resolve(key, fetch)
            .await
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_owned())
    }
}
