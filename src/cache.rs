//! Locally persisted waitlist count with a freshness window.
//!
//! A stored [`CachedCount`] is served without touching the network while
//! `now - timestamp < ttl`. Anything else (no entry, an entry that fails to
//! parse, an expired entry) costs exactly one fetch, whose result overwrites
//! the stored record.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::WaitlistApi;
use crate::clock::Clock;
use crate::error::{CacheParseError, FetchError, StorageError};
use crate::storage::KeyValueStore;

/// Persisted `{count, timestamp}` record. `timestamp` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCount {
    pub count: u64,
    pub timestamp: i64,
}

impl CachedCount {
    pub fn is_fresh(&self, now_millis: i64, ttl: Duration) -> bool {
        let age = now_millis.saturating_sub(self.timestamp);
        (age as i128) < ttl.as_millis() as i128
    }

    /// Decode a stored value, rejecting records stamped after `now`.
    pub fn parse(raw: &str, now_millis: i64) -> Result<Self, CacheParseError> {
        let entry: CachedCount = serde_json::from_str(raw)?;
        if entry.timestamp > now_millis {
            return Err(CacheParseError::FutureTimestamp {
                timestamp: entry.timestamp,
                now: now_millis,
            });
        }
        Ok(entry)
    }
}

/// Count Cache Manager.
pub struct CountCache {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn WaitlistApi>,
    clock: Arc<dyn Clock>,
    key: String,
    ttl: Duration,
}

impl CountCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn WaitlistApi>,
        clock: Arc<dyn Clock>,
        key: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            api,
            clock,
            key: key.into(),
            ttl,
        }
    }

    /// Current waitlist size, from the cache when fresh and the backend
    /// otherwise. A failed fetch leaves the stored record untouched.
    pub async fn get_count(&self) -> Result<u64, FetchError> {
        let now = self.clock.now_millis();

        if let Some(entry) = self.cached() {
            if entry.is_fresh(now, self.ttl) {
                log::debug!(
                    "serving cached waitlist count {} (age {}ms)",
                    entry.count,
                    now - entry.timestamp
                );
                return Ok(entry.count);
            }
            log::debug!("cached waitlist count expired, refetching");
        }

        self.refresh().await
    }

    /// Fetch the count from the backend and overwrite the stored record.
    ///
    /// A record that cannot be written is logged; the fetched count is still
    /// returned.
    pub async fn refresh(&self) -> Result<u64, FetchError> {
        let count = match self.api.fetch_count().await {
            Ok(count) => count,
            Err(err) => {
                log::error!("failed to fetch waitlist count: {}", err);
                return Err(err);
            }
        };

        if let Err(err) = self.publish(count) {
            log::error!("failed to cache waitlist count {}: {}", count, err);
        }
        log::info!("fetched waitlist count {}", count);
        Ok(count)
    }

    /// Read the stored record without fetching, fresh or not.
    ///
    /// Unusable records are logged and reported as absent.
    pub fn cached(&self) -> Option<CachedCount> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("failed to read cached count {}: {}", self.key, err);
                return None;
            }
        };

        match CachedCount::parse(&raw, self.clock.now_millis()) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("discarding cached count {}: {}", self.key, err);
                None
            }
        }
    }

    /// Overwrite the stored record with `count` stamped at the current time.
    pub fn publish(&self, count: u64) -> Result<CachedCount, StorageError> {
        let entry = CachedCount {
            count,
            timestamp: self.clock.now_millis(),
        };
        let raw = serde_json::to_string(&entry)?;
        self.store.set(&self.key, &raw)?;
        Ok(entry)
    }
}
