//! In-memory expiring store for API responses
//!
//! Provides an `ExpiringCache` that memoizes serializable values under string keys
//! for a fixed TTL. Expiry is checked lazily on read; there is no background sweep.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Default time-to-live used by the crypto and GitHub data paths
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A single cached value with its insertion time
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The cached payload
    data: Value,
    /// When the entry was stored
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) <= ttl
    }
}

/// Shared key/value store whose entries expire after a fixed TTL
///
/// Cloning an `ExpiringCache` yields another handle to the same entries, so one
/// instance can be wired into every client that needs it. An entry is returned by
/// `get` while `now - stored_at <= ttl`; after that it is treated as absent and
/// removed on the next read.
#[derive(Debug, Clone)]
pub struct ExpiringCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl ExpiringCache {
    /// Creates an empty cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns the TTL applied to every entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panic while holding the lock cannot leave the map half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores a value, overwriting any existing entry and restarting its TTL window
    ///
    /// # Arguments
    /// * `key` - Cache key (see [`crate::cache::CacheKey`])
    /// * `data` - The value to cache (must implement Serialize)
    pub fn set<T: Serialize>(&self, key: &str, data: &T) {
        let data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "value not cacheable, skipping");
                return;
            }
        };

        let entry = CacheEntry {
            data,
            stored_at: Instant::now(),
        };
        self.lock().insert(key.to_string(), entry);
    }

    /// Reads a value from the cache
    ///
    /// Returns `None` if the key is missing, the entry has outlived the TTL, or the
    /// stored payload does not deserialize as `T`. In the last two cases the entry
    /// is removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut entries = self.lock();

        let entry = entries.get(key)?;
        if !entry.is_fresh(now, self.ttl) {
            entries.remove(key);
            tracing::debug!(key, "cache entry expired");
            return None;
        }

        match T::deserialize(&entry.data) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::debug!(key, error = %e, "cached payload has unexpected shape");
                entries.remove(key);
                None
            }
        }
    }

    /// Removes a single entry, returning whether one was present
    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, including stale ones not yet read
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for ExpiringCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn sample(name: &str, value: i32) -> TestData {
        TestData {
            name: name.to_string(),
            value,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_value_within_ttl() {
        let cache = ExpiringCache::new(Duration::from_secs(300));
        cache.set("crypto:prices", &sample("btc", 1));

        tokio::time::advance(Duration::from_secs(4 * 60)).await;

        let result: Option<TestData> = cache.get("crypto:prices");
        assert_eq!(result, Some(sample("btc", 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_none_after_ttl() {
        let cache = ExpiringCache::new(Duration::from_secs(300));
        cache.set("crypto:prices", &sample("btc", 1));

        tokio::time::advance(Duration::from_secs(6 * 60)).await;

        let result: Option<TestData> = cache.get("crypto:prices");
        assert!(result.is_none(), "Entry older than TTL should be a miss");
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_valid_exactly_at_ttl_boundary() {
        let cache = ExpiringCache::new(Duration::from_secs(300));
        cache.set("k", &1u32);

        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(cache.get::<u32>("k"), Some(1));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get::<u32>("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_purged_on_read() {
        let cache = ExpiringCache::new(Duration::from_secs(10));
        cache.set("stale", &"old");
        assert_eq!(cache.len(), 1);

        tokio::time::advance(Duration::from_secs(11)).await;
        // Stale entries linger until touched
        assert_eq!(cache.len(), 1);

        assert!(cache.get::<String>("stale").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_ttl_window() {
        let cache = ExpiringCache::new(Duration::from_secs(300));
        cache.set("user:octocat", &sample("first", 1));

        tokio::time::advance(Duration::from_secs(200)).await;
        cache.set("user:octocat", &sample("second", 2));

        // 400s after the first set, 200s after the second
        tokio::time::advance(Duration::from_secs(200)).await;

        let result: Option<TestData> = cache.get("user:octocat");
        assert_eq!(result, Some(sample("second", 2)));
    }

    #[test]
    fn test_clear_drops_all_entries() {
        let cache = ExpiringCache::default();
        cache.set("a", &1u8);
        cache.set("b", &2u8);

        cache.clear();

        assert!(cache.get::<u8>("a").is_none());
        assert!(cache.get::<u8>("b").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_key_returns_none() {
        let cache = ExpiringCache::default();
        assert!(cache.get::<TestData>("nonexistent").is_none());
    }

    #[test]
    fn test_shape_mismatch_is_a_miss_and_evicts() {
        let cache = ExpiringCache::default();
        cache.set("k", &"not a struct");

        assert!(cache.get::<TestData>("k").is_none());
        assert!(cache.get::<String>("k").is_none(), "Mismatched entry should be gone");
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = ExpiringCache::default();
        let other = cache.clone();

        cache.set("shared", &42i64);
        assert_eq!(other.get::<i64>("shared"), Some(42));

        other.clear();
        assert!(cache.get::<i64>("shared").is_none());
    }

    #[test]
    fn test_remove_reports_presence() {
        let cache = ExpiringCache::default();
        cache.set("k", &true);
        assert!(cache.remove("k"));
        assert!(!cache.remove("k"));
    }

    #[test]
    fn test_default_ttl_is_five_minutes() {
        assert_eq!(ExpiringCache::default().ttl(), Duration::from_secs(300));
    }
}
