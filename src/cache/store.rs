//! In-memory TTL cache store
//!
//! Provides the `CacheStore` trait and a `MemoryCache` implementation that stores
//! JSON values with a write timestamp. There is no eviction and no expiry thread:
//! an entry lives as long as the process and is overwritten on every `set`.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// A cached value together with the time it was written
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached value
    pub value: T,
    /// When the value was written
    pub timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// How long ago the entry was written, relative to `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    /// Whether the entry is still inside its TTL window
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }
}

/// Key-value store used by the cached-fetch layer
///
/// Implementations must be safe to share between request handlers running on a
/// multi-threaded runtime. The store knows nothing about staleness, only age.
pub trait CacheStore: Send + Sync {
    /// Returns the entry for `key`, if one was ever written
    fn get(&self, key: &str) -> Option<CacheEntry<Value>>;

    /// Writes `value` under `key`, stamping the current time
    fn set(&self, key: &str, value: Value);
}

/// Process-wide cache backed by a concurrent map
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry<Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry<Value>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: Value) {
        let entry = CacheEntry {
            value,
            timestamp: Utc::now(),
        };
        self.entries.insert(key.to_string(), entry);
    }
}

/// Reads a typed entry from the store
///
/// Returns `None` if the key is absent or the stored value cannot be decoded as `T`.
pub fn read<T: DeserializeOwned>(store: &dyn CacheStore, key: &str) -> Option<CacheEntry<T>> {
    let CacheEntry { value, timestamp } = store.get(key)?;
    let value = serde_json::from_value(value).ok()?;
    Some(CacheEntry { value, timestamp })
}

/// Writes a typed value to the store
///
/// # Returns
/// * `Ok(())` on success
/// * `Err` if `value` cannot be represented as JSON
pub fn write<T: Serialize>(
    store: &dyn CacheStore,
    key: &str,
    value: &T,
) -> Result<(), serde_json::Error> {
    let json = serde_json::to_value(value)?;
    store.set(key, json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::thread;
    use std::time::Duration as StdDuration;

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

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let cache = MemoryCache::new();
        assert!(cache.get("nonexistent").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let cache = MemoryCache::new();
        write(&cache, "coin:bitcoin", &sample("bitcoin", 1)).expect("write should succeed");

        let entry: CacheEntry<TestData> = read(&cache, "coin:bitcoin").expect("entry should exist");
        assert_eq!(entry.value, sample("bitcoin", 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let cache = MemoryCache::new();
        write(&cache, "key", &sample("first", 1)).unwrap();
        let first = cache.get("key").unwrap();

        thread::sleep(StdDuration::from_millis(5));
        write(&cache, "key", &sample("second", 2)).unwrap();
        let second: CacheEntry<TestData> = read(&cache, "key").unwrap();

        assert_eq!(second.value, sample("second", 2));
        assert!(second.timestamp > first.timestamp, "set should restamp the entry");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_repeated_get_is_identical() {
        let cache = MemoryCache::new();
        cache.set("key", serde_json::json!({"a": [1, 2, 3]}));

        let first = cache.get("key").unwrap();
        let second = cache.get("key").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_timestamp_is_recorded_at_write() {
        let cache = MemoryCache::new();
        let before = Utc::now();
        cache.set("key", Value::Null);
        let after = Utc::now();

        let entry = cache.get("key").unwrap();
        assert!(entry.timestamp >= before);
        assert!(entry.timestamp <= after);
    }

    #[test]
    fn test_is_fresh_uses_strict_comparison() {
        let now = Utc::now();
        let entry = CacheEntry {
            value: (),
            timestamp: now - Duration::seconds(30),
        };

        assert!(!entry.is_fresh(Duration::seconds(30), now));
        assert!(entry.is_fresh(Duration::seconds(31), now));
        assert_eq!(entry.age(now), Duration::seconds(30));
    }

    #[test]
    fn test_read_returns_none_for_wrong_shape() {
        let cache = MemoryCache::new();
        cache.set("key", serde_json::json!("not a struct"));

        let result: Option<CacheEntry<TestData>> = read(&cache, "key");
        assert!(result.is_none());
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = MemoryCache::new();
        write(&cache, "coin:bitcoin", &sample("a", 1)).unwrap();
        write(&cache, "chart:bitcoin:7", &sample("b", 2)).unwrap();

        let coin: CacheEntry<TestData> = read(&cache, "coin:bitcoin").unwrap();
        let chart: CacheEntry<TestData> = read(&cache, "chart:bitcoin:7").unwrap();
        assert_eq!(coin.value.name, "a");
        assert_eq!(chart.value.name, "b");
    }
}
