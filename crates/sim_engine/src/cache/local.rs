//! In-process cache tier using moka.
//!
//! TinyLFU admission, bounded entry count, per-entry TTL.

use moka::sync::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::CacheBackend;
use crate::error::CacheError;

#[derive(Clone)]
struct Entry {
    value: Arc<str>,
    ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Local cache tier.
pub struct LocalCache {
    cache: Cache<String, Entry>,
}

impl LocalCache {
    /// Create a cache holding at most `max_entries`.
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(EntryTtl)
            .build();

        Self { cache }
    }

    /// Number of entries currently in the cache.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invalidate all entries.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl CacheBackend for LocalCache {
    fn name(&self) -> &str {
        "local"
    }

    fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.cache.get(key).map(|e| e.value.to_string()))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.cache.insert(
            key.to_string(),
            Entry {
                value: Arc::from(value),
                ttl,
            },
        );
        Ok(())
    }
}
