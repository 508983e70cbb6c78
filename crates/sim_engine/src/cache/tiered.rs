//! Shared-then-local cache composition.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Bound on shared-tier calls of a cache built with [`TieredCache::local_only`].
const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_millis(250);

use super::{CacheBackend, LocalCache};
use crate::error::CacheError;

/// Cache counters and tier state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    /// Name of the active shared tier, `None` when local-only
    pub shared_tier: Option<String>,
    /// Lookups answered by either tier
    pub hits: u64,
    /// Lookups answered by neither tier
    pub misses: u64,
    /// Write-through calls that reached at least one tier
    pub writes: u64,
    /// TTL applied to new entries
    pub ttl_secs: u64,
}

/// Runs `call` against `backend` on a helper thread, giving up after
/// `timeout`.
///
/// A call that overruns keeps running detached and its result is dropped.
pub(crate) fn call_within<T, F>(
    backend: &Arc<dyn CacheBackend>,
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, CacheError>
where
    T: Send + 'static,
    F: FnOnce(&dyn CacheBackend) -> Result<T, CacheError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(backend);
    thread::Builder::new()
        .name(format!("sim-cache-{}", operation))
        .spawn(move || {
            // The receiver is gone if the call already timed out.
            let _ = tx.send(call(worker.as_ref()));
        })
        .map_err(|e| CacheError::Unavailable {
            backend: backend.name().to_string(),
            reason: e.to_string(),
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(CacheError::Timeout {
            operation,
            millis: timeout.as_millis() as u64,
        }),
        Err(RecvTimeoutError::Disconnected) => Err(CacheError::Unavailable {
            backend: backend.name().to_string(),
            reason: format!("{} aborted", operation),
        }),
    }
}

/// Two-tier cache: optional shared backend over a local moka tier.
///
/// Reads try the shared tier first, then the local one. Writes go to both.
/// Every shared-tier call is bounded by the timeout the tier was attached
/// with; an overrun counts as a shared miss. Backend failures are logged at
/// `warn` and never returned.
pub struct TieredCache {
    local: LocalCache,
    shared: Option<Arc<dyn CacheBackend>>,
    timeout: Duration,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl TieredCache {
    /// Local-only cache.
    pub fn local_only(capacity: u64, ttl: Duration) -> Self {
        Self {
            local: LocalCache::new(capacity),
            shared: None,
            timeout: DEFAULT_BACKEND_TIMEOUT,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Cache with a shared tier, kept only if it answers a ping within
    /// `timeout`. The same bound applies to every later read and write.
    pub fn new(
        capacity: u64,
        ttl: Duration,
        shared: Option<Arc<dyn CacheBackend>>,
        timeout: Duration,
    ) -> Self {
        let mut cache = Self::local_only(capacity, ttl);
        if let Some(backend) = shared {
            cache.attach_shared(backend, timeout);
        }
        cache
    }

    /// Pings `backend` and installs it as the shared tier on success.
    ///
    /// Returns whether the tier was attached.
    pub fn attach_shared(&mut self, backend: Arc<dyn CacheBackend>, timeout: Duration) -> bool {
        match call_within(&backend, "ping", timeout, |b| b.ping()) {
            Ok(()) => {
                debug!(backend = backend.name(), "shared cache tier attached");
                self.shared = Some(backend);
                self.timeout = timeout;
                true
            }
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "shared cache tier unavailable; running local-only");
                self.shared = None;
                false
            }
        }
    }

    /// Whether a shared tier is active.
    pub fn has_shared_tier(&self) -> bool {
        self.shared.is_some()
    }

    /// Cached value for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(shared) = &self.shared {
            let owned = key.to_string();
            match call_within(shared, "read", self.timeout, move |b| b.get(&owned)) {
                Ok(Some(value)) => {
                    debug!(key, tier = shared.name(), "cache hit");
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(value);
                }
                Ok(None) => {}
                Err(e) => warn!(key, tier = shared.name(), error = %e, "shared cache read failed"),
            }
        }

        match self.local.get(key) {
            Ok(Some(value)) => {
                debug!(key, tier = "local", "cache hit");
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Ok(None) | Err(_) => {
                debug!(key, "cache miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Writes `value` through to both tiers.
    pub fn set(&self, key: &str, value: &str) {
        let mut stored = false;
        if let Some(shared) = &self.shared {
            let (owned_key, owned_value, ttl) = (key.to_string(), value.to_string(), self.ttl);
            match call_within(shared, "write", self.timeout, move |b| {
                b.set(&owned_key, &owned_value, ttl)
            }) {
                Ok(()) => stored = true,
                Err(e) => warn!(key, tier = shared.name(), error = %e, "shared cache write failed"),
            }
        }
        match self.local.set(key, value, self.ttl) {
            Ok(()) => stored = true,
            Err(e) => warn!(key, tier = "local", error = %e, "local cache write failed"),
        }
        if stored {
            self.writes.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Counters and tier state.
    pub fn status(&self) -> CacheStatus {
        CacheStatus {
            shared_tier: self.shared.as_ref().map(|s| s.name().to_string()),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileCache;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Backend whose ping blocks longer than any timeout used here.
    struct SlowBackend;

    impl CacheBackend for SlowBackend {
        fn name(&self) -> &str {
            "slow"
        }
        fn ping(&self) -> Result<(), CacheError> {
            thread::sleep(Duration::from_millis(500));
            Ok(())
        }
        fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Ok(())
        }
    }

    /// Backend that pings fine but fails every read and write.
    #[derive(Default)]
    struct FlakyBackend {
        writes: Mutex<usize>,
    }

    impl CacheBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }
        fn ping(&self) -> Result<(), CacheError> {
            Ok(())
        }
        fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Io("connection reset".to_string()))
        }
        fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            *self.writes.lock().unwrap() += 1;
            Err(CacheError::Io("connection reset".to_string()))
        }
    }

    /// Backend that answers pings at once but stalls on reads and writes.
    struct StallingBackend;

    impl CacheBackend for StallingBackend {
        fn name(&self) -> &str {
            "stalling"
        }
        fn ping(&self) -> Result<(), CacheError> {
            Ok(())
        }
        fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            thread::sleep(Duration::from_secs(2));
            Ok(Some("stale".to_string()))
        }
        fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            thread::sleep(Duration::from_secs(2));
            Ok(())
        }
    }

    // ==========================================
    // Tier behaviour
    // ==========================================

    #[test]
    fn test_local_only_hit_and_miss() {
        let cache = TieredCache::local_only(16, Duration::from_secs(60));
        assert_eq!(cache.get("k"), None);
        cache.set("k", "v");
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        let status = cache.status();
        assert_eq!(status.shared_tier, None);
        assert_eq!((status.hits, status.misses, status.writes), (1, 1, 1));
    }

    #[test]
    fn test_slow_ping_falls_back_to_local() {
        let cache = TieredCache::new(
            16,
            Duration::from_secs(60),
            Some(Arc::new(SlowBackend)),
            Duration::from_millis(50),
        );
        assert!(!cache.has_shared_tier());
    }

    #[test]
    fn test_shared_tier_serves_other_instances() {
        let dir = tempfile::tempdir().unwrap();
        let first = TieredCache::new(
            16,
            Duration::from_secs(60),
            Some(Arc::new(FileCache::new(dir.path()))),
            Duration::from_millis(250),
        );
        assert_eq!(first.status().shared_tier.as_deref(), Some("file"));
        first.set("abc", "payload");

        let second = TieredCache::new(
            16,
            Duration::from_secs(60),
            Some(Arc::new(FileCache::new(dir.path()))),
            Duration::from_millis(250),
        );
        assert_eq!(second.get("abc").as_deref(), Some("payload"));
    }

    #[test]
    fn test_failing_shared_tier_is_swallowed() {
        let flaky = Arc::new(FlakyBackend::default());
        let cache = TieredCache::new(
            16,
            Duration::from_secs(60),
            Some(flaky.clone()),
            Duration::from_millis(250),
        );
        cache.set("k", "v");
        assert_eq!(*flaky.writes.lock().unwrap(), 1);
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert_eq!(cache.status().writes, 1);
    }

    #[test]
    fn test_stalled_shared_tier_is_bounded() {
        let cache = TieredCache::new(
            16,
            Duration::from_secs(60),
            Some(Arc::new(StallingBackend)),
            Duration::from_millis(50),
        );
        assert!(cache.has_shared_tier());

        let started = Instant::now();
        assert_eq!(cache.get("k"), None);
        cache.set("k", "v");
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert!(started.elapsed() < Duration::from_secs(1), "took {:?}", started.elapsed());

        let status = cache.status();
        assert_eq!((status.hits, status.misses, status.writes), (1, 1, 1));
    }

    #[test]
    fn test_call_within_reports_timeout() {
        let backend: Arc<dyn CacheBackend> = Arc::new(StallingBackend);
        let err = call_within(&backend, "read", Duration::from_millis(20), |b| b.get("k")).unwrap_err();
        assert_eq!(
            err,
            CacheError::Timeout {
                operation: "read",
                millis: 20
            }
        );
    }
}
