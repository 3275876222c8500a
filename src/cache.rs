//! IMDB ID -> Ktuvit ID cache
//!
//! Resolution costs a name lookup plus a search, so successful results are
//! kept for a while. Entries expire lazily on lookup; there is no sweeper.
//! The store sits behind [`IdCache`] so it can be replaced by an external one.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// How long a resolved ID stays valid
pub const DEFAULT_TTL_HOURS: i64 = 12;

/// Time source, swappable in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cached resolution: Ktuvit ID plus when it was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub ktuvit_id: String,
    pub stored_at: DateTime<Utc>,
}

/// Storage for resolved IDs
#[async_trait]
pub trait IdCache: Send + Sync {
    /// Valid (non-expired) Ktuvit ID for `imdb_id`
    async fn get(&self, imdb_id: &str) -> Option<String>;

    /// Store a successful resolution
    async fn put(&self, imdb_id: &str, ktuvit_id: &str);
}

/// In-memory TTL cache, owned by one client
pub struct MemoryIdCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryIdCache {
    /// Cache with the default 12 hour TTL
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_TTL_HOURS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entry, regardless of expiry
    pub fn entry(&self, imdb_id: &str) -> Option<CacheEntry> {
        self.entries.get(imdb_id).map(|e| e.value().clone())
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now() - entry.stored_at < self.ttl
    }
}

impl Default for MemoryIdCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdCache for MemoryIdCache {
    async fn get(&self, imdb_id: &str) -> Option<String> {
        let entry = self.entries.get(imdb_id)?;
        if self.is_fresh(&entry) {
            debug!(imdb_id, ktuvit_id = %entry.ktuvit_id, "id cache hit");
            Some(entry.ktuvit_id.clone())
        } else {
            debug!(imdb_id, "id cache entry expired");
            None
        }
    }

    async fn put(&self, imdb_id: &str, ktuvit_id: &str) {
        // Same-key races are last-write-wins
        self.entries.insert(
            imdb_id.to_string(),
            CacheEntry {
                ktuvit_id: ktuvit_id.to_string(),
                stored_at: self.clock.now(),
            },
        );
    }
}

/// Cache that never stores anything (caching disabled)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl IdCache for NoCache {
    async fn get(&self, _imdb_id: &str) -> Option<String> {
        None
    }

    async fn put(&self, _imdb_id: &str, _ktuvit_id: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn cache_with_clock() -> (MemoryIdCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock(Mutex::new(Utc::now())));
        let cache = MemoryIdCache::with_clock(Duration::hours(12), clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.put("tt0000001", "99").await;
        clock.advance(Duration::hours(11));
        assert_eq!(cache.get("tt0000001").await.as_deref(), Some("99"));
    }

    #[tokio::test]
    async fn test_expires_at_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.put("tt0000001", "99").await;
        clock.advance(Duration::hours(12));
        assert!(cache.get("tt0000001").await.is_none());
        // Lazy expiry: entry is still stored
        assert_eq!(cache.len(), 1);
        let entry = cache.entry("tt0000001").unwrap();
        assert_eq!(entry.ktuvit_id, "99");
    }

    #[tokio::test]
    async fn test_put_refreshes_timestamp() {
        let (cache, clock) = cache_with_clock();
        cache.put("tt0000001", "99").await;
        clock.advance(Duration::hours(13));
        cache.put("tt0000001", "100").await;
        assert_eq!(cache.get("tt0000001").await.as_deref(), Some("100"));
    }

    #[tokio::test]
    async fn test_concurrent_writers_different_keys() {
        let cache = Arc::new(MemoryIdCache::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.put(&format!("tt{:07}", i), &i.to_string()).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(cache.len(), 32);
        assert_eq!(cache.get("tt0000007").await.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_no_cache_never_stores() {
        let cache = NoCache;
        cache.put("tt0000001", "99").await;
        assert!(cache.get("tt0000001").await.is_none());
    }
}
