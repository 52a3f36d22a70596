use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::db::RecordStore;
use crate::model::ScrapeResult;

/// Outcome of a cache read. Store trouble is reported, never raised.
#[derive(Debug)]
pub enum CacheRead {
    Hit(ScrapeResult),
    Miss,
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheWrite {
    Stored,
    Disabled,
    Failed(String),
}

/// Freshness-aware view over a [`RecordStore`]. The store is advisory: the
/// pipeline behaves the same, minus reuse, when it is absent or failing.
#[derive(Clone)]
pub struct CacheStore {
    store: Option<Arc<dyn RecordStore>>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(store: Arc<dyn RecordStore>, ttl: Duration) -> Self {
        CacheStore {
            store: Some(store),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        CacheStore {
            store: None,
            ttl: Duration::zero(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stored payload for `url` if `now - scraped_at < ttl`. Stale rows are left in place.
    pub fn lookup(&self, url: &str, now: DateTime<Utc>) -> CacheRead {
        let Some(store) = &self.store else {
            return CacheRead::Miss;
        };

        let record = match store.get(url) {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("CACHE MISS: {}", url);
                return CacheRead::Miss;
            }
            Err(e) => {
                warn!("Cache lookup failed for {}: {}. Continuing without cache.", url, e);
                return CacheRead::Unavailable(e.to_string());
            }
        };

        let age = now - record.scraped_at;
        if age >= self.ttl {
            info!("CACHE STALE: {} (scraped {}m ago)", url, age.num_minutes());
            return CacheRead::Miss;
        }

        match serde_json::from_value::<ScrapeResult>(record.payload) {
            Ok(result) => {
                info!("CACHE HIT: {}", url);
                CacheRead::Hit(result)
            }
            Err(e) => {
                warn!("Cached payload for {} is unreadable: {}. Treating as miss.", url, e);
                CacheRead::Miss
            }
        }
    }

    /// Insert or overwrite the record for `url`. Failures are logged and reported as data.
    pub fn upsert(&self, url: &str, result: ScrapeResult, now: DateTime<Utc>) -> CacheWrite {
        let Some(store) = &self.store else {
            debug!("Cache disabled; not persisting {}", url);
            return CacheWrite::Disabled;
        };

        let payload = match serde_json::to_value(&result) {
            Ok(v) => v,
            Err(e) => {
                warn!("Could not encode scrape of {}: {}", url, e);
                return CacheWrite::Failed(e.to_string());
            }
        };

        match store.upsert(url, &payload, now) {
            Ok(()) => {
                info!("CACHE SET: {}", url);
                CacheWrite::Stored
            }
            Err(e) => {
                warn!("Could not save scrape of {} to cache: {}", url, e);
                CacheWrite::Failed(e.to_string())
            }
        }
    }

    /// [`CacheStore::lookup`] on the blocking pool, so a busy database
    /// never parks an async worker.
    pub async fn fetch(&self, url: &str, now: DateTime<Utc>) -> CacheRead {
        let cache = self.clone();
        let key = url.to_string();
        tokio::task::spawn_blocking(move || cache.lookup(&key, now))
            .await
            .unwrap_or_else(|e| {
                warn!("Cache lookup task for {} failed: {}", url, e);
                CacheRead::Unavailable(e.to_string())
            })
    }

    /// [`CacheStore::upsert`] on the blocking pool.
    pub async fn persist(&self, url: &str, result: ScrapeResult, now: DateTime<Utc>) -> CacheWrite {
        let cache = self.clone();
        let key = url.to_string();
        tokio::task::spawn_blocking(move || cache.upsert(&key, result, now))
            .await
            .unwrap_or_else(|e| {
                warn!("Cache write task for {} failed: {}", url, e);
                CacheWrite::Failed(e.to_string())
            })
    }

    pub fn checkpoint(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.checkpoint() {
                warn!("Cache checkpoint failed: {}", e);
            }
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::testing::FailingStore;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn sample() -> ScrapeResult {
        let mut r = ScrapeResult::default();
        r.home.url = "https://a.example".into();
        r.home.title = "A".into();
        r
    }

    fn cache() -> CacheStore {
        CacheStore::new(Arc::new(SqliteStore::open_in_memory().unwrap()), Duration::days(1))
    }

    #[test]
    fn fresh_record_is_a_hit() {
        let c = cache();
        assert_eq!(c.upsert("https://a.example", sample(), now()), CacheWrite::Stored);
        match c.lookup("https://a.example", now() + Duration::hours(23)) {
            CacheRead::Hit(r) => assert_eq!(r, sample()),
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[test]
    fn record_at_or_past_ttl_is_a_miss() {
        let c = cache();
        c.upsert("https://a.example", sample(), now());
        assert!(matches!(
            c.lookup("https://a.example", now() + Duration::days(1)),
            CacheRead::Miss
        ));
        assert!(matches!(
            c.lookup("https://a.example", now() + Duration::days(3)),
            CacheRead::Miss
        ));
    }

    #[test]
    fn failing_store_degrades_to_miss_and_failed_write() {
        let c = CacheStore::new(Arc::new(FailingStore), Duration::days(1));
        assert!(matches!(c.lookup("https://a.example", now()), CacheRead::Unavailable(_)));
        assert!(matches!(
            c.upsert("https://a.example", sample(), now()),
            CacheWrite::Failed(_)
        ));
    }

    #[test]
    fn disabled_cache_never_hits() {
        let c = CacheStore::disabled();
        assert_eq!(c.upsert("https://a.example", sample(), now()), CacheWrite::Disabled);
        assert!(matches!(c.lookup("https://a.example", now()), CacheRead::Miss));
    }

    #[tokio::test]
    async fn blocking_pool_round_trip() {
        let c = cache();
        assert_eq!(c.persist("https://a.example", sample(), now()).await, CacheWrite::Stored);
        match c.fetch("https://a.example", now()).await {
            CacheRead::Hit(r) => assert_eq!(r, sample()),
            other => panic!("expected hit, got {:?}", other),
        }
        let failing = CacheStore::new(Arc::new(FailingStore), Duration::days(1));
        assert!(matches!(
            failing.fetch("https://a.example", now()).await,
            CacheRead::Unavailable(_)
        ));
    }

    #[test]
    fn unreadable_payload_is_a_miss() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .upsert("https://a.example", &serde_json::json!({"home": 42}), now())
            .unwrap();
        let c = CacheStore::new(store, Duration::days(1));
        assert!(matches!(c.lookup("https://a.example", now()), CacheRead::Miss));
    }
}
