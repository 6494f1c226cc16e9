use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use statement_core::{BenchmarkProvider, BenchmarkQuery, BenchmarkValue, ProviderError};
use tracing::debug;

pub const DEFAULT_CACHE_TTL_SECS: i64 = 300;

struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// TTL cache in front of another provider. Successful lookups, including
/// empty ones, are cached per query; errors are not. Every miss sweeps out
/// expired entries, so the map never outgrows one TTL's worth of queries.
pub struct CachedBenchmarkProvider<P> {
    inner: P,
    cache: DashMap<BenchmarkQuery, CacheEntry<Vec<BenchmarkValue>>>,
    ttl: Duration,
}

impl<P: BenchmarkProvider> CachedBenchmarkProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, Duration::seconds(DEFAULT_CACHE_TTL_SECS))
    }

    pub fn with_ttl(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
            ttl,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop entries older than the TTL.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        let before = self.cache.len();
        self.cache.retain(|_, entry| self.is_fresh(entry, now));
        let evicted = before.saturating_sub(self.cache.len());
        if evicted > 0 {
            debug!(evicted, "Evicted expired benchmark cache entries");
        }
    }

    fn is_fresh(&self, entry: &CacheEntry<Vec<BenchmarkValue>>, now: DateTime<Utc>) -> bool {
        now - entry.cached_at < self.ttl
    }

    fn fresh(&self, query: &BenchmarkQuery) -> Option<Vec<BenchmarkValue>> {
        let entry = self.cache.get(query)?;
        self.is_fresh(entry.value(), Utc::now()).then(|| entry.data.clone())
    }
}

#[async_trait]
impl<P: BenchmarkProvider> BenchmarkProvider for CachedBenchmarkProvider<P> {
    async fn lookup(&self, query: &BenchmarkQuery) -> Result<Vec<BenchmarkValue>, ProviderError> {
        if let Some(hit) = self.fresh(query) {
            debug!(analysis = %query.analysis_id, "Benchmark cache hit");
            return Ok(hit);
        }

        let values = self.inner.lookup(query).await?;
        self.purge_expired();
        self.cache.insert(
            query.clone(),
            CacheEntry {
                data: values.clone(),
                cached_at: Utc::now(),
            },
        );
        Ok(values)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
