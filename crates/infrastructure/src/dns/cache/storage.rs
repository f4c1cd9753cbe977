use super::coarse_clock::coarse_now_secs;
use super::entry::CacheEntry;
use super::key::CacheKey;
use super::metrics::CacheMetrics;
use super::negative_ttl::extract_negative_ttl;
use conditional_dns_application::ports::{CacheMetricsSnapshot, DnsCachePort, UpstreamAnswer};
use conditional_dns_domain::{CacheConfig, DnsQuery};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::debug;

/// TTL-respecting response cache keyed by (upstream group, name, type).
pub struct DnsCache {
    entries: DashMap<CacheKey, CacheEntry, FxBuildHasher>,
    config: CacheConfig,
    metrics: Arc<CacheMetrics>,
}

impl DnsCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            config,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns a hit with `min_ttl` set to the time left on the entry.
    pub fn get(&self, upstream: &str, query: &DnsQuery) -> Option<UpstreamAnswer> {
        let key = CacheKey::new(upstream, &query.domain, query.record_type);
        let now = coarse_now_secs();

        let expired = match self.entries.get(&key) {
            Some(entry) if !entry.is_expired(now) => {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                let mut answer = entry.answer.clone();
                answer.min_ttl = Some(entry.remaining_ttl(now));
                answer.cache_hit = true;
                return Some(answer);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(&key, |_, entry| entry.is_expired(now));
            self.metrics.expirations.fetch_add(1, Ordering::Relaxed);
        }
        self.metrics.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, upstream: &str, query: &DnsQuery, answer: &UpstreamAnswer) {
        let ttl = self.ttl_for(answer);
        if ttl == 0 || self.config.max_entries == 0 {
            return;
        }

        let key = CacheKey::new(upstream, &query.domain, query.record_type);
        if self.entries.len() >= self.config.max_entries && !self.entries.contains_key(&key) {
            self.make_room();
        }

        let mut stored = answer.clone();
        stored.cache_hit = false;

        self.entries.insert(
            key,
            CacheEntry {
                answer: stored,
                expires_at: coarse_now_secs() + ttl as u64,
            },
        );
        self.metrics.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Positive answers use the upstream minimum TTL clamped to the configured
    /// bounds; NXDOMAIN/NODATA use the SOA minimum or `negative_ttl`.
    pub fn ttl_for(&self, answer: &UpstreamAnswer) -> u32 {
        if answer.is_nxdomain() || answer.is_nodata() {
            let ttl = extract_negative_ttl(&answer.authority).unwrap_or(self.config.negative_ttl);
            ttl.min(self.config.max_ttl)
        } else {
            self.config.clamp_ttl(answer.min_ttl.unwrap_or(0))
        }
    }

    /// Drops expired entries; if none were, evicts the entry closest to expiry.
    fn make_room(&self) {
        let now = coarse_now_secs();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let swept = before.saturating_sub(self.entries.len());

        if swept > 0 {
            self.metrics
                .expirations
                .fetch_add(swept as u64, Ordering::Relaxed);
            debug!(swept, "Cache full, swept expired entries");
            if self.entries.len() < self.config.max_entries {
                return;
            }
        }

        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = victim {
            self.entries.remove(&key);
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(domain = %key.domain, upstream = %key.upstream, "Cache full, evicted entry");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DnsCachePort for DnsCache {
    fn cache_size(&self) -> usize {
        self.entries.len()
    }

    fn cache_metrics_snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            total_entries: self.entries.len(),
            hits: self.metrics.hits.load(Ordering::Relaxed),
            misses: self.metrics.misses.load(Ordering::Relaxed),
            insertions: self.metrics.insertions.load(Ordering::Relaxed),
            evictions: self.metrics.evictions.load(Ordering::Relaxed),
            expirations: self.metrics.expirations.load(Ordering::Relaxed),
            coalesced: self.metrics.coalesced.load(Ordering::Relaxed),
            hit_rate: self.metrics.hit_rate(),
        }
    }

    fn clear(&self) {
        self.entries.clear();
        self.metrics.reset();
    }
}
