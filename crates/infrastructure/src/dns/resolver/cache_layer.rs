use crate::dns::cache::{CacheKey, DnsCache};
use async_trait::async_trait;
use conditional_dns_application::ports::{UpstreamAnswer, UpstreamResolver};
use conditional_dns_domain::{DnsQuery, DomainError};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

type InflightResult = Option<Result<UpstreamAnswer, DomainError>>;
type InflightSender = Arc<watch::Sender<InflightResult>>;
type InflightMap = DashMap<CacheKey, InflightSender, FxBuildHasher>;

/// Clears the in-flight slot if the leader is dropped before it publishes,
/// so followers fall back to their own query.
struct InflightLeaderGuard {
    inflight: Arc<InflightMap>,
    key: CacheKey,
}

impl Drop for InflightLeaderGuard {
    fn drop(&mut self) {
        if let Some((_, tx)) = self.inflight.remove(&self.key) {
            let _ = tx.send(None);
        }
    }
}

/// Serves cached answers and collapses concurrent identical misses into one
/// upstream query. Failures are shared with waiting followers but never cached.
pub struct CachedUpstreamResolver {
    inner: Arc<dyn UpstreamResolver>,
    cache: Arc<DnsCache>,
    inflight: Arc<InflightMap>,
}

impl CachedUpstreamResolver {
    pub fn new(inner: Arc<dyn UpstreamResolver>, cache: Arc<DnsCache>) -> Self {
        Self {
            inner,
            cache,
            inflight: Arc::new(DashMap::with_hasher(FxBuildHasher)),
        }
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }

    fn register_or_join_inflight(&self, key: &CacheKey) -> (bool, watch::Receiver<InflightResult>) {
        match self.inflight.entry(key.clone()) {
            dashmap::Entry::Occupied(e) => {
                let rx = e.get().subscribe();
                drop(e);
                (false, rx)
            }
            dashmap::Entry::Vacant(e) => {
                let (tx, rx) = watch::channel(None);
                e.insert(Arc::new(tx));
                (true, rx)
            }
        }
    }

    async fn resolve_as_follower(
        &self,
        upstream: &str,
        query: &DnsQuery,
        mut rx: watch::Receiver<InflightResult>,
    ) -> Result<UpstreamAnswer, DomainError> {
        let _ = rx.changed().await;
        let shared = rx.borrow().clone();

        match shared {
            Some(Ok(mut answer)) => {
                self.cache.metrics().coalesced.fetch_add(1, Ordering::Relaxed);
                answer.cache_hit = true;
                Ok(answer)
            }
            Some(Err(e)) => Err(e),
            None => {
                debug!(domain = %query.domain, upstream, "In-flight leader vanished, querying directly");
                self.inner.resolve(upstream, query).await
            }
        }
    }

    async fn resolve_as_leader(
        &self,
        upstream: &str,
        query: &DnsQuery,
        key: CacheKey,
    ) -> Result<UpstreamAnswer, DomainError> {
        debug!(
            domain = %query.domain,
            record_type = %query.record_type,
            upstream,
            "Cache MISS"
        );

        let guard = InflightLeaderGuard {
            inflight: Arc::clone(&self.inflight),
            key: key.clone(),
        };

        let result = self.inner.resolve(upstream, query).await;

        if let Ok(answer) = &result {
            self.cache.insert(upstream, query, answer);
        }

        if let Some((_, tx)) = self.inflight.remove(&key) {
            let _ = tx.send(Some(result.clone()));
        }

        drop(guard);
        result
    }
}

#[async_trait]
impl UpstreamResolver for CachedUpstreamResolver {
    async fn resolve(
        &self,
        upstream: &str,
        query: &DnsQuery,
    ) -> Result<UpstreamAnswer, DomainError> {
        if let Some(cached) = self.cache.get(upstream, query) {
            debug!(
                domain = %query.domain,
                record_type = %query.record_type,
                upstream,
                "Cache HIT"
            );
            return Ok(cached);
        }

        let key = CacheKey::new(upstream, &query.domain, query.record_type);
        let (is_leader, rx) = self.register_or_join_inflight(&key);

        if !is_leader {
            return self.resolve_as_follower(upstream, query, rx).await;
        }

        self.resolve_as_leader(upstream, query, key).await
    }
}
