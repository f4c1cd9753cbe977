use super::pool::UpstreamPool;
use async_trait::async_trait;
use conditional_dns_application::ports::{ResponseStatus, UpstreamAnswer, UpstreamResolver};
use conditional_dns_domain::{DnsQuery, DomainError, UpstreamsConfig};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::info;

/// Upstream groups by name.
pub struct UpstreamRegistry {
    pools: FxHashMap<String, Arc<UpstreamPool>>,
}

impl UpstreamRegistry {
    pub fn from_config(config: &UpstreamsConfig) -> Result<Self, DomainError> {
        let mut pools = FxHashMap::default();
        for group in &config.groups {
            let pool = UpstreamPool::from_group(group, config.query_timeout, config.attempts)?;
            info!(
                group = %group.name,
                protocol = group.protocol.as_str(),
                servers = ?pool.server_addrs(),
                "Upstream group configured"
            );
            pools.insert(group.name.clone(), Arc::new(pool));
        }
        Ok(Self { pools })
    }

    pub fn from_pools(pools: Vec<UpstreamPool>) -> Self {
        Self {
            pools: pools
                .into_iter()
                .map(|p| (p.name().to_string(), Arc::new(p)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[async_trait]
impl UpstreamResolver for UpstreamRegistry {
    async fn resolve(
        &self,
        upstream: &str,
        query: &DnsQuery,
    ) -> Result<UpstreamAnswer, DomainError> {
        let pool = self
            .pools
            .get(upstream)
            .ok_or_else(|| DomainError::UnknownUpstream(upstream.to_string()))?;

        let result = pool.query(query).await?;
        let response = result.response;

        let status = if response.is_nxdomain() {
            ResponseStatus::NxDomain
        } else {
            ResponseStatus::NoError
        };

        Ok(UpstreamAnswer {
            addresses: Arc::new(response.addresses),
            records: Arc::new(response.answers),
            authority: Arc::new(response.authority_records),
            status,
            min_ttl: response.min_ttl,
            upstream_server: Some(result.server.to_string()),
            cache_hit: false,
        })
    }
}
