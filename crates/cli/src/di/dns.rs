use conditional_dns_application::ports::{LocalAddressSource, UpstreamResolver};
use conditional_dns_application::use_cases::HandleDnsQueryUseCase;
use conditional_dns_domain::{Config, QueryRouter, ReverseNames};
use conditional_dns_infrastructure::dns::{
    CachedUpstreamResolver, DnsCache, DnsServerHandler, TracingQueryLog, UpstreamRegistry,
};
use conditional_dns_infrastructure::system::InterfaceAddresses;
use std::sync::Arc;
use tracing::{info, warn};

pub struct DnsServices {
    pub handler: Arc<DnsServerHandler>,
    pub cache: Option<Arc<DnsCache>>,
}

impl DnsServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let registry = Arc::new(UpstreamRegistry::from_config(&config.upstreams)?);
        info!(groups = registry.len(), "Upstream registry ready");

        let (resolver, cache) = Self::build_resolver(config, registry);

        let reverse_names = Self::discover_reverse_names(config)?;
        let router = Arc::new(QueryRouter::new(&config.routing, reverse_names)?);

        let use_case = Arc::new(HandleDnsQueryUseCase::new(
            &config.routing,
            router,
            resolver,
            Arc::new(TracingQueryLog::new()),
        )?);

        info!(
            filter_upstream = %config.routing.filter_upstream,
            default_upstream = %config.routing.default_upstream,
            rules = config.routing.rules.len(),
            match_mode = ?config.routing.match_mode,
            fail_open = config.routing.fail_open,
            "DNS services initialized"
        );

        Ok(Self {
            handler: Arc::new(DnsServerHandler::new(use_case)),
            cache,
        })
    }

    fn build_resolver(
        config: &Config,
        registry: Arc<UpstreamRegistry>,
    ) -> (Arc<dyn UpstreamResolver>, Option<Arc<DnsCache>>) {
        if !config.cache.enabled {
            info!("Response cache disabled");
            return (registry as Arc<dyn UpstreamResolver>, None);
        }

        info!(
            max_entries = config.cache.max_entries,
            min_ttl = config.cache.min_ttl,
            max_ttl = config.cache.max_ttl,
            "Cache enabled"
        );
        let cache = Arc::new(DnsCache::new(config.cache.clone()));
        let resolver = Arc::new(CachedUpstreamResolver::new(registry, Arc::clone(&cache)));
        (resolver as Arc<dyn UpstreamResolver>, Some(cache))
    }

    fn discover_reverse_names(config: &Config) -> anyhow::Result<ReverseNames> {
        let local_ptr = &config.routing.local_ptr;
        if !local_ptr.enabled {
            return Ok(ReverseNames::default());
        }

        let source = InterfaceAddresses::new(&local_ptr.extra_addresses)?;
        let addresses = match source.local_addresses() {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!(error = %e, "Interface discovery failed, local PTR answers disabled");
                return Ok(ReverseNames::default());
            }
        };

        info!(
            addresses = ?addresses,
            name = %local_ptr.name,
            "Answering PTR queries for local addresses"
        );
        Ok(ReverseNames::from_addresses(addresses))
    }
}
