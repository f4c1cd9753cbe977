use crate::ports::{QueryLogSink, UpstreamAnswer, UpstreamResolver};
use conditional_dns_domain::{
    BlockNetworks, DnsQuery, DnsRequest, DomainError, QueryDisposition, QueryLog, QueryRouter,
    RecordType, Route, RoutingConfig, RuleAction,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::resolution::{Answer, DnsResolution};

pub struct HandleDnsQueryUseCase {
    router: Arc<QueryRouter>,
    resolver: Arc<dyn UpstreamResolver>,
    query_log: Arc<dyn QueryLogSink>,
    block_networks: BlockNetworks,
    filter_upstream: Arc<str>,
    default_upstream: Arc<str>,
    answer_ttl: u32,
    preserve_upstream_ttl: bool,
    fail_open: bool,
    local_ptr_name: Arc<str>,
    local_ptr_ttl: u32,
}

impl HandleDnsQueryUseCase {
    pub fn new(
        routing: &RoutingConfig,
        router: Arc<QueryRouter>,
        resolver: Arc<dyn UpstreamResolver>,
        query_log: Arc<dyn QueryLogSink>,
    ) -> Result<Self, DomainError> {
        let block_networks = BlockNetworks::parse(&routing.block_networks)
            .map_err(DomainError::InvalidRoutingConfig)?;

        Ok(Self {
            router,
            resolver,
            query_log,
            block_networks,
            filter_upstream: Arc::from(routing.filter_upstream.as_str()),
            default_upstream: Arc::from(routing.default_upstream.as_str()),
            answer_ttl: routing.answer_ttl,
            preserve_upstream_ttl: routing.preserve_upstream_ttl,
            fail_open: routing.fail_open,
            local_ptr_name: Arc::from(routing.local_ptr.name.as_str()),
            local_ptr_ttl: routing.local_ptr.ttl,
        })
    }

    pub async fn execute(&self, request: &DnsRequest) -> Result<DnsResolution, DomainError> {
        let start = Instant::now();
        let query = DnsQuery::new(Arc::clone(&request.domain), request.record_type);
        let route = self.router.route(&query);

        debug!(
            domain = %query.domain,
            record_type = %query.record_type,
            client = %request.client,
            route = ?route,
            "Routing query"
        );

        let outcome = match route {
            Route::LocalPtr => Ok(DnsResolution::local(
                Answer::Pointer(Arc::clone(&self.local_ptr_name)),
                QueryDisposition::Local,
                self.local_ptr_ttl,
            )),
            Route::Rule(index) => self.apply_rule(index, &query).await,
            Route::Management => {
                self.forward(&self.filter_upstream, &query, QueryDisposition::Management)
                    .await
            }
            Route::Whitelisted => {
                self.forward(&self.default_upstream, &query, QueryDisposition::Whitelisted)
                    .await
            }
            Route::Split if query.record_type.is_address() => self.split(&query).await,
            Route::Split => {
                self.forward(&self.default_upstream, &query, QueryDisposition::Forwarded)
                    .await
            }
        };

        self.log(request, &outcome, start);
        outcome
    }

    async fn apply_rule(
        &self,
        index: usize,
        query: &DnsQuery,
    ) -> Result<DnsResolution, DomainError> {
        let rule = self.router.rule(index).ok_or_else(|| {
            DomainError::InvalidRoutingConfig(format!("No rule at index {}", index))
        })?;

        match rule.action {
            RuleAction::Forward => {
                let upstream = rule.upstream.as_deref().ok_or_else(|| {
                    DomainError::InvalidRoutingConfig(format!(
                        "Forward rule '{}' has no upstream",
                        rule.domain
                    ))
                })?;
                self.forward(upstream, query, QueryDisposition::Forwarded)
                    .await
            }
            RuleAction::Block => Ok(DnsResolution::local(
                Answer::Refused,
                QueryDisposition::RuleBlocked,
                0,
            )),
            RuleAction::Local => {
                let answer = match rule.local_address() {
                    Some(ip) if family_matches(ip, query.record_type) => {
                        Answer::Addresses(Arc::new(vec![ip]))
                    }
                    _ => Answer::NoData,
                };
                Ok(DnsResolution::local(
                    answer,
                    QueryDisposition::RuleLocal,
                    self.answer_ttl,
                ))
            }
        }
    }

    async fn forward(
        &self,
        upstream: &str,
        query: &DnsQuery,
        disposition: QueryDisposition,
    ) -> Result<DnsResolution, DomainError> {
        let answer = self.resolver.resolve(upstream, query).await?;
        Ok(self.to_resolution(answer, query.record_type, disposition))
    }

    /// Asks both upstreams at once; a block-page answer from the filter wins.
    async fn split(&self, query: &DnsQuery) -> Result<DnsResolution, DomainError> {
        let (filtered, unfiltered) = tokio::join!(
            self.resolver.resolve(&self.filter_upstream, query),
            self.resolver.resolve(&self.default_upstream, query),
        );

        match (filtered, unfiltered) {
            (Ok(filter_answer), _) if self.block_networks.any_blocked(&filter_answer.addresses) => {
                Ok(self.to_resolution(filter_answer, query.record_type, QueryDisposition::Blocked))
            }
            (Ok(_), Ok(default_answer)) => Ok(self.to_resolution(
                default_answer,
                query.record_type,
                QueryDisposition::Unblocked,
            )),
            (Ok(filter_answer), Err(e)) => {
                warn!(
                    domain = %query.domain,
                    upstream = %self.default_upstream,
                    error = %e,
                    "Default upstream failed, answering from filtering upstream"
                );
                Ok(self.to_resolution(filter_answer, query.record_type, QueryDisposition::Forwarded))
            }
            (Err(e), Ok(default_answer)) if self.fail_open => {
                warn!(
                    domain = %query.domain,
                    upstream = %self.filter_upstream,
                    error = %e,
                    "Filtering upstream failed, failing open"
                );
                Ok(self.to_resolution(
                    default_answer,
                    query.record_type,
                    QueryDisposition::Unblocked,
                ))
            }
            (Err(e), _) => Err(e),
        }
    }

    fn to_resolution(
        &self,
        upstream: UpstreamAnswer,
        record_type: RecordType,
        disposition: QueryDisposition,
    ) -> DnsResolution {
        let answer = if upstream.is_nxdomain() {
            Answer::NxDomain
        } else if record_type.is_address() {
            if upstream.addresses.is_empty() {
                Answer::NoData
            } else {
                Answer::Addresses(Arc::clone(&upstream.addresses))
            }
        } else if upstream.records.is_empty() {
            Answer::NoData
        } else {
            Answer::Records(Arc::clone(&upstream.records))
        };

        let ttl = if self.preserve_upstream_ttl {
            upstream.min_ttl.unwrap_or(self.answer_ttl)
        } else {
            self.answer_ttl
        };

        DnsResolution {
            answer,
            disposition,
            ttl,
            authority: upstream.authority,
            upstream_server: upstream.upstream_server,
            cache_hit: upstream.cache_hit,
        }
    }

    fn log(
        &self,
        request: &DnsRequest,
        outcome: &Result<DnsResolution, DomainError>,
        start: Instant,
    ) {
        let response_time_us = start.elapsed().as_micros() as u64;

        let entry = match outcome {
            Ok(resolution) => QueryLog {
                domain: Arc::clone(&request.domain),
                record_type: request.record_type,
                client: request.client_ip(),
                disposition: resolution.disposition,
                upstream_server: resolution.upstream_server.clone(),
                cache_hit: resolution.cache_hit,
                response_time_us,
                response_status: resolution.answer.status(),
            },
            Err(e) => {
                warn!(
                    domain = %request.domain,
                    record_type = %request.record_type,
                    client = %request.client,
                    error = %e,
                    "Query failed"
                );
                QueryLog {
                    domain: Arc::clone(&request.domain),
                    record_type: request.record_type,
                    client: request.client_ip(),
                    disposition: QueryDisposition::Failed,
                    upstream_server: None,
                    cache_hit: false,
                    response_time_us,
                    response_status: e.log_status(),
                }
            }
        };

        self.query_log.record(&entry);
    }
}

fn family_matches(ip: IpAddr, record_type: RecordType) -> bool {
    matches!(
        (ip, record_type),
        (IpAddr::V4(_), RecordType::A) | (IpAddr::V6(_), RecordType::AAAA)
    )
}
