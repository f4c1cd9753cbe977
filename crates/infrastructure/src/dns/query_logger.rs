use conditional_dns_application::ports::QueryLogSink;
use conditional_dns_domain::QueryLog;
use tracing::info;

/// Writes every query as one structured event on the `conditional_dns::query` target,
/// so it can be filtered or routed separately from diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingQueryLog;

impl TracingQueryLog {
    pub fn new() -> Self {
        Self
    }
}

impl QueryLogSink for TracingQueryLog {
    fn record(&self, entry: &QueryLog) {
        info!(
            target: "conditional_dns::query",
            disposition = entry.disposition.tag(),
            domain = %entry.domain,
            record_type = %entry.record_type,
            client = %entry.client,
            upstream = entry.upstream_server.as_deref().unwrap_or("-"),
            cache_hit = entry.cache_hit,
            status = entry.response_status,
            response_time_us = entry.response_time_us,
            "{} {}",
            entry.disposition,
            entry.domain
        );
    }
}
