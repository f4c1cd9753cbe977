use conditional_dns_domain::QueryLog;

/// Receives one entry per answered query. Must not block the caller.
pub trait QueryLogSink: Send + Sync {
    fn record(&self, entry: &QueryLog);
}
