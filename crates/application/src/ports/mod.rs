pub mod dns_cache_port;
pub mod local_address_source;
pub mod query_log_sink;
pub mod upstream_resolver;

pub use dns_cache_port::{CacheMetricsSnapshot, DnsCachePort};
pub use local_address_source::LocalAddressSource;
pub use query_log_sink::QueryLogSink;
pub use upstream_resolver::{ResponseStatus, UpstreamAnswer, UpstreamResolver};
