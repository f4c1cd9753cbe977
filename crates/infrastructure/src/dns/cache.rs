pub mod coarse_clock;
pub mod entry;
pub mod key;
pub mod metrics;
pub mod negative_ttl;
pub mod storage;

pub use entry::CacheEntry;
pub use key::CacheKey;
pub use metrics::CacheMetrics;
pub use negative_ttl::extract_negative_ttl;
pub use storage::DnsCache;
