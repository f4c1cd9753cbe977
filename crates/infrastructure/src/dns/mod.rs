pub mod cache;
pub mod forwarding;
pub mod query_logger;
pub mod resolver;
pub mod server;
pub mod transport;
pub mod upstream;
pub mod wire_response;

pub use cache::{CacheMetrics, DnsCache};
pub use query_logger::TracingQueryLog;
pub use resolver::CachedUpstreamResolver;
pub use server::{DnsServerHandler, ServerTransport, MAX_UDP_PAYLOAD};
pub use upstream::{UpstreamPool, UpstreamRegistry};
