//! conditional-dns domain layer
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod dns_request;
pub mod errors;
pub mod pending_query;
pub mod query_log;
pub mod routing;

pub use config::{
    CacheConfig, CliOverrides, Config, ConfigError, LocalPtrConfig, LogFormat, LoggingConfig,
    RoutingConfig, ServerConfig, UpstreamGroup, UpstreamProtocol, UpstreamsConfig,
};
pub use dns_query::{normalize_domain, DnsQuery};
pub use dns_record::RecordType;
pub use dns_request::DnsRequest;
pub use errors::DomainError;
pub use pending_query::PendingQuery;
pub use query_log::{QueryDisposition, QueryLog};
pub use routing::{
    reverse_name, BlockNetworks, DomainPattern, ForwardRule, MatchMode, QueryRouter,
    ReverseNames, Route, RuleAction,
};
