use async_trait::async_trait;
use conditional_dns_domain::{DnsQuery, DomainError};
use hickory_proto::rr::Record;
use std::net::IpAddr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    NoError,
    NxDomain,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoError => "NOERROR",
            Self::NxDomain => "NXDOMAIN",
        }
    }
}

/// An upstream group's answer to one query.
#[derive(Debug, Clone)]
pub struct UpstreamAnswer {
    /// A/AAAA data from the ANSWER section.
    pub addresses: Arc<Vec<IpAddr>>,
    /// Every ANSWER record, addresses included.
    pub records: Arc<Vec<Record>>,
    /// AUTHORITY records (e.g. SOA for NXDOMAIN/NODATA).
    pub authority: Arc<Vec<Record>>,
    pub status: ResponseStatus,
    pub min_ttl: Option<u32>,
    pub upstream_server: Option<String>,
    pub cache_hit: bool,
}

impl UpstreamAnswer {
    pub fn new(addresses: Vec<IpAddr>) -> Self {
        Self {
            addresses: Arc::new(addresses),
            records: Arc::new(vec![]),
            authority: Arc::new(vec![]),
            status: ResponseStatus::NoError,
            min_ttl: None,
            upstream_server: None,
            cache_hit: false,
        }
    }

    pub fn nxdomain() -> Self {
        Self {
            status: ResponseStatus::NxDomain,
            ..Self::new(vec![])
        }
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.upstream_server = Some(server.into());
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.min_ttl = Some(ttl);
        self
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = Arc::new(records);
        self
    }

    pub fn is_nxdomain(&self) -> bool {
        self.status == ResponseStatus::NxDomain
    }

    /// NOERROR with an empty ANSWER section.
    pub fn is_nodata(&self) -> bool {
        self.status == ResponseStatus::NoError
            && self.records.is_empty()
            && self.addresses.is_empty()
    }
}

#[async_trait]
pub trait UpstreamResolver: Send + Sync {
    /// Resolve `query` through the named upstream group.
    async fn resolve(&self, upstream: &str, query: &DnsQuery)
        -> Result<UpstreamAnswer, DomainError>;
}
