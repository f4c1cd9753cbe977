use conditional_dns_domain::QueryDisposition;
use hickory_proto::rr::Record;
use std::net::IpAddr;
use std::sync::Arc;

/// What goes into the reply's ANSWER section.
#[derive(Debug, Clone)]
pub enum Answer {
    /// A/AAAA records owned by the query name.
    Addresses(Arc<Vec<IpAddr>>),
    /// A single PTR record.
    Pointer(Arc<str>),
    /// Upstream records relayed as they are, TTL rewritten.
    Records(Arc<Vec<Record>>),
    NoData,
    NxDomain,
    Refused,
}

impl Answer {
    pub fn status(&self) -> &'static str {
        match self {
            Answer::NxDomain => "NXDOMAIN",
            Answer::Refused => "REFUSED",
            _ => "NOERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DnsResolution {
    pub answer: Answer,
    pub disposition: QueryDisposition,
    pub ttl: u32,
    /// Relayed AUTHORITY records (SOA for negative answers).
    pub authority: Arc<Vec<Record>>,
    pub upstream_server: Option<String>,
    pub cache_hit: bool,
}

impl DnsResolution {
    pub fn local(answer: Answer, disposition: QueryDisposition, ttl: u32) -> Self {
        Self {
            answer,
            disposition,
            ttl,
            authority: Arc::new(vec![]),
            upstream_server: None,
            cache_hit: false,
        }
    }

    pub fn addresses(&self) -> &[IpAddr] {
        match &self.answer {
            Answer::Addresses(addresses) => addresses,
            _ => &[],
        }
    }
}
