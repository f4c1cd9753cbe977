use crate::dns_record::RecordType;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

/// How a query was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryDisposition {
    Local,
    Management,
    Whitelisted,
    Blocked,
    Unblocked,
    Forwarded,
    RuleBlocked,
    RuleLocal,
    Failed,
}

impl QueryDisposition {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Management => "MGMT",
            Self::Whitelisted => "WHITELISTED",
            Self::Blocked => "BLOCKED",
            Self::Unblocked => "UNBLOCKED",
            Self::Forwarded => "FORWARDED",
            Self::RuleBlocked => "RULE_BLOCK",
            Self::RuleLocal => "RULE_LOCAL",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for QueryDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone)]
pub struct QueryLog {
    pub domain: Arc<str>,
    pub record_type: RecordType,
    pub client: IpAddr,
    pub disposition: QueryDisposition,
    pub upstream_server: Option<String>,
    pub cache_hit: bool,
    pub response_time_us: u64,
    pub response_status: &'static str,
}
