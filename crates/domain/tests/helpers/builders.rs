#![allow(dead_code)]
use conditional_dns_domain::{
    DnsQuery, ForwardRule, MatchMode, RecordType, ReverseNames, RoutingConfig,
};
use std::net::IpAddr;

pub fn query(domain: &str, record_type: RecordType) -> DnsQuery {
    DnsQuery::new(domain, record_type)
}

pub struct RoutingConfigBuilder {
    config: RoutingConfig,
}

impl RoutingConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RoutingConfig::default(),
        }
    }

    pub fn whitelist(mut self, entries: &[&str]) -> Self {
        self.config.whitelist = entries.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn management(mut self, entries: &[&str]) -> Self {
        self.config.management_domains = entries.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn rule(mut self, rule: ForwardRule) -> Self {
        self.config.rules.push(rule);
        self
    }

    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.config.match_mode = mode;
        self
    }

    pub fn local_ptr(mut self, enabled: bool) -> Self {
        self.config.local_ptr.enabled = enabled;
        self
    }

    pub fn build(self) -> RoutingConfig {
        self.config
    }
}

pub fn reverse_names(addresses: &[&str]) -> ReverseNames {
    ReverseNames::from_addresses(addresses.iter().map(|a| a.parse::<IpAddr>().unwrap()))
}
