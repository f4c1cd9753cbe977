use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::pattern::DomainPattern;
use crate::dns_record::RecordType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Relay the query to the rule's upstream group.
    #[default]
    Forward,
    /// Refuse the query.
    Block,
    /// Answer with the rule's fixed address.
    Local,
}

/// An explicit per-name routing rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForwardRule {
    pub domain: String,

    #[serde(default)]
    pub action: RuleAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Restrict the rule to these query types (e.g. `["A", "AAAA"]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_types: Option<Vec<String>>,
}

impl ForwardRule {
    pub fn forward(domain: &str, upstream: &str) -> Self {
        Self {
            domain: domain.to_string(),
            action: RuleAction::Forward,
            upstream: Some(upstream.to_string()),
            address: None,
            record_types: None,
        }
    }

    pub fn block(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            action: RuleAction::Block,
            upstream: None,
            address: None,
            record_types: None,
        }
    }

    pub fn local(domain: &str, address: &str) -> Self {
        Self {
            domain: domain.to_string(),
            action: RuleAction::Local,
            upstream: None,
            address: Some(address.to_string()),
            record_types: None,
        }
    }

    pub fn with_record_types(mut self, types: &[&str]) -> Self {
        self.record_types = Some(types.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn pattern(&self) -> Result<DomainPattern, String> {
        DomainPattern::parse(&self.domain)
    }

    pub fn local_address(&self) -> Option<IpAddr> {
        self.address.as_deref().and_then(|a| a.trim().parse().ok())
    }

    pub fn parsed_record_types(&self) -> Result<Option<Vec<RecordType>>, String> {
        self.record_types
            .as_ref()
            .map(|types| types.iter().map(|t| t.parse::<RecordType>()).collect())
            .transpose()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.pattern()?;
        self.parsed_record_types()
            .map_err(|e| format!("Rule '{}': {}", self.domain, e))?;

        match self.action {
            RuleAction::Forward if self.upstream.is_none() => Err(format!(
                "Forward rule '{}' must name an upstream",
                self.domain
            )),
            RuleAction::Local if self.local_address().is_none() => Err(format!(
                "Local rule '{}' needs a valid address",
                self.domain
            )),
            _ => Ok(()),
        }
    }
}
