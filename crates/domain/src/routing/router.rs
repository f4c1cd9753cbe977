use super::pattern::{DomainPattern, MatchMode};
use super::reverse_name::ReverseNames;
use super::rule::ForwardRule;
use crate::config::RoutingConfig;
use crate::dns_query::DnsQuery;
use crate::dns_record::RecordType;
use crate::errors::DomainError;

/// Where a query goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Reverse lookup of one of the host's own addresses.
    LocalPtr,
    /// Index into [`QueryRouter::rules`].
    Rule(usize),
    /// Filtering upstream only.
    Management,
    /// Default upstream only.
    Whitelisted,
    /// Both upstreams; the filter decides.
    Split,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: DomainPattern,
    record_types: Option<Vec<RecordType>>,
}

impl CompiledRule {
    fn matches(&self, query: &DnsQuery, mode: MatchMode) -> bool {
        let type_ok = match &self.record_types {
            None => true,
            Some(types) => types.contains(&query.record_type),
        };
        type_ok && self.pattern.matches(&query.domain, mode)
    }
}

/// Picks a [`Route`] for each query.
///
/// Precedence: local PTR, explicit rules (first match wins), management
/// names, whitelist, split.
#[derive(Debug, Clone)]
pub struct QueryRouter {
    rules: Vec<ForwardRule>,
    compiled: Vec<CompiledRule>,
    management: Vec<DomainPattern>,
    whitelist: Vec<DomainPattern>,
    match_mode: MatchMode,
    local_ptr_enabled: bool,
    reverse_names: ReverseNames,
}

impl QueryRouter {
    pub fn new(routing: &RoutingConfig, reverse_names: ReverseNames) -> Result<Self, DomainError> {
        let compiled = routing
            .rules
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    pattern: rule.pattern()?,
                    record_types: rule.parsed_record_types()?,
                })
            })
            .collect::<Result<Vec<_>, String>>()
            .map_err(DomainError::InvalidRoutingConfig)?;

        Ok(Self {
            rules: routing.rules.clone(),
            compiled,
            management: compile_patterns(&routing.management_domains)?,
            whitelist: compile_patterns(&routing.whitelist)?,
            match_mode: routing.match_mode,
            local_ptr_enabled: routing.local_ptr.enabled,
            reverse_names,
        })
    }

    pub fn route(&self, query: &DnsQuery) -> Route {
        if self.local_ptr_enabled
            && query.record_type == RecordType::PTR
            && self.reverse_names.contains(&query.domain)
        {
            return Route::LocalPtr;
        }

        if let Some(index) = self
            .compiled
            .iter()
            .position(|rule| rule.matches(query, self.match_mode))
        {
            return Route::Rule(index);
        }

        if self.matches_any(&self.management, &query.domain) {
            return Route::Management;
        }

        if self.matches_any(&self.whitelist, &query.domain) {
            return Route::Whitelisted;
        }

        Route::Split
    }

    pub fn rule(&self, index: usize) -> Option<&ForwardRule> {
        self.rules.get(index)
    }

    pub fn rules(&self) -> &[ForwardRule] {
        &self.rules
    }

    pub fn reverse_names(&self) -> &ReverseNames {
        &self.reverse_names
    }

    fn matches_any(&self, patterns: &[DomainPattern], name: &str) -> bool {
        patterns.iter().any(|p| p.matches(name, self.match_mode))
    }
}

fn compile_patterns(entries: &[String]) -> Result<Vec<DomainPattern>, DomainError> {
    entries
        .iter()
        .map(|entry| DomainPattern::parse(entry))
        .collect::<Result<Vec<_>, _>>()
        .map_err(DomainError::InvalidRoutingConfig)
}
