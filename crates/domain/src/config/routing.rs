use serde::{Deserialize, Serialize};

use super::upstream::{FILTERING_GROUP, UNBLOCKING_GROUP};
use crate::routing::{ForwardRule, MatchMode};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// Group whose answers reveal blocked names.
    #[serde(default = "default_filter_upstream")]
    pub filter_upstream: String,

    /// Group that answers everything the filter does not block.
    #[serde(default = "default_default_upstream")]
    pub default_upstream: String,

    /// Addresses the filtering upstream hands out for blocked names.
    #[serde(default = "default_block_networks")]
    pub block_networks: Vec<String>,

    /// Names resolved through the filtering upstream only.
    #[serde(default = "default_management_domains")]
    pub management_domains: Vec<String>,

    /// Names resolved through the default upstream without consulting the filter.
    #[serde(default)]
    pub whitelist: Vec<String>,

    #[serde(default)]
    pub match_mode: MatchMode,

    #[serde(default)]
    pub rules: Vec<ForwardRule>,

    #[serde(default)]
    pub local_ptr: LocalPtrConfig,

    #[serde(default = "default_answer_ttl")]
    pub answer_ttl: u32,

    #[serde(default)]
    pub preserve_upstream_ttl: bool,

    /// Use the default upstream's answer when the filtering upstream fails.
    #[serde(default)]
    pub fail_open: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            filter_upstream: default_filter_upstream(),
            default_upstream: default_default_upstream(),
            block_networks: default_block_networks(),
            management_domains: default_management_domains(),
            whitelist: vec![],
            match_mode: MatchMode::default(),
            rules: vec![],
            local_ptr: LocalPtrConfig::default(),
            answer_ttl: default_answer_ttl(),
            preserve_upstream_ttl: false,
            fail_open: false,
        }
    }
}

/// Answers PTR queries for the host's own addresses locally.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalPtrConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ptr_name")]
    pub name: String,

    #[serde(default = "default_answer_ttl")]
    pub ttl: u32,

    /// Addresses answered in addition to the ones found on local interfaces.
    #[serde(default)]
    pub extra_addresses: Vec<String>,
}

impl Default for LocalPtrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: default_ptr_name(),
            ttl: default_answer_ttl(),
            extra_addresses: vec![],
        }
    }
}

fn default_filter_upstream() -> String {
    FILTERING_GROUP.to_string()
}

fn default_default_upstream() -> String {
    UNBLOCKING_GROUP.to_string()
}

fn default_block_networks() -> Vec<String> {
    vec!["146.112.61.104/29".to_string()]
}

fn default_management_domains() -> Vec<String> {
    vec!["opendns.com".to_string()]
}

fn default_answer_ttl() -> u32 {
    300
}

fn default_ptr_name() -> String {
    "localdns".to_string()
}

fn default_true() -> bool {
    true
}
