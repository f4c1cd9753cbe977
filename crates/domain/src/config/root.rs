use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::cache::CacheConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::routing::RoutingConfig;
use super::server::ServerConfig;
use super::upstream::UpstreamsConfig;
use crate::routing::BlockNetworks;

pub const LOCAL_CONFIG_PATH: &str = "conditional-dns.toml";
pub const SYSTEM_CONFIG_PATH: &str = "/etc/conditional-dns.conf";

/// Main configuration structure for conditional-dns
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstreams: UpstreamsConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. conditional-dns.toml in current directory
    /// 3. /etc/conditional-dns.conf
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::get_config_path() {
                Some(found) => Self::from_file(&found)?,
                None => Self::default(),
            },
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        // Flags only switch transports on; the config file may already enable them.
        if overrides.udp {
            self.server.udp = true;
        }
        if overrides.tcp {
            self.server.tcp = true;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(file) = overrides.log_file {
            self.logging.file = Some(file);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if !self.server.udp && !self.server.tcp {
            return Err(ConfigError::Validation(
                "At least one of UDP or TCP must be enabled".to_string(),
            ));
        }

        if self.upstreams.attempts == 0 {
            return Err(ConfigError::Validation(
                "upstreams.attempts must be at least 1".to_string(),
            ));
        }

        if self.upstreams.query_timeout == 0 {
            return Err(ConfigError::Validation(
                "upstreams.query_timeout must be greater than 0".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for group in &self.upstreams.groups {
            if !names.insert(group.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate upstream group '{}'",
                    group.name
                )));
            }
            if group.servers.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Upstream group '{}' has no servers",
                    group.name
                )));
            }
            group.socket_addrs().map_err(ConfigError::Validation)?;
        }

        for (field, group) in [
            ("routing.filter_upstream", &self.routing.filter_upstream),
            ("routing.default_upstream", &self.routing.default_upstream),
        ] {
            if !names.contains(group.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "{} refers to unknown upstream group '{}'",
                    field, group
                )));
            }
        }

        BlockNetworks::parse(&self.routing.block_networks).map_err(ConfigError::Validation)?;

        for rule in &self.routing.rules {
            rule.validate().map_err(ConfigError::Validation)?;
            if let Some(upstream) = &rule.upstream {
                if !names.contains(upstream.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Rule '{}' refers to unknown upstream group '{}'",
                        rule.domain, upstream
                    )));
                }
            }
        }

        for address in &self.routing.local_ptr.extra_addresses {
            address.parse::<std::net::IpAddr>().map_err(|_| {
                ConfigError::Validation(format!(
                    "Invalid address '{}' in routing.local_ptr.extra_addresses",
                    address
                ))
            })?;
        }

        if self.cache.min_ttl > self.cache.max_ttl {
            return Err(ConfigError::Validation(format!(
                "cache.min_ttl ({}) exceeds cache.max_ttl ({})",
                self.cache.min_ttl, self.cache.max_ttl
            )));
        }

        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        [LOCAL_CONFIG_PATH, SYSTEM_CONFIG_PATH]
            .into_iter()
            .find(|p| Path::new(p).exists())
            .map(str::to_string)
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub udp: bool,
    pub tcp: bool,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}
