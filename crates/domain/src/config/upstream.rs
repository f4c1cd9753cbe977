use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

pub const FILTERING_GROUP: &str = "filtering";
pub const UNBLOCKING_GROUP: &str = "unblocking";

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamProtocol {
    #[default]
    Udp,
    Tcp,
}

impl UpstreamProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        }
    }
}

/// A named set of upstream resolvers tried in order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamGroup {
    pub name: String,

    /// `"ip"`, `"ip:port"` or `"[ipv6]:port"`; port defaults to 53.
    pub servers: Vec<String>,

    #[serde(default)]
    pub protocol: UpstreamProtocol,
}

impl UpstreamGroup {
    pub fn new(name: &str, servers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            servers: servers.iter().map(|s| s.to_string()).collect(),
            protocol: UpstreamProtocol::Udp,
        }
    }

    pub fn socket_addrs(&self) -> Result<Vec<SocketAddr>, String> {
        self.servers.iter().map(|s| parse_server_addr(s)).collect()
    }
}

pub fn parse_server_addr(server: &str) -> Result<SocketAddr, String> {
    let server = server.trim();
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }
    server
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| format!("Invalid upstream server address '{}'", server))
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamsConfig {
    #[serde(default = "default_groups")]
    pub groups: Vec<UpstreamGroup>,

    /// Per-server attempt timeout in milliseconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,

    /// Passes over a group's server list before giving up.
    #[serde(default = "default_attempts")]
    pub attempts: u8,
}

impl UpstreamsConfig {
    pub fn group(&self, name: &str) -> Option<&UpstreamGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            groups: default_groups(),
            query_timeout: default_query_timeout(),
            attempts: default_attempts(),
        }
    }
}

fn default_groups() -> Vec<UpstreamGroup> {
    vec![
        UpstreamGroup::new(FILTERING_GROUP, &["208.67.222.123:53", "208.67.220.123:53"]),
        UpstreamGroup::new(UNBLOCKING_GROUP, &["185.37.37.37:53", "185.37.39.39:53"]),
    ]
}

fn default_query_timeout() -> u64 {
    2000
}

fn default_attempts() -> u8 {
    2
}
