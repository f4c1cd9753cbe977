use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Serve DNS over UDP.
    #[serde(default)]
    pub udp: bool,

    /// Serve DNS over TCP.
    #[serde(default)]
    pub tcp: bool,

    /// Number of SO_REUSEPORT UDP sockets, each with its own receive loop.
    #[serde(default = "default_udp_workers")]
    pub udp_workers: usize,

    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    /// Seconds an idle TCP client connection is kept open.
    #[serde(default = "default_tcp_idle_timeout")]
    pub tcp_idle_timeout: u64,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            udp: false,
            tcp: false,
            udp_workers: default_udp_workers(),
            max_concurrent_queries: default_max_concurrent_queries(),
            tcp_idle_timeout: default_tcp_idle_timeout(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5053
}

fn default_udp_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, 16)
}

fn default_max_concurrent_queries() -> usize {
    4096
}

fn default_tcp_idle_timeout() -> u64 {
    10
}
