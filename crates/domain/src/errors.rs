use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Invalid routing configuration: {0}")]
    InvalidRoutingConfig(String),

    #[error("Unknown upstream group: {0}")]
    UnknownUpstream(String),

    #[error("Upstream {server} answered {status}")]
    UpstreamRejected { server: String, status: &'static str },

    #[error("Transport error talking to {server}: {reason}")]
    Transport { server: String, reason: String },

    #[error("All upstream servers are unreachable")]
    TransportAllServersUnreachable,

    #[error("I/O error: {0}")]
    IoError(String),
}

impl DomainError {
    pub fn transport(server: impl ToString, reason: impl ToString) -> Self {
        Self::Transport {
            server: server.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Status label used in query logs.
    pub fn log_status(&self) -> &'static str {
        match self {
            DomainError::QueryTimeout => "TIMEOUT",
            DomainError::UpstreamRejected { status, .. } => status,
            _ => "SERVFAIL",
        }
    }
}
