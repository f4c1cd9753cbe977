use crate::dns::forwarding::{DnsResponse, MessageBuilder, ResponseParser};
use crate::dns::transport::{create_transport, DnsTransport, TcpTransport, Transport};
use conditional_dns_domain::{
    DnsQuery, DomainError, PendingQuery, UpstreamGroup, UpstreamProtocol,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct UpstreamResult {
    pub response: DnsResponse,
    pub server: SocketAddr,
    pub latency_ms: u64,
}

struct UpstreamServer {
    addr: SocketAddr,
    transport: Transport,
    tcp_fallback: Option<TcpTransport>,
}

/// A named group of upstream servers, tried in order.
pub struct UpstreamPool {
    name: Arc<str>,
    servers: Vec<UpstreamServer>,
    timeout: Duration,
    attempts: u8,
}

impl UpstreamPool {
    pub fn new(
        name: &str,
        addrs: &[SocketAddr],
        protocol: UpstreamProtocol,
        timeout: Duration,
        attempts: u8,
    ) -> Self {
        let servers = addrs
            .iter()
            .map(|&addr| UpstreamServer {
                addr,
                transport: create_transport(protocol, addr),
                tcp_fallback: match protocol {
                    UpstreamProtocol::Udp => Some(TcpTransport::new(addr)),
                    UpstreamProtocol::Tcp => None,
                },
            })
            .collect();

        Self {
            name: Arc::from(name),
            servers,
            timeout,
            attempts: attempts.max(1),
        }
    }

    pub fn from_group(
        group: &UpstreamGroup,
        timeout_ms: u64,
        attempts: u8,
    ) -> Result<Self, DomainError> {
        let addrs = group
            .socket_addrs()
            .map_err(DomainError::InvalidRoutingConfig)?;
        Ok(Self::new(
            &group.name,
            &addrs,
            group.protocol,
            Duration::from_millis(timeout_ms),
            attempts,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server_addrs(&self) -> Vec<SocketAddr> {
        self.servers.iter().map(|s| s.addr).collect()
    }

    /// Failover across the group: each server in order, `attempts` passes.
    pub async fn query(&self, query: &DnsQuery) -> Result<UpstreamResult, DomainError> {
        if self.servers.is_empty() {
            return Err(DomainError::TransportAllServersUnreachable);
        }

        let mut only_timeouts = true;

        for attempt in 0..self.attempts {
            for (position, server) in self.servers.iter().enumerate() {
                match self.query_server(server, query).await {
                    Ok(result) => {
                        debug!(
                            pool = %self.name,
                            server = %result.server,
                            latency_ms = result.latency_ms,
                            position,
                            attempt,
                            "Server responded"
                        );
                        return Ok(result);
                    }
                    Err(e) => {
                        only_timeouts &= matches!(e, DomainError::QueryTimeout);
                        warn!(
                            pool = %self.name,
                            server = %server.addr,
                            domain = %query.domain,
                            error = %e,
                            position,
                            attempt,
                            "Failing over"
                        );
                    }
                }
            }
        }

        if only_timeouts {
            Err(DomainError::QueryTimeout)
        } else {
            Err(DomainError::TransportAllServersUnreachable)
        }
    }

    async fn query_server(
        &self,
        server: &UpstreamServer,
        query: &DnsQuery,
    ) -> Result<UpstreamResult, DomainError> {
        let (pending, bytes) = self.prepare(server.addr, query)?;
        let sent = server.transport.send(&pending, &bytes).await?;
        let mut response = ResponseParser::parse(&sent.bytes)?;

        if response.truncated {
            if let Some(tcp) = &server.tcp_fallback {
                debug!(
                    server = %server.addr,
                    domain = %query.domain,
                    "Truncated over UDP, retrying over TCP"
                );
                let (retry, retry_bytes) = self.prepare(server.addr, query)?;
                let sent = tcp.send(&retry, &retry_bytes).await?;
                response = ResponseParser::parse(&sent.bytes)?;
            }
        }

        if response.is_server_error() {
            return Err(DomainError::UpstreamRejected {
                server: server.addr.to_string(),
                status: ResponseParser::rcode_to_status(response.rcode),
            });
        }

        Ok(UpstreamResult {
            response,
            server: server.addr,
            latency_ms: pending.elapsed_ms(),
        })
    }

    fn prepare(
        &self,
        server: SocketAddr,
        query: &DnsQuery,
    ) -> Result<(PendingQuery, Vec<u8>), DomainError> {
        let (id, bytes) = MessageBuilder::build_query(query)?;
        let pending = PendingQuery::new(
            id,
            server,
            Arc::clone(&query.domain),
            query.record_type,
            self.timeout,
        );
        Ok((pending, bytes))
    }
}
