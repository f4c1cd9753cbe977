//! UDP Transport for DNS queries (RFC 1035 §4.2.1)
//!
//! Messages are sent as-is. A response with the TC bit set is returned to the
//! caller, which retries over TCP.

use super::{response_header, DnsTransport, TransportResponse};
use async_trait::async_trait;
use conditional_dns_domain::{DomainError, PendingQuery};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

/// Receive buffer size; upstream answers may use EDNS(0) sizes.
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    fn bind_addr(&self) -> SocketAddr {
        if self.server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        pending: &PendingQuery,
        message_bytes: &[u8],
    ) -> Result<TransportResponse, DomainError> {
        let socket = UdpSocket::bind(self.bind_addr()).await.map_err(|e| {
            DomainError::transport(self.server_addr, format!("Failed to bind UDP socket: {}", e))
        })?;

        tokio::time::timeout(pending.remaining(), socket.send_to(message_bytes, self.server_addr))
            .await
            .map_err(|_| DomainError::QueryTimeout)?
            .map_err(|e| DomainError::transport(self.server_addr, e))?;

        debug!(
            server = %self.server_addr,
            id = pending.id,
            bytes_sent = message_bytes.len(),
            "UDP query sent"
        );

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];

        loop {
            let (bytes_received, from_addr) =
                tokio::time::timeout(pending.remaining(), socket.recv_from(&mut recv_buf))
                    .await
                    .map_err(|_| DomainError::QueryTimeout)?
                    .map_err(|e| DomainError::transport(self.server_addr, e))?;

            match response_header(&recv_buf[..bytes_received]) {
                Some((id, true)) if pending.matches_response(id, from_addr) => {
                    recv_buf.truncate(bytes_received);
                    debug!(
                        server = %self.server_addr,
                        bytes_received = bytes_received,
                        elapsed_ms = pending.elapsed_ms(),
                        "UDP response received"
                    );
                    return Ok(TransportResponse { bytes: recv_buf });
                }
                _ => {
                    debug!(
                        expected = %self.server_addr,
                        received_from = %from_addr,
                        bytes = bytes_received,
                        "Ignoring UDP datagram that does not answer the pending query"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_transport_creation() {
        let addr: SocketAddr = "8.8.8.8:53".parse().unwrap();
        let transport = UdpTransport::new(addr);
        assert_eq!(transport.server_addr(), addr);
        assert!(transport.bind_addr().is_ipv4());
    }

    #[test]
    fn test_udp_transport_ipv6() {
        let addr: SocketAddr = "[2001:4860:4860::8888]:53".parse().unwrap();
        let transport = UdpTransport::new(addr);
        assert!(transport.bind_addr().is_ipv6());
    }
}
