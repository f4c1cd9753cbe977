pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use conditional_dns_domain::{DomainError, PendingQuery, UpstreamProtocol};
use std::net::SocketAddr;

pub use tcp::{read_with_length_prefix, send_with_length_prefix, TcpTransport};
pub use udp::UdpTransport;

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Send one query and wait for the matching answer until `pending`'s deadline.
    async fn send(
        &self,
        pending: &PendingQuery,
        message_bytes: &[u8],
    ) -> Result<TransportResponse, DomainError>;
}

pub enum Transport {
    Udp(UdpTransport),
    Tcp(TcpTransport),
}

impl Transport {
    pub async fn send(
        &self,
        pending: &PendingQuery,
        message_bytes: &[u8],
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, pending, message_bytes).await,
            Self::Tcp(t) => DnsTransport::send(t, pending, message_bytes).await,
        }
    }
}

pub fn create_transport(protocol: UpstreamProtocol, addr: SocketAddr) -> Transport {
    match protocol {
        UpstreamProtocol::Udp => Transport::Udp(UdpTransport::new(addr)),
        UpstreamProtocol::Tcp => Transport::Tcp(TcpTransport::new(addr)),
    }
}

/// Transaction ID and QR flag from a raw DNS header.
pub(crate) fn response_header(bytes: &[u8]) -> Option<(u16, bool)> {
    if bytes.len() < 12 {
        return None;
    }
    let id = u16::from_be_bytes([bytes[0], bytes[1]]);
    Some((id, bytes[2] & 0x80 != 0))
}
