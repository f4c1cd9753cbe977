use super::{response_header, DnsTransport, TransportResponse};
use async_trait::async_trait;
use conditional_dns_domain::{DomainError, PendingQuery};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

pub const MAX_TCP_MESSAGE_SIZE: usize = 65535;

/// DNS over TCP with the two-byte length prefix of RFC 1035 §4.2.2.
pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    async fn connect(&self, pending: &PendingQuery) -> Result<TcpStream, DomainError> {
        let stream = tokio::time::timeout(pending.remaining(), TcpStream::connect(self.server_addr))
            .await
            .map_err(|_| DomainError::QueryTimeout)?
            .map_err(|e| DomainError::transport(self.server_addr, e))?;

        stream
            .set_nodelay(true)
            .map_err(|e| DomainError::transport(self.server_addr, e))?;

        Ok(stream)
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        pending: &PendingQuery,
        message_bytes: &[u8],
    ) -> Result<TransportResponse, DomainError> {
        let mut stream = self.connect(pending).await?;

        tokio::time::timeout(
            pending.remaining(),
            send_with_length_prefix(&mut stream, message_bytes),
        )
        .await
        .map_err(|_| DomainError::QueryTimeout)??;

        debug!(
            server = %self.server_addr,
            message_len = message_bytes.len(),
            "TCP query sent"
        );

        let response_bytes =
            tokio::time::timeout(pending.remaining(), read_with_length_prefix(&mut stream))
                .await
                .map_err(|_| DomainError::QueryTimeout)??;

        match response_header(&response_bytes) {
            Some((id, true)) if id == pending.id => {}
            _ => {
                return Err(DomainError::InvalidDnsResponse(format!(
                    "TCP response from {} does not match query {}",
                    self.server_addr, pending.id
                )))
            }
        }

        debug!(
            server = %self.server_addr,
            response_len = response_bytes.len(),
            elapsed_ms = pending.elapsed_ms(),
            "TCP response received"
        );

        Ok(TransportResponse {
            bytes: response_bytes,
        })
    }
}

pub async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> Result<(), DomainError>
where
    S: AsyncWriteExt + Unpin,
{
    if message_bytes.len() > MAX_TCP_MESSAGE_SIZE {
        return Err(DomainError::IoError(format!(
            "DNS message too large for TCP: {} bytes",
            message_bytes.len()
        )));
    }

    let length_bytes = (message_bytes.len() as u16).to_be_bytes();

    let mut framed = Vec::with_capacity(2 + message_bytes.len());
    framed.extend_from_slice(&length_bytes);
    framed.extend_from_slice(message_bytes);

    stream
        .write_all(&framed)
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to write DNS message: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to flush stream: {}", e)))?;

    Ok(())
}

pub async fn read_with_length_prefix<S>(stream: &mut S) -> Result<Vec<u8>, DomainError>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to read message length: {}", e)))?;

    let message_len = u16::from_be_bytes(len_buf) as usize;

    let mut message = vec![0u8; message_len];
    stream
        .read_exact(&mut message)
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to read message body: {}", e)))?;

    Ok(message)
}
