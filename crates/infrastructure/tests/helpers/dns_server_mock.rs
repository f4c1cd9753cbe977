#![allow(dead_code)]
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

/// How the mock upstream answers.
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// One A record.
    Answer { ip: Ipv4Addr, ttl: u32 },
    /// Never replies.
    Silent,
    /// A reply with the wrong transaction ID first, then the real one.
    WrongIdFirst { ip: Ipv4Addr, ttl: u32 },
    /// TC over UDP; the full answer only over TCP on the same port.
    TruncatedUdp { ip: Ipv4Addr, ttl: u32 },
    /// Header-only reply with the given RCODE.
    Rcode(u8),
}

pub struct MockDnsServer {
    addr: SocketAddr,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    /// Binds UDP and TCP on the same ephemeral port of 127.0.0.1.
    pub async fn start(behavior: MockBehavior) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let listener = TcpListener::bind(addr).await?;

        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let udp_count = Arc::clone(&udp_queries);
        let tcp_count = Arc::clone(&tcp_queries);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            udp_count.fetch_add(1, Ordering::SeqCst);
                            for reply in Self::udp_replies(&buf[..len], behavior) {
                                let _ = socket.send_to(&reply, peer).await;
                            }
                        }
                    }
                    accepted = listener.accept() => {
                        if let Ok((mut stream, _)) = accepted {
                            tcp_count.fetch_add(1, Ordering::SeqCst);
                            tokio::spawn(async move {
                                let mut len_buf = [0u8; 2];
                                if stream.read_exact(&mut len_buf).await.is_err() {
                                    return;
                                }
                                let mut query = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                                if stream.read_exact(&mut query).await.is_err() {
                                    return;
                                }
                                if let Some(reply) = Self::tcp_reply(&query, behavior) {
                                    let _ = stream.write_all(&(reply.len() as u16).to_be_bytes()).await;
                                    let _ = stream.write_all(&reply).await;
                                }
                            });
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            udp_queries,
            tcp_queries,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }

    fn udp_replies(query: &[u8], behavior: MockBehavior) -> Vec<Vec<u8>> {
        match behavior {
            MockBehavior::Silent => vec![],
            MockBehavior::Answer { ip, ttl } => vec![build_answer(query, ip, ttl)],
            MockBehavior::WrongIdFirst { ip, ttl } => {
                let mut stray = build_answer(query, Ipv4Addr::new(10, 66, 66, 66), ttl);
                if stray.len() >= 2 {
                    stray[0] ^= 0xff;
                    stray[1] ^= 0xff;
                }
                vec![stray, build_answer(query, ip, ttl)]
            }
            MockBehavior::TruncatedUdp { .. } => {
                let mut reply = build_header_only(query, 0);
                if reply.len() > 2 {
                    reply[2] |= 0x02;
                }
                vec![reply]
            }
            MockBehavior::Rcode(rcode) => vec![build_header_only(query, rcode)],
        }
    }

    fn tcp_reply(query: &[u8], behavior: MockBehavior) -> Option<Vec<u8>> {
        match behavior {
            MockBehavior::Silent => None,
            MockBehavior::Answer { ip, ttl }
            | MockBehavior::WrongIdFirst { ip, ttl }
            | MockBehavior::TruncatedUdp { ip, ttl } => Some(build_answer(query, ip, ttl)),
            MockBehavior::Rcode(rcode) => Some(build_header_only(query, rcode)),
        }
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Offset just past the first question (QNAME + QTYPE + QCLASS).
fn question_end(query: &[u8]) -> usize {
    let mut pos = 12;
    while pos < query.len() && query[pos] != 0 {
        pos += query[pos] as usize + 1;
    }
    (pos + 5).min(query.len())
}

fn build_header_only(query: &[u8], rcode: u8) -> Vec<u8> {
    if query.len() < 12 {
        return vec![];
    }

    let end = question_end(query);
    let mut response = Vec::with_capacity(end);

    response.extend_from_slice(&query[0..2]);
    response.push(0x81);
    response.push(0x80 | (rcode & 0x0f));
    response.extend_from_slice(&[0x00, 0x01]);
    response.extend_from_slice(&[0x00, 0x00]);
    response.extend_from_slice(&[0x00, 0x00]);
    response.extend_from_slice(&[0x00, 0x00]);
    response.extend_from_slice(&query[12..end]);

    response
}

fn build_answer(query: &[u8], ip: Ipv4Addr, ttl: u32) -> Vec<u8> {
    let mut response = build_header_only(query, 0);
    if response.is_empty() {
        return response;
    }

    response[7] = 0x01;
    response.extend_from_slice(&[
        0xc0, 0x0c,
        0x00, 0x01,
        0x00, 0x01,
    ]);
    response.extend_from_slice(&ttl.to_be_bytes());
    response.extend_from_slice(&[0x00, 0x04]);
    response.extend_from_slice(&ip.octets());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_query() -> Vec<u8> {
        let mut query = vec![
            0x12, 0x34,
            0x01, 0x00,
            0x00, 0x01,
            0x00, 0x00,
            0x00, 0x00,
            0x00, 0x00,
        ];
        query.extend_from_slice(&[7]);
        query.extend_from_slice(b"example");
        query.extend_from_slice(&[3]);
        query.extend_from_slice(b"com");
        query.extend_from_slice(&[0, 0x00, 0x01, 0x00, 0x01]);
        query
    }

    #[test]
    fn test_mock_answer_layout() {
        let query = sample_query();
        let response = build_answer(&query, Ipv4Addr::new(93, 184, 216, 34), 60);

        assert_eq!(response[0..2], query[0..2]);
        assert_eq!(response[2] & 0x80, 0x80);
        assert_eq!(response[6..8], [0x00, 0x01]);
        assert_eq!(&response[response.len() - 4..], &[93, 184, 216, 34]);
    }

    #[tokio::test]
    async fn test_mock_server_responds() {
        let server = MockDnsServer::start(MockBehavior::Answer {
            ip: Ipv4Addr::new(93, 184, 216, 34),
            ttl: 60,
        })
        .await
        .unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let query = sample_query();
        client.send_to(&query, server.addr()).await.unwrap();

        let mut buf = vec![0u8; 512];
        let (len, _) = client.recv_from(&mut buf).await.unwrap();

        assert!(len > 12, "Response should have at least header");
        assert_eq!(buf[0..2], query[0..2], "Transaction ID should match");
        assert_eq!(server.udp_queries(), 1);
    }
}
