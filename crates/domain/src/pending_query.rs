use super::RecordType;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One upstream transaction in flight.
///
/// Responses are accepted only when they carry the same transaction ID and
/// come from the server the query was sent to.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    pub id: u16,
    pub server: SocketAddr,
    pub domain: Arc<str>,
    pub record_type: RecordType,
    pub issued_at: Instant,
    pub deadline: Instant,
}

impl PendingQuery {
    pub fn new(
        id: u16,
        server: SocketAddr,
        domain: Arc<str>,
        record_type: RecordType,
        timeout: Duration,
    ) -> Self {
        let issued_at = Instant::now();
        Self {
            id,
            server,
            domain,
            record_type,
            issued_at,
            deadline: issued_at + timeout,
        }
    }

    pub fn matches_response(&self, id: u16, from: SocketAddr) -> bool {
        self.id == id && self.server.ip() == from.ip() && self.server.port() == from.port()
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.issued_at.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(timeout: Duration) -> PendingQuery {
        PendingQuery::new(
            0x1234,
            "127.0.0.1:5300".parse().unwrap(),
            Arc::from("example.com"),
            RecordType::A,
            timeout,
        )
    }

    #[test]
    fn test_matches_only_same_id_and_source() {
        let query = pending(Duration::from_secs(2));
        assert!(query.matches_response(0x1234, "127.0.0.1:5300".parse().unwrap()));
        assert!(!query.matches_response(0x4321, "127.0.0.1:5300".parse().unwrap()));
        assert!(!query.matches_response(0x1234, "127.0.0.2:5300".parse().unwrap()));
        assert!(!query.matches_response(0x1234, "127.0.0.1:53".parse().unwrap()));
    }

    #[test]
    fn test_zero_timeout_is_expired() {
        let query = pending(Duration::ZERO);
        assert!(query.is_expired());
        assert_eq!(query.remaining(), Duration::ZERO);
    }
}
