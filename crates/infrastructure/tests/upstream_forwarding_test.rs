use conditional_dns_application::ports::UpstreamResolver;
use conditional_dns_domain::{DomainError, RecordType, UpstreamProtocol};
use conditional_dns_infrastructure::dns::{UpstreamPool, UpstreamRegistry};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

mod helpers;
use helpers::{query, MockBehavior, MockDnsServer};

const ANSWER_IP: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);

fn pool(name: &str, servers: &[&MockDnsServer], timeout_ms: u64, attempts: u8) -> UpstreamPool {
    let addrs: Vec<_> = servers.iter().map(|s| s.addr()).collect();
    UpstreamPool::new(
        name,
        &addrs,
        UpstreamProtocol::Udp,
        Duration::from_millis(timeout_ms),
        attempts,
    )
}

#[tokio::test]
async fn test_pool_returns_answer_from_server() {
    let server = MockDnsServer::start(MockBehavior::Answer { ip: ANSWER_IP, ttl: 60 })
        .await
        .unwrap();
    let pool = pool("filtering", &[&server], 1000, 1);

    let result = pool.query(&query("example.com", RecordType::A)).await.unwrap();

    assert_eq!(result.server, server.addr());
    assert_eq!(result.response.addresses, vec![IpAddr::V4(ANSWER_IP)]);
    assert_eq!(result.response.min_ttl, Some(60));
}

#[tokio::test]
async fn test_failover_to_next_server_on_timeout() {
    let silent = MockDnsServer::start(MockBehavior::Silent).await.unwrap();
    let healthy = MockDnsServer::start(MockBehavior::Answer { ip: ANSWER_IP, ttl: 60 })
        .await
        .unwrap();
    let pool = pool("filtering", &[&silent, &healthy], 200, 1);

    let result = pool.query(&query("example.com", RecordType::A)).await.unwrap();

    assert_eq!(result.server, healthy.addr());
    assert_eq!(silent.udp_queries(), 1);
    assert_eq!(healthy.udp_queries(), 1);
}

#[tokio::test]
async fn test_failover_on_servfail() {
    let failing = MockDnsServer::start(MockBehavior::Rcode(2)).await.unwrap();
    let healthy = MockDnsServer::start(MockBehavior::Answer { ip: ANSWER_IP, ttl: 60 })
        .await
        .unwrap();
    let pool = pool("unblocking", &[&failing, &healthy], 1000, 1);

    let result = pool.query(&query("example.com", RecordType::A)).await.unwrap();

    assert_eq!(result.server, healthy.addr());
}

#[tokio::test]
async fn test_wrong_transaction_id_is_ignored() {
    let server = MockDnsServer::start(MockBehavior::WrongIdFirst { ip: ANSWER_IP, ttl: 60 })
        .await
        .unwrap();
    let pool = pool("filtering", &[&server], 1000, 1);

    let result = pool.query(&query("example.com", RecordType::A)).await.unwrap();

    assert_eq!(result.response.addresses, vec![IpAddr::V4(ANSWER_IP)]);
}

#[tokio::test]
async fn test_truncated_udp_answer_retried_over_tcp() {
    let server = MockDnsServer::start(MockBehavior::TruncatedUdp { ip: ANSWER_IP, ttl: 60 })
        .await
        .unwrap();
    let pool = pool("filtering", &[&server], 1000, 1);

    let result = pool.query(&query("example.com", RecordType::A)).await.unwrap();

    assert!(!result.response.truncated);
    assert_eq!(result.response.addresses, vec![IpAddr::V4(ANSWER_IP)]);
    assert_eq!(server.udp_queries(), 1);
    assert_eq!(server.tcp_queries(), 1);
}

#[tokio::test]
async fn test_all_servers_silent_is_timeout() {
    let a = MockDnsServer::start(MockBehavior::Silent).await.unwrap();
    let b = MockDnsServer::start(MockBehavior::Silent).await.unwrap();
    let pool = pool("filtering", &[&a, &b], 100, 2);

    let result = pool.query(&query("example.com", RecordType::A)).await;

    assert!(matches!(result, Err(DomainError::QueryTimeout)));
    assert_eq!(a.udp_queries(), 2);
    assert_eq!(b.udp_queries(), 2);
}

#[tokio::test]
async fn test_nxdomain_is_an_answer_not_a_failure() {
    let server = MockDnsServer::start(MockBehavior::Rcode(3)).await.unwrap();
    let registry = UpstreamRegistry::from_pools(vec![pool("filtering", &[&server], 1000, 1)]);

    let answer = registry
        .resolve("filtering", &query("missing.example", RecordType::A))
        .await
        .unwrap();

    assert!(answer.is_nxdomain());
    assert_eq!(answer.upstream_server, Some(server.addr().to_string()));
}

#[tokio::test]
async fn test_registry_unknown_group() {
    let registry = UpstreamRegistry::from_pools(vec![]);

    let result = registry
        .resolve("nowhere", &query("example.com", RecordType::A))
        .await;

    assert!(matches!(result, Err(DomainError::UnknownUpstream(name)) if name == "nowhere"));
}
