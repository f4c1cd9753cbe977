#![allow(dead_code)]

use async_trait::async_trait;
use conditional_dns_application::ports::{QueryLogSink, UpstreamAnswer, UpstreamResolver};
use conditional_dns_domain::{DnsQuery, DomainError, QueryDisposition, QueryLog};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

type Key = (String, String);

/// Upstream resolver answering from a table keyed by (group, domain).
#[derive(Clone, Default)]
pub struct MockUpstreamResolver {
    responses: Arc<RwLock<HashMap<Key, UpstreamAnswer>>>,
    errors: Arc<RwLock<HashMap<Key, DomainError>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    calls: Arc<Mutex<Vec<Key>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockUpstreamResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, upstream: &str, domain: &str, answer: UpstreamAnswer) {
        self.responses
            .write()
            .unwrap()
            .insert((upstream.to_string(), domain.to_string()), answer);
    }

    pub fn set_error(&self, upstream: &str, domain: &str, error: DomainError) {
        self.errors
            .write()
            .unwrap()
            .insert((upstream.to_string(), domain.to_string()), error);
    }

    pub fn set_delay(&self, upstream: &str, delay: Duration) {
        self.delays
            .write()
            .unwrap()
            .insert(upstream.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<Key> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, upstream: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == upstream)
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamResolver for MockUpstreamResolver {
    async fn resolve(
        &self,
        upstream: &str,
        query: &DnsQuery,
    ) -> Result<UpstreamAnswer, DomainError> {
        let key = (upstream.to_string(), query.domain.to_string());
        self.calls.lock().unwrap().push(key.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.read().unwrap().get(upstream).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.errors.read().unwrap().get(&key) {
            return Err(error.clone());
        }

        self.responses
            .read()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(DomainError::TransportAllServersUnreachable)
    }
}

#[derive(Clone, Default)]
pub struct MockQueryLog {
    entries: Arc<Mutex<Vec<QueryLog>>>,
}

impl MockQueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<QueryLog> {
        self.entries.lock().unwrap().clone()
    }

    pub fn dispositions(&self) -> Vec<QueryDisposition> {
        self.entries().iter().map(|e| e.disposition).collect()
    }
}

impl QueryLogSink for MockQueryLog {
    fn record(&self, entry: &QueryLog) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}
