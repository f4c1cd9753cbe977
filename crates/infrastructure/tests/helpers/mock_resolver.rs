use async_trait::async_trait;
use conditional_dns_application::ports::{UpstreamAnswer, UpstreamResolver};
use conditional_dns_domain::{DnsQuery, DomainError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers per upstream group name; groups with no answer fail.
#[derive(Default)]
pub struct StaticResolver {
    answers: Mutex<HashMap<String, Result<UpstreamAnswer, DomainError>>>,
    delay: Mutex<Option<Duration>>,
    calls: Arc<AtomicUsize>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, upstream: &str, result: Result<UpstreamAnswer, DomainError>) {
        self.answers
            .lock()
            .unwrap()
            .insert(upstream.to_string(), result);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamResolver for StaticResolver {
    async fn resolve(
        &self,
        upstream: &str,
        _query: &DnsQuery,
    ) -> Result<UpstreamAnswer, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.answers
            .lock()
            .unwrap()
            .get(upstream)
            .cloned()
            .unwrap_or(Err(DomainError::TransportAllServersUnreachable))
    }
}
