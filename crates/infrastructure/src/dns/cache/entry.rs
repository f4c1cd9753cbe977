use conditional_dns_application::ports::UpstreamAnswer;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub answer: UpstreamAnswer,
    /// Coarse Unix seconds.
    pub expires_at: u64,
}

impl CacheEntry {
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    #[inline]
    pub fn remaining_ttl(&self, now: u64) -> u32 {
        self.expires_at.saturating_sub(now).min(u32::MAX as u64) as u32
    }
}
