use compact_str::CompactString;
use conditional_dns_domain::RecordType;

/// Answers are cached per upstream group: the same name resolves differently
/// through the filtering and the unblocking resolvers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub upstream: CompactString,
    pub domain: CompactString,
    pub record_type: RecordType,
}

impl CacheKey {
    #[inline]
    pub fn new(upstream: &str, domain: &str, record_type: RecordType) -> Self {
        Self {
            upstream: CompactString::from(upstream),
            domain: CompactString::from(domain),
            record_type,
        }
    }
}
