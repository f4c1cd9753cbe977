use hickory_proto::rr::{RData, Record};

/// Negative-caching TTL from the SOA in an AUTHORITY section (RFC 2308 §5).
pub fn extract_negative_ttl(authority_records: &[Record]) -> Option<u32> {
    authority_records.iter().find_map(|r| {
        if let RData::SOA(soa) = r.data() {
            Some(soa.minimum().min(r.ttl()))
        } else {
            None
        }
    })
}
