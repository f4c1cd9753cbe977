//! DNS Message Builder
//!
//! Constructs upstream query messages in wire format using `hickory-proto`.

use super::record_type_map::RecordTypeMapper;
use conditional_dns_domain::{DnsQuery, DomainError};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a recursive query for `query` and return its transaction ID with the wire bytes.
    ///
    /// The ID is random; the RD flag is set and there is exactly one question.
    pub fn build_query(query: &DnsQuery) -> Result<(u16, Vec<u8>), DomainError> {
        let name = Self::fqdn(&query.domain)?;

        let mut question = Query::new();
        question.set_name(name);
        question.set_query_type(RecordTypeMapper::to_hickory(&query.record_type));
        question.set_query_class(DNSClass::IN);

        let id = fastrand::u16(..);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(question);

        let bytes = Self::serialize_message(&message)?;
        Ok((id, bytes))
    }

    /// Parse a normalized domain (no trailing dot) into a fully qualified name.
    pub fn fqdn(domain: &str) -> Result<Name, DomainError> {
        Name::from_str(&format!("{}.", domain)).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", domain, e))
        })
    }

    pub fn serialize_message(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conditional_dns_domain::RecordType;

    #[test]
    fn test_build_a_query() {
        let (id, bytes) = MessageBuilder::build_query(&DnsQuery::new("google.com", RecordType::A))
            .unwrap();

        assert!(bytes.len() > 12, "DNS message too short: {} bytes", bytes.len());
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), id);
        assert_eq!(bytes[2] & 0x01, 0x01, "RD flag should be set");
        assert_eq!(bytes[2] & 0x80, 0, "QR flag must be clear");
        assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), 1);
    }

    #[test]
    fn test_question_round_trips_through_hickory() {
        let (_, bytes) =
            MessageBuilder::build_query(&DnsQuery::new("www.example.com", RecordType::AAAA))
                .unwrap();
        let message = Message::from_vec(&bytes).unwrap();
        let question = &message.queries()[0];

        assert_eq!(question.name().to_utf8(), "www.example.com.");
        assert_eq!(
            RecordTypeMapper::from_hickory(question.query_type()),
            RecordType::AAAA
        );
    }

    #[test]
    fn test_unknown_type_is_carried() {
        let (_, bytes) =
            MessageBuilder::build_query(&DnsQuery::new("example.com", RecordType::Other(65280)))
                .unwrap();
        let tail = &bytes[bytes.len() - 4..];
        assert_eq!(u16::from_be_bytes([tail[0], tail[1]]), 65280);
    }
}
