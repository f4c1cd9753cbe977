use crate::dns::forwarding::{MessageBuilder, RecordTypeMapper};
use crate::dns::wire_response::{
    error_reply, RequestHeader, RCODE_FORMERR, RCODE_NOTIMP, RCODE_SERVFAIL,
};
use conditional_dns_application::use_cases::{Answer, DnsResolution, HandleDnsQueryUseCase};
use conditional_dns_domain::{normalize_domain, DnsRequest};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, PTR};
use hickory_proto::rr::{DNSClass, RData, Record};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, error};

/// Largest reply sent over UDP; anything bigger goes out truncated with TC set.
pub const MAX_UDP_PAYLOAD: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerTransport {
    Udp,
    Tcp,
}

pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>) -> Self {
        Self { use_case }
    }

    /// Decode one request, resolve it and encode the reply.
    ///
    /// Returns `None` when the datagram must be dropped silently.
    pub async fn handle_raw(
        &self,
        bytes: &[u8],
        client: SocketAddr,
        transport: ServerTransport,
    ) -> Option<Vec<u8>> {
        let header = match RequestHeader::parse(bytes) {
            Some(header) => header,
            None => {
                debug!(client = %client, len = bytes.len(), "Dropping runt packet");
                return None;
            }
        };

        if header.is_response {
            debug!(client = %client, id = header.id, "Dropping packet with QR set");
            return None;
        }

        if header.opcode != 0 {
            debug!(client = %client, opcode = header.opcode, "Unsupported opcode");
            return Some(error_reply(&header, RCODE_NOTIMP));
        }

        if header.qdcount != 1 {
            debug!(client = %client, qdcount = header.qdcount, "Request must carry exactly one question");
            return Some(error_reply(&header, RCODE_FORMERR));
        }

        let request = match Message::from_vec(bytes) {
            Ok(message) => message,
            Err(e) => {
                debug!(client = %client, error = %e, "Malformed request");
                return Some(error_reply(&header, RCODE_FORMERR));
            }
        };

        let question = match request.queries().first() {
            Some(question) => question.clone(),
            None => return Some(error_reply(&header, RCODE_FORMERR)),
        };

        // Upstream queries are always class IN.
        if question.query_class() != DNSClass::IN {
            debug!(client = %client, class = ?question.query_class(), "Refusing non-IN query");
            let mut message = reply_skeleton(&header, &question);
            message.set_response_code(ResponseCode::Refused);
            return Some(
                MessageBuilder::serialize_message(&message)
                    .unwrap_or_else(|_| error_reply(&header, RCODE_SERVFAIL)),
            );
        }

        let domain = normalize_domain(&question.name().to_utf8());
        let record_type = RecordTypeMapper::from_hickory(question.query_type());

        debug!(
            domain = %domain,
            record_type = %record_type,
            client = %client,
            transport = ?transport,
            "DNS query received"
        );

        let dns_request = DnsRequest::new(domain, record_type, client);

        let reply = match self.use_case.execute(&dns_request).await {
            Ok(resolution) => build_reply(&header, &question, &resolution),
            Err(_) => {
                let mut message = reply_skeleton(&header, &question);
                message.set_response_code(ResponseCode::ServFail);
                message
            }
        };

        let encoded = match MessageBuilder::serialize_message(&reply) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(error = %e, client = %client, "Failed to encode reply");
                return Some(error_reply(&header, RCODE_SERVFAIL));
            }
        };

        if transport == ServerTransport::Udp && encoded.len() > MAX_UDP_PAYLOAD {
            debug!(client = %client, len = encoded.len(), "Reply exceeds UDP limit, truncating");
            return Some(truncated_reply(&header, &question, reply.response_code()));
        }

        Some(encoded)
    }
}

/// Response header with the question echoed: QR, AA and RA set, RD copied.
fn reply_skeleton(header: &RequestHeader, question: &Query) -> Message {
    let mut message = Message::new(header.id, MessageType::Response, OpCode::Query);
    message.set_authoritative(true);
    message.set_recursion_desired(header.recursion_desired);
    message.set_recursion_available(true);
    message.add_query(question.clone());
    message
}

fn build_reply(header: &RequestHeader, question: &Query, resolution: &DnsResolution) -> Message {
    let mut message = reply_skeleton(header, question);
    let owner = question.name().clone();
    let ttl = resolution.ttl;

    match &resolution.answer {
        Answer::Addresses(addresses) => {
            for ip in addresses.iter() {
                let rdata = match ip {
                    IpAddr::V4(v4) => RData::A(A(*v4)),
                    IpAddr::V6(v6) => RData::AAAA(AAAA(*v6)),
                };
                message.add_answer(Record::from_rdata(owner.clone(), ttl, rdata));
            }
        }
        Answer::Pointer(name) => match MessageBuilder::fqdn(name) {
            Ok(target) => {
                message.add_answer(Record::from_rdata(owner, ttl, RData::PTR(PTR(target))));
            }
            Err(e) => {
                error!(error = %e, "Invalid local PTR name");
                message.set_response_code(ResponseCode::ServFail);
            }
        },
        Answer::Records(records) => {
            for record in records.iter() {
                let mut record = record.clone();
                record.set_ttl(ttl);
                message.add_answer(record);
            }
        }
        Answer::NoData => add_authority(&mut message, resolution),
        Answer::NxDomain => {
            message.set_response_code(ResponseCode::NXDomain);
            add_authority(&mut message, resolution);
        }
        Answer::Refused => {
            message.set_response_code(ResponseCode::Refused);
        }
    }

    message
}

fn add_authority(message: &mut Message, resolution: &DnsResolution) {
    for record in resolution.authority.iter() {
        message.add_name_server(record.clone());
    }
}

fn truncated_reply(header: &RequestHeader, question: &Query, rcode: ResponseCode) -> Vec<u8> {
    let mut message = reply_skeleton(header, question);
    message.set_response_code(rcode);
    message.set_truncated(true);
    MessageBuilder::serialize_message(&message).unwrap_or_else(|_| {
        let mut bytes = error_reply(header, RCODE_SERVFAIL);
        bytes[2] |= 0x02;
        bytes
    })
}
