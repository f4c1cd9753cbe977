#![allow(dead_code)]
use conditional_dns_application::ports::{UpstreamAnswer, UpstreamResolver};
use conditional_dns_application::use_cases::HandleDnsQueryUseCase;
use conditional_dns_domain::{
    CacheConfig, DnsQuery, QueryRouter, RecordType, ReverseNames, RoutingConfig,
};
use conditional_dns_infrastructure::dns::{DnsServerHandler, TracingQueryLog};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::SOA;
use hickory_proto::rr::{Name, RData, Record, RecordType as HickoryRecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

pub fn query(domain: &str, record_type: RecordType) -> DnsQuery {
    DnsQuery::new(domain, record_type)
}

pub fn a_answer(ip: &str, ttl: u32) -> UpstreamAnswer {
    UpstreamAnswer::new(vec![ip.parse::<IpAddr>().unwrap()]).with_ttl(ttl)
}

pub fn soa_record(zone: &str, minimum: u32) -> Record {
    let name = Name::from_str(&format!("{}.", zone)).unwrap();
    let mname = Name::from_str(&format!("ns1.{}.", zone)).unwrap();
    let rname = Name::from_str(&format!("hostmaster.{}.", zone)).unwrap();
    let soa = SOA::new(mname, rname, 1, 3600, 900, 604800, minimum);
    Record::from_rdata(name, 3600, RData::SOA(soa))
}

pub fn cache_config(max_entries: usize) -> CacheConfig {
    CacheConfig {
        max_entries,
        ..CacheConfig::default()
    }
}

pub fn handler(
    routing: &RoutingConfig,
    local_addresses: &[&str],
    resolver: Arc<dyn UpstreamResolver>,
) -> DnsServerHandler {
    let reverse_names = ReverseNames::from_addresses(
        local_addresses.iter().map(|a| a.parse::<IpAddr>().unwrap()),
    );
    let router = Arc::new(QueryRouter::new(routing, reverse_names).unwrap());
    let use_case =
        HandleDnsQueryUseCase::new(routing, router, resolver, Arc::new(TracingQueryLog::new()))
            .unwrap();
    DnsServerHandler::new(Arc::new(use_case))
}

/// Client-side query in wire format.
pub fn encode_query(id: u16, name: &str, record_type: HickoryRecordType) -> Vec<u8> {
    let mut question = Query::new();
    question.set_name(Name::from_str(name).unwrap());
    question.set_query_type(record_type);

    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(question);

    let mut buf = Vec::new();
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).unwrap();
    buf
}
