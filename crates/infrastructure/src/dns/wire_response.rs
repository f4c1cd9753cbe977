//! Header-level parsing and replies built straight in wire format, for
//! requests that never reach the hickory decoder.

pub const DNS_HEADER_LEN: usize = 12;

pub const RCODE_FORMERR: u8 = 1;
pub const RCODE_SERVFAIL: u8 = 2;
pub const RCODE_NOTIMP: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub id: u16,
    pub is_response: bool,
    pub opcode: u8,
    pub recursion_desired: bool,
    pub qdcount: u16,
}

impl RequestHeader {
    /// `None` for buffers shorter than a DNS header.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < DNS_HEADER_LEN {
            return None;
        }
        Some(Self {
            id: u16::from_be_bytes([buf[0], buf[1]]),
            is_response: buf[2] & 0x80 != 0,
            opcode: (buf[2] >> 3) & 0x0f,
            recursion_desired: buf[2] & 0x01 != 0,
            qdcount: u16::from_be_bytes([buf[4], buf[5]]),
        })
    }
}

/// Header-only reply: request ID and opcode echoed, QR and RA set, no sections.
pub fn error_reply(header: &RequestHeader, rcode: u8) -> Vec<u8> {
    let mut buf = vec![0u8; DNS_HEADER_LEN];
    buf[0..2].copy_from_slice(&header.id.to_be_bytes());
    buf[2] = 0x80 | (header.opcode << 3) | u8::from(header.recursion_desired);
    buf[3] = 0x80 | (rcode & 0x0f);
    buf
}
