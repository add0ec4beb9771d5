//! Wire-format builders for tests: minimal DNS messages and the Ethernet
//! frames that carry them.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::TimeZone;
use etherparse::{EtherType, Ethernet2Header, Ipv6Header, PacketBuilder};

use super::EndpointMeta;

pub const QTYPE_A: u16 = 1;
pub const QTYPE_AAAA: u16 = 28;

/// Answer payloads the builders know how to encode.
pub enum Rdata {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
    Cname(&'static str),
}

fn push_name(buf: &mut Vec<u8>, name: &str) {
    for label in name.trim_end_matches('.').split('.') {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
}

/// Minimal DNS message: header, then the given questions and answers, no
/// compression.
pub fn dns_message(response: bool, questions: &[(&str, u16)], answers: &[(&str, Rdata)]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&0x1234u16.to_be_bytes());
    let flags: u16 = if response { 0x8180 } else { 0x0100 };
    buf.extend_from_slice(&flags.to_be_bytes());
    buf.extend_from_slice(&(questions.len() as u16).to_be_bytes());
    buf.extend_from_slice(&(answers.len() as u16).to_be_bytes());
    buf.extend_from_slice(&0u16.to_be_bytes());
    buf.extend_from_slice(&0u16.to_be_bytes());

    for (name, qtype) in questions {
        push_name(&mut buf, name);
        buf.extend_from_slice(&qtype.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
    }

    for (name, rdata) in answers {
        push_name(&mut buf, name);
        let (rtype, data): (u16, Vec<u8>) = match rdata {
            Rdata::V4(ip) => (QTYPE_A, ip.octets().to_vec()),
            Rdata::V6(ip) => (QTYPE_AAAA, ip.octets().to_vec()),
            Rdata::Cname(target) => {
                let mut encoded = Vec::new();
                push_name(&mut encoded, target);
                (5, encoded)
            }
        };
        buf.extend_from_slice(&rtype.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&60u32.to_be_bytes());
        buf.extend_from_slice(&(data.len() as u16).to_be_bytes());
        buf.extend_from_slice(&data);
    }

    buf
}

pub fn udp6_frame(
    src: Ipv6Addr,
    dst: Ipv6Addr,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([2; 6], [4; 6])
        .ipv6(src.octets(), dst.octets(), 64)
        .udp(src_port, dst_port);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).expect("frame build");
    frame
}

/// TCP segment carrying a whole DNS message, two-octet length prefix
/// included.
pub fn tcp6_frame(
    src: Ipv6Addr,
    dst: Ipv6Addr,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut segment = Vec::with_capacity(payload.len() + 2);
    segment.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    segment.extend_from_slice(payload);

    let builder = PacketBuilder::ethernet2([2; 6], [4; 6])
        .ipv6(src.octets(), dst.octets(), 64)
        .tcp(src_port, dst_port, 0, 4096);
    let mut frame = Vec::with_capacity(builder.size(segment.len()));
    builder.write(&mut frame, &segment).expect("frame build");
    frame
}

pub fn udp4_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([2; 6], [4; 6])
        .ipv4([192, 0, 2, 1], [192, 0, 2, 2], 64)
        .udp(src_port, dst_port);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).expect("frame build");
    frame
}

pub fn ipv6_frame_without_transport(src: Ipv6Addr, dst: Ipv6Addr) -> Vec<u8> {
    let eth = Ethernet2Header {
        source: [2; 6],
        destination: [4; 6],
        ether_type: EtherType::Ipv6 as u16,
    };
    let ip = Ipv6Header {
        traffic_class: 0,
        flow_label: 0,
        payload_length: 0,
        next_header: 59, // no next header
        hop_limit: 64,
        source: src.octets(),
        destination: dst.octets(),
    };
    let mut frame = Vec::new();
    eth.write(&mut frame).expect("ethernet header");
    ip.write(&mut frame).expect("ipv6 header");
    frame
}

/// Endpoint metadata with a fixed timestamp and well-known documentation
/// addresses, for deterministic assertions.
pub fn meta(src_port: u16, dst_port: u16) -> EndpointMeta {
    EndpointMeta {
        timestamp: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        src_ip: Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1),
        dst_ip: Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2),
        src_port,
        dst_port,
        stream_transport: false,
    }
}
