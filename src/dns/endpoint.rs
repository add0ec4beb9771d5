use std::net::Ipv6Addr;

use chrono::{DateTime, Utc};
use etherparse::{InternetSlice, SlicedPacket, TransportSlice};
use log::warn;

/// Transport-independent endpoint metadata for one captured frame.
#[derive(Clone, Copy, Debug)]
pub struct EndpointMeta {
    pub timestamp: DateTime<Utc>,
    pub src_ip: Ipv6Addr,
    pub dst_ip: Ipv6Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub stream_transport: bool,
}

/// Derives endpoint metadata from a raw frame, returning it together with the
/// transport payload.
///
/// Requires an IPv6 network layer: this deployment audits IPv6 resolution
/// behavior, so IPv4 and non-IP frames are not applicable. Frames with a
/// decode error at any layer are reported and dropped without stopping the
/// capture loop.
pub fn extract(data: &[u8]) -> Option<(EndpointMeta, &[u8])> {
    let frame = match SlicedPacket::from_ethernet(data) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Failed to decode some part of the frame: {e}");
            return None;
        }
    };

    let (src_ip, dst_ip) = match &frame.ip {
        Some(InternetSlice::Ipv6(ip6, _)) => (ip6.source_addr(), ip6.destination_addr()),
        _ => return None,
    };

    let (src_port, dst_port, stream_transport) = match &frame.transport {
        Some(TransportSlice::Udp(udp)) => (udp.source_port(), udp.destination_port(), false),
        Some(TransportSlice::Tcp(tcp)) => (tcp.source_port(), tcp.destination_port(), true),
        _ => (0, 0, false),
    };

    let meta = EndpointMeta {
        timestamp: Utc::now(),
        src_ip,
        dst_ip,
        src_port,
        dst_port,
        stream_transport,
    };

    Some((meta, frame.payload))
}

#[cfg(test)]
mod tests {
    use std::net::Ipv6Addr;

    use super::*;
    use crate::dns::testutil;

    const SRC: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1);
    const DST: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2);

    #[test]
    fn ipv4_frames_are_not_applicable() {
        let msg = testutil::dns_message(false, &[("example.com", testutil::QTYPE_A)], &[]);
        let frame = testutil::udp4_frame(40000, 53, &msg);
        assert!(extract(&frame).is_none());
    }

    #[test]
    fn udp_frame_yields_ports_and_payload() {
        let payload = b"payload";
        let frame = testutil::udp6_frame(SRC, DST, 40000, 53, payload);
        let (meta, rest) = extract(&frame).expect("ipv6 udp frame");
        assert_eq!(meta.src_ip, SRC);
        assert_eq!(meta.dst_ip, DST);
        assert_eq!(meta.src_port, 40000);
        assert_eq!(meta.dst_port, 53);
        assert!(!meta.stream_transport);
        assert_eq!(rest, payload);
    }

    #[test]
    fn tcp_frame_is_marked_as_stream() {
        let frame = testutil::tcp6_frame(SRC, DST, 53, 40000, b"");
        let (meta, _) = extract(&frame).expect("ipv6 tcp frame");
        assert!(meta.stream_transport);
        assert_eq!(meta.src_port, 53);
        assert_eq!(meta.dst_port, 40000);
    }

    #[test]
    fn missing_transport_leaves_ports_zero() {
        let frame = testutil::ipv6_frame_without_transport(SRC, DST);
        let (meta, _) = extract(&frame).expect("bare ipv6 frame");
        assert_eq!(meta.src_port, 0);
        assert_eq!(meta.dst_port, 0);
        assert!(!meta.stream_transport);
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let mut frame = testutil::udp6_frame(SRC, DST, 40000, 53, b"payload");
        frame.truncate(30);
        assert!(extract(&frame).is_none());
    }
}
