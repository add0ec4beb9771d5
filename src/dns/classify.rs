use std::net::IpAddr;

use dns_parser::{Packet, RData};

use super::{EndpointMeta, QueryRecord, ResponseRecord};

/// `64:ff9b::/96`, the well-known prefix for NAT64 address synthesis
/// (RFC 6052). An answer inside it reaches IPv4 through a translator rather
/// than a native IPv6 host.
const NAT64_PREFIX: [u16; 6] = [0x64, 0xff9b, 0, 0, 0, 0];

fn in_nat64_prefix(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V6(v6) => v6.segments()[..6] == NAT64_PREFIX,
        IpAddr::V4(_) => false,
    }
}

/// Builds the query view of a message from its first question. Messages with
/// no question yield nothing; further questions are ignored (multi-question
/// messages are out of scope).
pub fn derive_query(msg: &Packet<'_>, meta: &EndpointMeta) -> Option<QueryRecord> {
    let question = msg.questions.first()?;
    Some(QueryRecord {
        meta: *meta,
        qname: question.qname.to_string(),
        qtype: format!("{:?}", question.qtype),
        has_answer: !msg.answers.is_empty(),
    })
}

/// Extends a query view with the message's first answer. A response view
/// never exists without a query view: the wire response still carries the
/// original question, so the query side is derivable from the same frame.
pub fn derive_response(query: Option<&QueryRecord>, msg: &Packet<'_>) -> Option<ResponseRecord> {
    let query = query?;
    let answer = msg.answers.first()?;

    let answer_ip = match &answer.data {
        RData::A(a) => Some(IpAddr::V4(a.0)),
        RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
        _ => None,
    };

    let mut query = query.clone();
    // The query-side flag was provisional; the response view re-derives it
    // from the presence of an answer address.
    query.has_answer = answer_ip.is_some();

    let ipv6_ready = !answer_ip.is_some_and(in_nat64_prefix);

    Some(ResponseRecord {
        query,
        answer_ip,
        ipv6_ready,
    })
}
