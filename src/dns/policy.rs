use super::{EndpointMeta, QueryRecord, Record, ResponseRecord};

const DNS_PORT: u16 = 53;

/// Decides what, if anything, to emit for one frame.
///
/// Rule order is a visible contract: a frame that is both a valid query and
/// carries a qualifying AAAA answer emits the response view only when
/// `with_responses` is set, and falls back to the query view otherwise.
pub fn decide(
    meta: &EndpointMeta,
    query: Option<QueryRecord>,
    response: Option<ResponseRecord>,
    with_responses: bool,
) -> Option<Record> {
    let is_valid_query = meta.dst_port == DNS_PORT && query.is_some();
    let is_valid_response = meta.src_port == DNS_PORT && response.is_some();
    let has_aaaa_answer = is_valid_response
        && response
            .as_ref()
            .is_some_and(|r| r.query.qtype == "AAAA" && r.has_answer());

    if !is_valid_query && !has_aaaa_answer {
        return None;
    }
    if with_responses && has_aaaa_answer {
        return response.map(Record::Response);
    }
    query.map(Record::Query)
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv6Addr};

    use super::*;
    use crate::dns::testutil;

    fn query(meta: EndpointMeta, qtype: &str) -> QueryRecord {
        QueryRecord {
            meta,
            qname: "example.com".to_string(),
            qtype: qtype.to_string(),
            has_answer: false,
        }
    }

    fn answered(mut query: QueryRecord) -> ResponseRecord {
        query.has_answer = true;
        ResponseRecord {
            query,
            answer_ip: Some(IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1))),
            ipv6_ready: true,
        }
    }

    #[test]
    fn query_to_the_resolver_is_emitted() {
        let meta = testutil::meta(40000, 53);
        let decision = decide(&meta, Some(query(meta, "A")), None, false);
        assert!(matches!(decision, Some(Record::Query(_))));
    }

    #[test]
    fn query_to_an_unrelated_port_is_dropped() {
        let meta = testutil::meta(40000, 8080);
        assert!(decide(&meta, Some(query(meta, "A")), None, false).is_none());
    }

    #[test]
    fn answered_aaaa_response_is_emitted_with_the_toggle() {
        let meta = testutil::meta(53, 40000);
        let q = query(meta, "AAAA");
        let r = answered(q.clone());
        let decision = decide(&meta, Some(q), Some(r), true);
        assert!(matches!(decision, Some(Record::Response(_))));
    }

    #[test]
    fn suppressed_response_falls_back_to_the_query_view() {
        let meta = testutil::meta(53, 40000);
        let q = query(meta, "AAAA");
        let r = answered(q.clone());
        let decision = decide(&meta, Some(q), Some(r), false);
        assert!(matches!(decision, Some(Record::Query(_))));
    }

    #[test]
    fn non_aaaa_response_is_dropped() {
        let meta = testutil::meta(53, 40000);
        let q = query(meta, "A");
        let r = answered(q.clone());
        assert!(decide(&meta, Some(q), Some(r), true).is_none());
    }

    #[test]
    fn unanswered_aaaa_response_is_dropped() {
        let meta = testutil::meta(53, 40000);
        let q = query(meta, "AAAA");
        let r = ResponseRecord {
            query: q.clone(),
            answer_ip: None,
            ipv6_ready: true,
        };
        assert!(decide(&meta, Some(q), Some(r), true).is_none());
    }

    // Both ports 53: the frame qualifies as query and as answered response at
    // the same time. The toggle alone picks the view.
    #[test]
    fn dual_frame_precedence_follows_the_toggle() {
        let meta = testutil::meta(53, 53);
        let q = query(meta, "AAAA");
        let r = answered(q.clone());

        let decision = decide(&meta, Some(q.clone()), Some(r.clone()), true);
        assert!(matches!(decision, Some(Record::Response(_))));

        let decision = decide(&meta, Some(q), Some(r), false);
        assert!(matches!(decision, Some(Record::Query(_))));
    }
}
