use std::fmt;
use std::net::IpAddr;

use chrono::SecondsFormat;
use colored::Colorize;

use super::EndpointMeta;

/// Query view of an observed transaction: the first question of the message
/// plus the endpoint metadata of the frame that carried it.
#[derive(Clone, Debug)]
pub struct QueryRecord {
    pub meta: EndpointMeta,
    /// Queried name as presented on the wire, not further normalized.
    pub qname: String,
    /// Symbolic record type of the question ("A", "AAAA", ...).
    pub qtype: String,
    /// Whether the originating message already carried an answer. Provisional
    /// signal for the emission policy; deriving a response view overwrites it.
    pub has_answer: bool,
}

/// Response view: the query view of the same frame extended with the first
/// answer.
#[derive(Clone, Debug)]
pub struct ResponseRecord {
    pub query: QueryRecord,
    /// Address of answer zero, when that record type carries one.
    pub answer_ip: Option<IpAddr>,
    /// True iff the answer is a genuine IPv6 address rather than a NAT64
    /// synthesis out of `64:ff9b::/96`.
    pub ipv6_ready: bool,
}

impl ResponseRecord {
    pub fn has_answer(&self) -> bool {
        self.query.has_answer
    }
}

impl fmt::Display for QueryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.meta.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
        let src = format!("{}.{}", self.meta.src_ip, self.meta.src_port);
        let dst = format!("{}.{}", self.meta.dst_ip, self.meta.dst_port);
        let trans = if self.meta.stream_transport { "TCP" } else { "UDP" };
        let qtype = format!("{}?", self.qtype);
        write!(f, "{ts} | {src:<43} > {dst:<25} {trans} {qtype:<8} {}", self.qname)
    }
}

impl fmt::Display for ResponseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = &self.query.meta;
        let ts = meta.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
        let src = format!("{}.{}", meta.src_ip, meta.src_port);
        let dst = format!("{}.{}", meta.dst_ip, meta.dst_port);
        let trans = if meta.stream_transport { "TCP" } else { "UDP" };
        let qtype = format!("{}?", self.query.qtype);
        let answer = match self.answer_ip {
            Some(ip) => ip.to_string(),
            None => "-".to_string(),
        };
        write!(
            f,
            "{ts} | {dst:<43} < {src:<25} {trans} {qtype:<8} {} ({answer})",
            self.query.qname
        )
    }
}

/// An emitted record: one of the two views of an observed transaction.
#[derive(Clone, Debug)]
pub enum Record {
    Query(QueryRecord),
    Response(ResponseRecord),
}

impl Record {
    /// Console rendering with the operator color taxonomy: A queries red,
    /// AAAA queries green, responses blue when the answer is native IPv6 and
    /// magenta when NAT64-synthesized.
    pub fn colorize(&self) -> String {
        let line = self.to_string();
        match self {
            Record::Query(q) => match q.qtype.as_str() {
                "A" => line.as_str().red().to_string(),
                "AAAA" => line.as_str().green().to_string(),
                _ => line,
            },
            Record::Response(r) => {
                if r.ipv6_ready {
                    line.as_str().blue().to_string()
                } else {
                    line.as_str().magenta().to_string()
                }
            }
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Query(q) => q.fmt(f),
            Record::Response(r) => r.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv6Addr};

    use super::*;
    use crate::dns::testutil;

    fn query() -> QueryRecord {
        QueryRecord {
            meta: testutil::meta(40000, 53),
            qname: "example.com".to_string(),
            qtype: "A".to_string(),
            has_answer: false,
        }
    }

    fn response() -> ResponseRecord {
        let mut query = query();
        query.qtype = "AAAA".to_string();
        query.has_answer = true;
        query.meta = testutil::meta(53, 40000);
        ResponseRecord {
            query,
            answer_ip: Some(IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1))),
            ipv6_ready: true,
        }
    }

    #[test]
    fn query_line_points_at_the_resolver() {
        let line = query().to_string();
        assert!(line.starts_with("2024-05-01T12:00:00Z | 2001:db8::1.40000"));
        assert!(line.contains(" > "));
        assert!(line.contains("UDP"));
        assert!(line.contains("A?"));
        assert!(line.ends_with("example.com"));
    }

    #[test]
    fn response_line_points_back_at_the_client() {
        let line = response().to_string();
        // The resolver is the source this time; the line leads with the
        // destination so the client stays in the first column.
        assert!(line.starts_with("2024-05-01T12:00:00Z | 2001:db8::2.40000"));
        assert!(line.contains(" < "));
        assert!(line.contains("AAAA?"));
        assert!(line.ends_with("example.com (2001:db8::1)"));
    }

    #[test]
    fn color_taxonomy_follows_record_kind() {
        colored::control::set_override(false);
        let a_query = Record::Query(query());
        assert_eq!(a_query.colorize(), a_query.to_string());

        colored::control::set_override(true);
        assert!(a_query.colorize().starts_with("\u{1b}[31m"));

        let mut aaaa = query();
        aaaa.qtype = "AAAA".to_string();
        assert!(Record::Query(aaaa).colorize().starts_with("\u{1b}[32m"));

        let ready = response();
        assert!(Record::Response(ready.clone()).colorize().starts_with("\u{1b}[34m"));

        let mut synthesized = ready;
        synthesized.ipv6_ready = false;
        assert!(Record::Response(synthesized).colorize().starts_with("\u{1b}[35m"));

        colored::control::unset_override();
    }
}
