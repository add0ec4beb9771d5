use anyhow::Result;
use dns_parser::Packet;
use log::debug;
use tokio::sync::mpsc;

use crate::dns::{self, Record};
use crate::export::ExportRouter;
use crate::pcap::RawFrame;

/// Per-frame decision path: extraction, classification, emission policy.
/// Pure apart from the capture timestamp.
pub fn evaluate_frame(frame: &RawFrame, with_responses: bool) -> Option<Record> {
    let (meta, payload) = dns::extract(&frame.data)?;

    // DNS over TCP prefixes the message with a two-octet length
    // (RFC 1035 section 4.2.2).
    let payload = if meta.stream_transport {
        payload.get(2..).unwrap_or_default()
    } else {
        payload
    };

    let msg = match Packet::parse(payload) {
        Ok(msg) => msg,
        Err(e) => {
            debug!("Not a parseable DNS message: {e}");
            return None;
        }
    };

    let query = dns::derive_query(&msg, &meta);
    let response = dns::derive_response(query.as_ref(), &msg);
    dns::decide(&meta, query, response, with_responses)
}

/// Sequential single-consumer loop: every frame is fully processed, export
/// fan-out included, before the next one is pulled. A slow durable sink
/// therefore throttles capture consumption instead of queueing records.
pub async fn run(
    mut frames: mpsc::Receiver<RawFrame>,
    with_responses: bool,
    mut router: ExportRouter,
) -> Result<()> {
    while let Some(frame) = frames.recv().await {
        let Some(record) = evaluate_frame(&frame, with_responses) else {
            continue;
        };
        router.dispatch(&record).await?;
    }
    Ok(())
}
