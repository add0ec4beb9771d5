use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use log::{info, warn};
use pcap::{Capture, Device, Error};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Fixed capture rule: DNS traffic only, queries and responses, UDP and TCP.
const FILTER: &str = "port 53";
const SNAPLEN: i32 = 1600;
const CHANNEL_CAPACITY: usize = 10_000;

/// One raw frame as delivered by the capture source. Timestamps are assigned
/// by the consumer at processing time, not here.
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub data: Bytes,
}

pub struct CaptureLoader;

impl CaptureLoader {
    pub fn list_interfaces() -> Result<Vec<Device>> {
        Ok(Device::list()?)
    }

    pub fn select_default_interface() -> Result<String> {
        let devices = Device::list()?;

        for device in &devices {
            if device.name == "any" {
                continue;
            }
            if !device.flags.is_loopback() && device.flags.is_up() && device.flags.is_running() {
                return Ok(device.name.clone());
            }
        }

        for device in &devices {
            if device.name != "any" && device.flags.is_up() {
                return Ok(device.name.clone());
            }
        }

        bail!("No suitable network interface found")
    }

    pub fn load(
        interface: &str,
    ) -> Result<(JoinHandle<()>, mpsc::Receiver<RawFrame>, CancellationToken)> {
        info!("Opening capture on interface: {interface}");

        let mut cap = if interface == "any" {
            Capture::from_device("any")?
                .promisc(true)
                .snaplen(SNAPLEN)
                .immediate_mode(true)
                .timeout(100)
                .open()?
        } else {
            let device = Device::list()?
                .into_iter()
                .find(|d| d.name == interface)
                .context(format!("Interface {interface} not found"))?;

            Capture::from_device(device)?
                .promisc(true)
                .snaplen(SNAPLEN)
                .immediate_mode(true)
                .timeout(100)
                .open()?
        };

        cap.filter(FILTER, true)?;

        info!("Capture started on interface: {interface}");

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let should_stop = Arc::new(AtomicBool::new(false));
        let should_stop_clone = should_stop.clone();

        let handle = tokio::task::spawn_blocking(move || {
            while !should_stop_clone.load(Ordering::Relaxed) {
                match cap.next_packet() {
                    Ok(packet) => {
                        if should_stop_clone.load(Ordering::Relaxed) {
                            break;
                        }

                        let frame = RawFrame {
                            data: Bytes::copy_from_slice(packet.data),
                        };
                        if tx.blocking_send(frame).is_err() {
                            info!("Channel closed, stopping capture");
                            break;
                        }
                    }
                    Err(Error::TimeoutExpired) => {
                        // Expected with the poll timeout, loop back to check
                        // the stop flag.
                        continue;
                    }
                    Err(e) => {
                        warn!("Error reading packet: {e}");
                        continue;
                    }
                }
            }
            info!("Packet capture task terminated");
        });

        let stop_handle = should_stop.clone();
        tokio::spawn(async move {
            token_clone.cancelled().await;
            stop_handle.store(true, Ordering::Relaxed);
        });

        Ok((handle, rx, cancel_token))
    }
}
