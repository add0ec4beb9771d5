mod cli;
mod dns;
mod export;
mod pcap;
mod pipeline;

use std::fs;
use std::process::exit;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use export::{ConsoleExporter, ExportRouter, Exporter, PostgresExporter};
use log::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_interfaces {
        let interfaces = pcap::CaptureLoader::list_interfaces()?;
        println!("Available network interfaces:");
        for device in interfaces {
            let status = if device.flags.is_up() { "UP" } else { "DOWN" };
            let running = if device.flags.is_running() {
                "RUNNING"
            } else {
                ""
            };
            let loopback = if device.flags.is_loopback() {
                "LOOPBACK"
            } else {
                ""
            };

            println!("  {} [{}] {} {}", device.name, status, running, loopback);

            if let Some(desc) = device.desc {
                println!("    Description: {desc}");
            }
        }
        return Ok(());
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let interface = if let Some(ref iface) = args.interface {
        iface.clone()
    } else {
        pcap::CaptureLoader::select_default_interface()?
    };

    info!("Starting DNS NAT64 monitor");
    info!("Interface: {interface}");

    let mut exporters: Vec<Box<dyn Exporter>> = Vec::new();

    if !args.quiet {
        exporters.push(Box::new(ConsoleExporter));
    }

    if let (Some(addr), Some(name), Some(user), Some(password_file)) = (
        args.db_host.as_deref(),
        args.db_name.as_deref(),
        args.db_user.as_deref(),
        args.db_password_file.as_ref(),
    ) {
        let password = fs::read_to_string(password_file).with_context(|| {
            format!(
                "Failed to read password file for DB login: {}",
                password_file.display()
            )
        })?;
        let exporter = PostgresExporter::connect(addr, user, password.trim_end(), name)
            .await
            .context("Failed to prepare database connection")?;
        info!("Prepared database connection: {addr}");
        exporters.push(Box::new(exporter));
    }

    info!("Starting packet capture...");
    let (_capture_handle, frame_rx, cancel_token) = pcap::CaptureLoader::load(&interface)?;
    info!("Packet capture started successfully");

    {
        let cancel_token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping capture...");
                cancel_token.cancel();
            }
        });
    }

    let result = pipeline::run(frame_rx, args.with_responses, ExportRouter::new(exporters)).await;

    cancel_token.cancel();

    if let Err(e) = result {
        error!("{e:#}");
        exit(1);
    }

    info!("DNS NAT64 monitor stopped");
    exit(0)
}
