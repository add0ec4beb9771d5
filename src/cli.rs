use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "dns-nat64-monitor", version)]
#[command(about = "Passive DNS capture with NAT64 synthesis detection", long_about = None)]
pub struct Args {
    /// Network interface to observe
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Suppress per-record console output
    #[arg(short, long)]
    pub quiet: bool,

    /// Also emit response records for answered AAAA queries
    #[arg(short = 'A', long)]
    pub with_responses: bool,

    /// Postgres server address to store records (e.g. localhost:5432)
    #[arg(long)]
    pub db_host: Option<String>,

    /// Database name to store records in
    #[arg(long)]
    pub db_name: Option<String>,

    /// Username to log in with
    #[arg(long)]
    pub db_user: Option<String>,

    /// Path of a text file containing the plaintext login password
    #[arg(long)]
    pub db_password_file: Option<PathBuf>,

    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub list_interfaces: bool,
}
