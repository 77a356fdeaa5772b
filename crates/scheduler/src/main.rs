//! Sluice scheduler - control-plane process
//!
//! # Usage
//!
//! ```bash
//! sluice-scheduler \
//!     --api-url https://catalog.internal.example \
//!     --adapter-addrs adapter-1:4443,adapter-2:4443 \
//!     --ca certs/ca.pem --cert certs/scheduler.pem --key certs/scheduler.key \
//!     --blacklist-cidrs 10.0.0.0/8,169.254.0.0/16
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sluice_scheduler::app::{self, SchedulerConfig};
use sluice_scheduler::ingress::IpRanges;

/// Sluice scheduler - reconciles syslog drain bindings onto adapters
#[derive(Parser, Debug)]
#[command(name = "sluice-scheduler")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the binding catalog
    #[arg(long)]
    api_url: String,

    /// Adapter addresses (host:port, comma-separated, placement order)
    #[arg(long, value_delimiter = ',', required = true)]
    adapter_addrs: Vec<String>,

    /// CA certificate (PEM) for mutual TLS with adapters
    #[arg(long)]
    ca: PathBuf,

    /// Client certificate (PEM) presented to adapters
    #[arg(long)]
    cert: PathBuf,

    /// Private key (PEM) for the client certificate
    #[arg(long)]
    key: PathBuf,

    /// Common name expected on adapter certificates
    #[arg(long, default_value = "adapter")]
    cn: String,

    /// Bind address for the HTTP health endpoint
    #[arg(long, default_value = "0.0.0.0:8080")]
    health_addr: SocketAddr,

    /// Seconds between reconcile passes
    #[arg(long, default_value_t = 15)]
    poll_interval: u64,

    /// CIDR ranges drains must not point into (comma-separated)
    #[arg(long, default_value = "")]
    blacklist_cidrs: String,

    /// Number of adapters each binding should run on
    #[arg(long, default_value_t = 2)]
    replication_factor: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let blacklist =
        IpRanges::parse(&cli.blacklist_cidrs).context("invalid --blacklist-cidrs value")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        api_url = %cli.api_url,
        "sluice scheduler starting"
    );

    app::run(SchedulerConfig {
        api_url: cli.api_url,
        adapter_addrs: cli.adapter_addrs,
        ca: cli.ca,
        cert: cli.cert,
        key: cli.key,
        cn: cli.cn,
        health_addr: cli.health_addr,
        poll_interval: Duration::from_secs(cli.poll_interval),
        blacklist,
        replication_factor: cli.replication_factor,
    })
    .await
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
