//! Sluice adapter - data-plane process
//!
//! # Usage
//!
//! ```bash
//! sluice-adapter \
//!     --log-bus-addrs bus-1:8082,bus-2:8082 \
//!     --ca certs/ca.pem --cert certs/adapter.pem --key certs/adapter.key
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sluice_adapter::app::{self, AdapterConfig};

/// Sluice adapter - runs one syslog subscription per assigned binding
#[derive(Parser, Debug)]
#[command(name = "sluice-adapter")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Bind address for the scheduler-facing gRPC endpoint
    #[arg(long, default_value = "0.0.0.0:4443")]
    addr: SocketAddr,

    /// Bind address for the HTTP health endpoint
    #[arg(long, default_value = "0.0.0.0:8080")]
    health_addr: SocketAddr,

    /// Log bus addresses (host:port, comma-separated)
    #[arg(long, value_delimiter = ',', required = true)]
    log_bus_addrs: Vec<String>,

    /// CA certificate (PEM) for mutual TLS
    #[arg(long)]
    ca: PathBuf,

    /// Certificate (PEM) presented on both gRPC surfaces
    #[arg(long)]
    cert: PathBuf,

    /// Private key (PEM) for the certificate
    #[arg(long)]
    key: PathBuf,

    /// Common name expected on log bus certificates
    #[arg(long, default_value = "log-bus")]
    cn: String,

    /// Seconds to wait for a drain dial before backing off
    #[arg(long, default_value_t = 10)]
    dial_timeout: u64,

    /// Write deadline in seconds for drain I/O
    #[arg(long, default_value_t = 5)]
    io_timeout: u64,

    /// Skip certificate verification for syslog-tls drains
    #[arg(long)]
    skip_cert_verify: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %cli.addr,
        "sluice adapter starting"
    );

    app::run(AdapterConfig {
        grpc_addr: cli.addr,
        health_addr: cli.health_addr,
        log_bus_addrs: cli.log_bus_addrs,
        ca: cli.ca,
        cert: cli.cert,
        key: cli.key,
        cn: cli.cn,
        dial_timeout: Duration::from_secs(cli.dial_timeout),
        io_timeout: Duration::from_secs(cli.io_timeout),
        skip_cert_verify: cli.skip_cert_verify,
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
