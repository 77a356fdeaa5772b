//! Scheduler process wiring
//!
//! Builds the component graph for the `sluice-scheduler` binary: catalog
//! fetch chain (blacklist → version → fetcher → API client), adapter pool
//! and service, the orchestrator loop, and the health endpoint.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::egress::{AdapterPool, AdapterService, Orchestrator};
use crate::health::{self, HealthStats};
use crate::ingress::{ApiClient, BindingFetcher, BlacklistFilter, IpRanges, VersionFilter};

const CATALOG_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Scheduler runtime configuration, assembled from the CLI flags.
#[derive(Debug)]
pub struct SchedulerConfig {
    /// Base URL of the binding catalog
    pub api_url: String,

    /// Adapter addresses (`host:port`), in placement-priority order
    pub adapter_addrs: Vec<String>,

    /// Mutual-TLS material for the adapter channels
    pub ca: PathBuf,
    pub cert: PathBuf,
    pub key: PathBuf,

    /// Common name expected on adapter certificates
    pub cn: String,

    /// Health endpoint bind address
    pub health_addr: SocketAddr,

    /// Reconcile interval
    pub poll_interval: Duration,

    /// CIDR ranges drains must not resolve into
    pub blacklist: IpRanges,

    /// Adapters per binding
    pub replication_factor: usize,
}

/// Run the scheduler until a shutdown signal. Errors here are fatal
/// configuration or bind problems.
pub async fn run(config: SchedulerConfig) -> Result<()> {
    let tls = sluice_tls::client_mtls(&config.ca, &config.cert, &config.key, &config.cn)
        .context("failed to load adapter TLS material")?;

    let pool = AdapterPool::new(&config.adapter_addrs, Some(tls))
        .context("failed to build adapter pool")?;

    let stats = Arc::new(HealthStats::default());
    stats.set_adapter_count(pool.len());

    let service = Arc::new(AdapterService::new(pool));

    let http = reqwest::Client::builder()
        .timeout(CATALOG_REQUEST_TIMEOUT)
        .build()
        .context("failed to build catalog HTTP client")?;
    let fetcher = BlacklistFilter::new(
        config.blacklist.clone(),
        VersionFilter::new(BindingFetcher::new(ApiClient::new(http, &config.api_url))),
    );

    let orchestrator = Orchestrator::new(fetcher, Arc::clone(&service), Arc::clone(&stats))
        .with_interval(config.poll_interval)
        .with_replication_factor(config.replication_factor);

    // Health endpoint; failing to bind it is fatal.
    let health_listener = tokio::net::TcpListener::bind(config.health_addr)
        .await
        .with_context(|| format!("failed to bind health endpoint on {}", config.health_addr))?;
    tracing::info!(addr = %config.health_addr, "health endpoint listening");

    let health_router = health::router(Arc::clone(&stats));
    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(health_listener, health_router).await {
            tracing::error!(error = %e, "health server error");
        }
    });

    let cancel = CancellationToken::new();
    let orchestrator_task = tokio::spawn(orchestrator.run(cancel.clone()));

    tracing::info!(
        api_url = %config.api_url,
        adapters = config.adapter_addrs.len(),
        poll_interval_secs = config.poll_interval.as_secs(),
        replication = config.replication_factor,
        blacklist_ranges = config.blacklist.len(),
        "scheduler running"
    );

    wait_for_shutdown().await;
    tracing::info!("shutdown signal received, stopping orchestrator");

    cancel.cancel();
    if let Err(e) = orchestrator_task.await {
        tracing::warn!(error = %e, "orchestrator task panicked during shutdown");
    }
    health_task.abort();

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
