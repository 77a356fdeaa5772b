//! Adapter process wiring
//!
//! Builds the component graph for the `sluice-adapter` binary and runs it
//! until a shutdown signal arrives: log-bus client pool → drain connector
//! → subscriber → binding registry, exposed over mutual-TLS gRPC plus an
//! HTTP health endpoint.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sluice_egress::{ConnectorConfig, DrainConnector};
use sluice_metrics::{MetricEmitter, TracingEmitter};
use sluice_protocol::adapter::v1::adapter_server::AdapterServer;
use tokio::signal;
use tonic::transport::Server;

use crate::bindings::{BindingManager, BindingService};
use crate::health;
use crate::ingress::{ClientPool, Subscriber, SubscriptionStarter};

/// Adapter runtime configuration, assembled from the CLI flags.
#[derive(Debug)]
pub struct AdapterConfig {
    /// Scheduler-facing gRPC bind address
    pub grpc_addr: SocketAddr,

    /// Health endpoint bind address
    pub health_addr: SocketAddr,

    /// Log-bus node addresses (`host:port`)
    pub log_bus_addrs: Vec<String>,

    /// Mutual-TLS material shared by both gRPC surfaces
    pub ca: PathBuf,
    pub cert: PathBuf,
    pub key: PathBuf,

    /// Common name expected on log-bus certificates
    pub cn: String,

    /// Drain dial timeout
    pub dial_timeout: Duration,

    /// Drain write deadline
    pub io_timeout: Duration,

    /// Skip certificate verification for `syslog-tls` drains
    pub skip_cert_verify: bool,
}

/// Run the adapter until a shutdown signal. Errors here are fatal
/// configuration or bind problems.
pub async fn run(config: AdapterConfig) -> Result<()> {
    let client_tls = sluice_tls::client_mtls(&config.ca, &config.cert, &config.key, &config.cn)
        .context("failed to load log bus TLS material")?;
    let server_tls = sluice_tls::server_mtls(&config.ca, &config.cert, &config.key)
        .context("failed to load control plane TLS material")?;

    let pool = Arc::new(
        ClientPool::new(&config.log_bus_addrs, Some(client_tls))
            .context("failed to build log bus client pool")?,
    );

    let emitter: Arc<dyn MetricEmitter> = Arc::new(TracingEmitter);
    let connector = Arc::new(DrainConnector::new(
        ConnectorConfig {
            dial_timeout: config.dial_timeout,
            io_timeout: config.io_timeout,
            skip_cert_verify: config.skip_cert_verify,
            ..ConnectorConfig::default()
        },
        Arc::clone(&emitter),
    ));
    let subscriber = Arc::new(Subscriber::new(pool, connector, emitter));
    let manager = Arc::new(BindingManager::new(
        subscriber as Arc<dyn SubscriptionStarter>,
    ));

    // Health endpoint; failing to bind it is fatal.
    let health_listener = tokio::net::TcpListener::bind(config.health_addr)
        .await
        .with_context(|| format!("failed to bind health endpoint on {}", config.health_addr))?;
    tracing::info!(addr = %config.health_addr, "health endpoint listening");

    let health_router = health::router(Arc::clone(&manager));
    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(health_listener, health_router).await {
            tracing::error!(error = %e, "health server error");
        }
    });

    let service = BindingService::new(Arc::clone(&manager));

    tracing::info!(
        addr = %config.grpc_addr,
        log_bus_nodes = config.log_bus_addrs.len(),
        skip_cert_verify = config.skip_cert_verify,
        "adapter control plane listening"
    );

    Server::builder()
        .tls_config(server_tls)
        .context("invalid control plane TLS configuration")?
        .add_service(AdapterServer::new(service))
        .serve_with_shutdown(config.grpc_addr, wait_for_shutdown())
        .await
        .context("control plane server failed")?;

    tracing::info!("shutdown signal received, stopping subscriptions");
    manager.drain().await;
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
