//! Drain connector
//!
//! Turns a binding's drain URL into a ready-to-use [`SyslogWriter`]. The
//! returned writer is a [`DiodeWriter`]: writes are non-blocking pushes
//! into a lossy ring, and a spawned drain task moves envelopes from the
//! ring to the underlying TCP/TLS connection. URL problems (parse failure,
//! unsupported scheme, missing endpoint) are unrecoverable and surface
//! here so the control plane can reject the binding instead of retrying.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sluice_metrics::MetricEmitter;
use sluice_protocol::adapter::v1::Binding;
use sluice_protocol::logs::v1::Envelope;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::diode::{Diode, DiodeProducer, DEFAULT_CAPACITY};
use crate::error::EgressError;
use crate::writer::{Dialer, DrainWriter, SyslogWriter, TcpDialer, TlsDialer, WriterConfig};

/// Configuration shared by every writer a connector hands out.
#[derive(Debug, Clone, Copy)]
pub struct ConnectorConfig {
    /// Deadline for one dial attempt
    pub dial_timeout: Duration,

    /// Deadline for one frame write
    pub io_timeout: Duration,

    /// Skip certificate verification for `syslog-tls` drains
    pub skip_cert_verify: bool,

    /// Capacity of the per-writer diode
    pub diode_capacity: usize,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            dial_timeout: Duration::from_secs(10),
            io_timeout: Duration::from_secs(5),
            skip_cert_verify: false,
            diode_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Factory seam between the subscription worker and the egress transport.
#[async_trait]
pub trait SyslogConnector: Send + Sync {
    /// Build a writer for the binding's drain. Errors are configuration
    /// problems and must not be retried.
    async fn connect(&self, binding: &Binding) -> Result<Box<dyn SyslogWriter>, EgressError>;
}

/// Connector for `syslog://` and `syslog-tls://` drains.
pub struct DrainConnector {
    config: ConnectorConfig,
    tls: tokio_rustls::TlsConnector,
    emitter: Arc<dyn MetricEmitter>,
}

impl DrainConnector {
    pub fn new(config: ConnectorConfig, emitter: Arc<dyn MetricEmitter>) -> Self {
        let tls = sluice_tls::drain_connector(config.skip_cert_verify);
        Self {
            config,
            tls,
            emitter,
        }
    }
}

#[async_trait]
impl SyslogConnector for DrainConnector {
    async fn connect(&self, binding: &Binding) -> Result<Box<dyn SyslogWriter>, EgressError> {
        let url = Url::parse(&binding.drain).map_err(|source| EgressError::InvalidUrl {
            url: binding.drain.clone(),
            source,
        })?;

        let dialer: Arc<dyn Dialer> = match url.scheme() {
            "syslog" => Arc::new(TcpDialer),
            "syslog-tls" => Arc::new(TlsDialer::new(self.tls.clone())),
            other => {
                return Err(EgressError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        };

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            _ => {
                return Err(EgressError::MissingEndpoint {
                    url: binding.drain.clone(),
                })
            }
        };

        let cancel = CancellationToken::new();
        let writer = DrainWriter::new(
            host,
            binding,
            dialer,
            WriterConfig {
                dial_timeout: self.config.dial_timeout,
                io_timeout: self.config.io_timeout,
            },
            cancel.clone(),
            Arc::clone(&self.emitter),
        );

        Ok(Box::new(DiodeWriter::spawn(
            writer,
            self.config.diode_capacity,
            cancel,
            Arc::clone(&self.emitter),
            binding.drain.clone(),
        )))
    }
}

/// Writer that decouples its caller from drain latency.
///
/// `write` pushes into the diode and returns immediately; the drain task
/// owns the inner writer and is the only task that touches the
/// connection. A stalled drain surfaces as `dropped` counter increments,
/// never as caller backpressure.
pub struct DiodeWriter {
    producer: DiodeProducer,
    cancel: CancellationToken,
    drain_task: Option<JoinHandle<()>>,
    closed: bool,
}

impl std::fmt::Debug for DiodeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiodeWriter")
            .field("closed", &self.closed)
            .finish()
    }
}

impl DiodeWriter {
    /// Wrap `inner` behind a diode of the given capacity and spawn the
    /// drain task. `cancel` unblocks the inner writer's reconnect backoff
    /// on close.
    pub fn spawn<W: SyslogWriter + 'static>(
        mut inner: W,
        capacity: usize,
        cancel: CancellationToken,
        emitter: Arc<dyn MetricEmitter>,
        drain: String,
    ) -> Self {
        let (producer, mut consumer) = Diode::new(capacity);

        let drain_task = tokio::spawn(async move {
            while let Some((env, dropped)) = consumer.next().await {
                if dropped > 0 {
                    emitter.inc_counter("dropped", dropped);
                    tracing::warn!(
                        drain = %drain,
                        dropped,
                        "dropped envelopes for slow drain"
                    );
                }

                // A failed write already discarded the connection; the
                // next frame redials.
                if let Err(e) = inner.write(&env).await {
                    tracing::debug!(drain = %drain, error = %e, "drain write failed");
                }
            }
            inner.close().await;
        });

        Self {
            producer,
            cancel,
            drain_task: Some(drain_task),
            closed: false,
        }
    }
}

#[async_trait]
impl SyslogWriter for DiodeWriter {
    async fn write(&mut self, env: &Envelope) -> Result<(), EgressError> {
        if self.closed {
            return Err(EgressError::WriterClosed);
        }
        self.producer.push(env.clone());
        Ok(())
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // Let the drain task finish what is buffered, but unblock it if it
        // is stuck in the reconnect backoff.
        self.producer.close();
        self.cancel.cancel();

        if let Some(task) = self.drain_task.take() {
            if let Err(e) = task.await {
                tracing::debug!(error = %e, "drain task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
#[path = "connector_test.rs"]
mod connector_test;
