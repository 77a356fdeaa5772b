//! Drain writers
//!
//! A [`DrainWriter`] owns at most one connection to a remote syslog
//! receiver and writes one RFC 5424 frame per log envelope. Connections
//! are dialed lazily on the first write; a failed dial is retried on a
//! fixed backoff until the owning subscription is cancelled or the writer
//! is closed. A failed or timed-out write discards the connection so the
//! next write redials.
//!
//! Writers are not safe for concurrent use: the task that calls `write`
//! must be the one that calls `close`. Single ownership is what lets the
//! reconnect bookkeeping stay lock-free.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sluice_metrics::MetricEmitter;
use sluice_protocol::adapter::v1::Binding;
use sluice_protocol::logs::v1::Envelope;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;
use tokio_util::sync::CancellationToken;

use crate::error::EgressError;
use crate::rfc5424;

/// Wait between failed dial attempts.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(60);

/// A connection to a drain. Only the write half is ever used.
pub type Conn = Box<dyn AsyncWrite + Send + Unpin>;

/// Dial behavior for one drain transport.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Open a connection to `host` (a `host:port` pair).
    async fn dial(&self, host: &str) -> io::Result<Conn>;
}

/// Plain TCP transport (`syslog://`).
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, host: &str) -> io::Result<Conn> {
        let stream = TcpStream::connect(host).await?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY on drain connection");
        }
        Ok(Box::new(stream))
    }
}

/// TLS transport (`syslog-tls://`); differs from plain TCP only in the
/// handshake layered on top of the dialed stream.
pub struct TlsDialer {
    connector: TlsConnector,
}

impl TlsDialer {
    pub fn new(connector: TlsConnector) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl Dialer for TlsDialer {
    async fn dial(&self, host: &str) -> io::Result<Conn> {
        let stream = TcpStream::connect(host).await?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY on drain connection");
        }

        let name = host
            .rsplit_once(':')
            .map(|(name, _port)| name)
            .unwrap_or(host)
            .trim_start_matches('[')
            .trim_end_matches(']');
        let server_name = ServerName::try_from(name.to_string()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid TLS server name {name:?}"),
            )
        })?;

        let stream = self.connector.connect(server_name, stream).await?;
        Ok(Box::new(stream))
    }
}

/// Timeouts applied to a drain connection.
#[derive(Debug, Clone, Copy)]
pub struct WriterConfig {
    /// Deadline for one dial attempt
    pub dial_timeout: Duration,

    /// Deadline for one frame write
    pub io_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            dial_timeout: Duration::from_secs(10),
            io_timeout: Duration::from_secs(5),
        }
    }
}

/// Writer seam between the subscription worker and the transport.
#[async_trait]
pub trait SyslogWriter: Send + std::fmt::Debug {
    /// Format and deliver one envelope. Non-log envelopes succeed without
    /// touching the connection.
    async fn write(&mut self, env: &Envelope) -> Result<(), EgressError>;

    /// Tear down the connection and reject further writes. Idempotent.
    async fn close(&mut self);
}

/// Syslog writer over a single lazily-dialed connection.
pub struct DrainWriter {
    host: String,
    hostname: String,
    app_id: String,
    dialer: Arc<dyn Dialer>,
    config: WriterConfig,
    cancel: CancellationToken,
    emitter: Arc<dyn MetricEmitter>,
    conn: Option<Conn>,
    closed: bool,
}

impl std::fmt::Debug for DrainWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrainWriter")
            .field("host", &self.host)
            .field("hostname", &self.hostname)
            .field("app_id", &self.app_id)
            .field("closed", &self.closed)
            .finish()
    }
}

impl DrainWriter {
    /// Create an unconnected writer for one binding. `host` is the
    /// `host:port` pair extracted from the drain URL.
    pub fn new(
        host: String,
        binding: &Binding,
        dialer: Arc<dyn Dialer>,
        config: WriterConfig,
        cancel: CancellationToken,
        emitter: Arc<dyn MetricEmitter>,
    ) -> Self {
        Self {
            host,
            hostname: binding.hostname.clone(),
            app_id: binding.app_id.clone(),
            dialer,
            config,
            cancel,
            emitter,
            conn: None,
            closed: false,
        }
    }

    /// Dial until a connection is established, the subscription is
    /// cancelled, or the writer is closed.
    async fn connect(&mut self) -> Result<(), EgressError> {
        loop {
            if self.closed {
                return Err(EgressError::WriterClosed);
            }

            let err = match timeout(self.config.dial_timeout, self.dialer.dial(&self.host)).await {
                Ok(Ok(conn)) => {
                    tracing::debug!(drain = %self.host, "connected to syslog drain");
                    self.conn = Some(conn);
                    return Ok(());
                }
                Ok(Err(e)) => e,
                Err(_) => io::Error::new(io::ErrorKind::TimedOut, "dial timed out"),
            };

            if self.cancel.is_cancelled() {
                return Err(EgressError::Dial {
                    host: self.host.clone(),
                    source: err,
                });
            }

            tracing::warn!(
                drain = %self.host,
                error = %err,
                retry_in_secs = RECONNECT_BACKOFF.as_secs(),
                "failed to connect to syslog drain"
            );

            tokio::select! {
                _ = tokio::time::sleep(RECONNECT_BACKOFF) => {}
                _ = self.cancel.cancelled() => {
                    return Err(EgressError::Dial {
                        host: self.host.clone(),
                        source: err,
                    });
                }
            }
        }
    }

    async fn disconnect(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            let _ = conn.shutdown().await;
        }
    }
}

#[async_trait]
impl SyslogWriter for DrainWriter {
    async fn write(&mut self, env: &Envelope) -> Result<(), EgressError> {
        if self.closed {
            return Err(EgressError::WriterClosed);
        }

        // Non-log envelopes and unknown log types are dropped without
        // touching the connection.
        let Some(frame) = rfc5424::encode(env, &self.hostname, &self.app_id) else {
            return Ok(());
        };

        if self.conn.is_none() {
            self.connect().await?;
        }
        let Some(conn) = self.conn.as_mut() else {
            return Err(EgressError::WriterClosed);
        };

        let result = timeout(self.config.io_timeout, async {
            conn.write_all(&frame).await?;
            conn.flush().await
        })
        .await;

        match result {
            Ok(Ok(())) => {
                self.emitter.inc_counter("egress", 1);
                Ok(())
            }
            Ok(Err(e)) => {
                self.disconnect().await;
                Err(EgressError::Io(e))
            }
            Err(_) => {
                self.disconnect().await;
                Err(EgressError::WriteTimeout)
            }
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        self.disconnect().await;
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
