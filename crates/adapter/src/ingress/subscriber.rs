//! Subscription worker
//!
//! One worker per binding. A worker owns a drain writer and a log-bus
//! stream and moves envelopes between them:
//!
//! 1. acquire a writer from the connector (a failure here is a
//!    configuration problem - bad drain URL - and is never retried),
//! 2. open an `Egress.Receiver` stream on the next pool client, sharding
//!    on the binding tuple so replicas of the same binding split the
//!    stream,
//! 3. loop: receive, skip non-log envelopes, hand the rest to the writer.
//!
//! A stream error tears the session down (writer included) and starts a
//! fresh one. Stopping is cooperative: an atomic flag checked between
//! receives plus a cancellation token that aborts a blocked receive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sluice_egress::{EgressError, SyslogConnector, SyslogWriter};
use sluice_metrics::{CounterMetric, MetricEmitter};
use sluice_protocol::adapter::v1::Binding;
use sluice_protocol::logs::v1::{filter, EgressRequest, Filter, LogFilter};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::client_pool::ClientPool;

/// Emit the ingress counter after this many envelopes...
const COUNTER_BATCH: u64 = 1000;

/// ...or after this long, whichever comes first.
const COUNTER_INTERVAL: Duration = Duration::from_secs(5);

/// Wait before retrying a failed stream open, so a down log bus does not
/// turn the worker into a busy loop.
const STREAM_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Seam between the binding registry and the worker implementation.
#[async_trait]
pub trait SubscriptionStarter: Send + Sync {
    /// Start forwarding for `binding`. An error means the binding is
    /// unusable (bad drain URL) and must be rejected, not retried.
    async fn start(&self, binding: Binding) -> Result<Subscription, EgressError>;
}

/// Handle to a running worker.
#[derive(Debug)]
pub struct Subscription {
    stop: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(stop: Arc<AtomicBool>, cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { stop, cancel, task }
    }

    /// Signal the worker and wait for it to exit.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::debug!(error = %e, "subscription worker ended abnormally");
        }
    }
}

/// Factory for subscription workers.
pub struct Subscriber {
    pool: Arc<ClientPool>,
    connector: Arc<dyn SyslogConnector>,
    emitter: Arc<dyn MetricEmitter>,
}

impl Subscriber {
    pub fn new(
        pool: Arc<ClientPool>,
        connector: Arc<dyn SyslogConnector>,
        emitter: Arc<dyn MetricEmitter>,
    ) -> Self {
        Self {
            pool,
            connector,
            emitter,
        }
    }
}

#[async_trait]
impl SubscriptionStarter for Subscriber {
    async fn start(&self, binding: Binding) -> Result<Subscription, EgressError> {
        // Connect before spawning so URL problems surface on the
        // CreateBinding RPC instead of dying silently in a task.
        let writer = self.connector.connect(&binding).await?;

        let stop = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        let pool = Arc::clone(&self.pool);
        let connector = Arc::clone(&self.connector);
        let emitter = Arc::clone(&self.emitter);
        let stop_flag = Arc::clone(&stop);
        let cancel_token = cancel.clone();

        let task = tokio::spawn(async move {
            run_worker(
                pool,
                connector,
                emitter,
                binding,
                writer,
                stop_flag,
                cancel_token,
            )
            .await;
        });

        Ok(Subscription::new(stop, cancel, task))
    }
}

enum SessionEnd {
    /// Stream ended or failed; start a fresh session
    Retry,
    /// Worker was told to stop
    Stop,
}

async fn run_worker(
    pool: Arc<ClientPool>,
    connector: Arc<dyn SyslogConnector>,
    emitter: Arc<dyn MetricEmitter>,
    binding: Binding,
    first_writer: Box<dyn SyslogWriter>,
    stop: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    tracing::info!(binding = %binding, "subscription started");

    let ingress = CounterMetric::new("ingress");
    let mut writer = Some(first_writer);

    loop {
        if stop.load(Ordering::Relaxed) || cancel.is_cancelled() {
            break;
        }

        let mut current = match writer.take() {
            Some(w) => w,
            None => match connector.connect(&binding).await {
                Ok(w) => w,
                Err(e) => {
                    tracing::error!(
                        binding = %binding,
                        error = %e,
                        "failed to connect to syslog drain, abandoning subscription"
                    );
                    break;
                }
            },
        };

        let end = run_session(
            &pool,
            &binding,
            current.as_mut(),
            &ingress,
            &*emitter,
            &stop,
            &cancel,
        )
        .await;

        current.close().await;

        if matches!(end, SessionEnd::Stop) {
            break;
        }
    }

    tracing::info!(binding = %binding, "subscription stopped");
}

async fn run_session(
    pool: &ClientPool,
    binding: &Binding,
    writer: &mut dyn SyslogWriter,
    ingress: &CounterMetric,
    emitter: &dyn MetricEmitter,
    stop: &AtomicBool,
    cancel: &CancellationToken,
) -> SessionEnd {
    let mut client = pool.next();
    let request = EgressRequest {
        shard_id: binding.shard_id(),
        filter: Some(Filter {
            source_id: binding.app_id.clone(),
            message: Some(filter::Message::Log(LogFilter {})),
        }),
    };

    let mut stream = tokio::select! {
        response = client.receiver(request) => match response {
            Ok(response) => response.into_inner(),
            Err(status) => {
                tracing::warn!(
                    binding = %binding,
                    error = %status,
                    "failed to open log bus stream"
                );
                tokio::select! {
                    _ = tokio::time::sleep(STREAM_RETRY_BACKOFF) => {}
                    _ = cancel.cancelled() => return SessionEnd::Stop,
                }
                return SessionEnd::Retry;
            }
        },
        _ = cancel.cancelled() => return SessionEnd::Stop,
    };

    let mut last_emitted = Instant::now();

    let end = loop {
        if stop.load(Ordering::Relaxed) {
            break SessionEnd::Stop;
        }

        let envelope = tokio::select! {
            message = stream.message() => match message {
                Ok(Some(envelope)) => envelope,
                Ok(None) => {
                    tracing::warn!(binding = %binding, "log bus stream ended");
                    break SessionEnd::Retry;
                }
                Err(status) => {
                    tracing::warn!(
                        binding = %binding,
                        error = %status,
                        "log bus stream failed"
                    );
                    break SessionEnd::Retry;
                }
            },
            _ = cancel.cancelled() => break SessionEnd::Stop,
        };

        if envelope.log().is_none() {
            continue;
        }

        ingress.increment(1);
        if ingress.delta() >= COUNTER_BATCH || last_emitted.elapsed() > COUNTER_INTERVAL {
            emitter.inc_counter(ingress.name(), ingress.take());
            last_emitted = Instant::now();
        }

        // The diode writer never exerts backpressure; a transport problem
        // is handled inside its drain task.
        if let Err(e) = writer.write(&envelope).await {
            tracing::debug!(binding = %binding, error = %e, "drain write failed");
        }
    };

    emitter.inc_counter(ingress.name(), ingress.take());
    end
}

#[cfg(test)]
#[path = "subscriber_test.rs"]
mod subscriber_test;
