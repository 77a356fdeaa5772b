//! Orchestrator
//!
//! The reconcile loop. Every interval: fetch the desired binding
//! universe, ask every adapter what it actually runs, then create and
//! delete until each desired binding runs on `min(replication,
//! adapter_count)` adapters. Passes are serialized by construction - one
//! task, one awaited pass per tick - and each pass works on the snapshot
//! it took at its start.
//!
//! Determinism: adapters keep configuration order, and both the
//! delete-surplus and create-deficit picks walk that order. Unchanged
//! inputs therefore produce unchanged assignments.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use sluice_protocol::adapter::v1::Binding;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use super::adapter_service::AdapterService;
use crate::health::HealthStats;
use crate::ingress::{AppBindings, BindingReader};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

/// Each binding should run on this many adapters (capped by the pool
/// size).
const DEFAULT_REPLICATION_FACTOR: usize = 2;

/// Periodic desired-versus-actual reconciler.
pub struct Orchestrator<R> {
    fetcher: R,
    service: Arc<AdapterService>,
    stats: Arc<HealthStats>,
    interval: Duration,
    replication: usize,
}

impl<R: BindingReader> Orchestrator<R> {
    pub fn new(fetcher: R, service: Arc<AdapterService>, stats: Arc<HealthStats>) -> Self {
        Self {
            fetcher,
            service,
            stats,
            interval: DEFAULT_INTERVAL,
            replication: DEFAULT_REPLICATION_FACTOR,
        }
    }

    /// Set the reconcile interval
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the replication factor
    #[must_use]
    pub fn with_replication_factor(mut self, replication: usize) -> Self {
        self.replication = replication;
        self
    }

    /// Run reconcile passes until cancelled. The first pass fires
    /// immediately.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            replication = self.replication,
            adapters = self.service.adapter_count(),
            "orchestrator starting"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.reconcile().await;
                }
            }
        }

        tracing::info!("orchestrator stopped");
    }

    /// One reconcile pass. A failed fetch aborts the pass without
    /// touching any adapter.
    pub async fn reconcile(&self) {
        let bindings = match self.fetcher.fetch_bindings().await {
            Ok(bindings) => bindings,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch bindings, skipping reconcile pass");
                return;
            }
        };

        let desired = flatten(&bindings);
        self.stats
            .record_desired(distinct_drains(&bindings), desired.len());

        let adapter_count = self.service.adapter_count();
        let mut actual = Vec::with_capacity(adapter_count);
        for idx in 0..adapter_count {
            actual.push(self.service.list_bindings(idx).await);
        }

        // Work over everything either side knows about: desired bindings
        // plus strays that must be torn down.
        let mut universe = desired.clone();
        for set in &actual {
            universe.extend(set.iter().cloned());
        }

        let mut creates = 0usize;
        let mut deletes = 0usize;

        for binding in &universe {
            let want = if desired.contains(binding) {
                self.replication.min(adapter_count)
            } else {
                0
            };

            let hosting: Vec<usize> = (0..adapter_count)
                .filter(|&idx| actual[idx].contains(binding))
                .collect();
            let have = hosting.len();

            if have > want {
                for &idx in hosting.iter().take(have - want) {
                    self.service.delete_binding(idx, binding).await;
                    deletes += 1;
                }
            } else if have < want {
                let mut needed = want - have;
                for idx in 0..adapter_count {
                    if needed == 0 {
                        break;
                    }
                    if !actual[idx].contains(binding) {
                        self.service.create_binding(idx, binding).await;
                        needed -= 1;
                        creates += 1;
                    }
                }
            }
        }

        tracing::debug!(
            desired = desired.len(),
            creates,
            deletes,
            "reconcile pass complete"
        );
    }
}

/// Flatten per-app drain lists into the set of binding tuples.
fn flatten(bindings: &AppBindings) -> HashSet<Binding> {
    let mut set = HashSet::new();
    for (app_id, record) in bindings {
        for drain in &record.drains {
            set.insert(Binding {
                app_id: app_id.clone(),
                hostname: record.hostname.clone(),
                drain: drain.clone(),
            });
        }
    }
    set
}

/// Distinct drain URLs across all apps, for the health counters.
fn distinct_drains(bindings: &AppBindings) -> usize {
    bindings
        .values()
        .flat_map(|record| record.drains.iter())
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod orchestrator_test;
