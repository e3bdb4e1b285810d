//! Active monitoring loop.
//!
//! # Responsibilities
//! - Probe the target on a fixed interval
//! - Feed each outcome into the state machine
//! - Append every outcome to the probe history

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time;

use crate::health::probe::{Probe, ProbeOutcome};
use crate::health::state::{AlertStateMachine, TransitionResult};
use crate::observability::metrics;
use crate::store::HistoryStore;

/// The single background prober.
pub struct Monitor {
    probe: Arc<dyn Probe>,
    machine: Arc<AlertStateMachine>,
    store: Arc<dyn HistoryStore>,
    interval: Duration,
}

impl Monitor {
    pub fn new(
        probe: Arc<dyn Probe>,
        machine: Arc<AlertStateMachine>,
        store: Arc<dyn HistoryStore>,
        interval: Duration,
    ) -> Self {
        Self {
            probe,
            machine,
            store,
            interval,
        }
    }

    /// Probe, observe, record, sleep; until shutdown.
    ///
    /// Shutdown is only noticed during the sleep, so a cycle in flight
    /// always completes.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            target_addr = %self.probe.target(),
            interval_ms = self.interval.as_millis() as u64,
            "Monitor starting"
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                _ = time::sleep(self.interval) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// One probe cycle without the trailing sleep.
    pub async fn run_cycle(&self) -> TransitionResult {
        let outcome = self.probe.probe().await;
        metrics::record_probe(outcome);

        if outcome == ProbeOutcome::Success {
            tracing::debug!(target_addr = %self.probe.target(), "Connection is healthy");
        }

        let result = self.machine.observe_probe(outcome).await;

        let store = self.store.clone();
        let at = Utc::now();
        match tokio::task::spawn_blocking(move || store.append_record(outcome, at)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!(error = %e, outcome = %outcome, "Failed to record probe result"),
            Err(e) => tracing::error!(error = %e, "Probe record task failed"),
        }

        result
    }
}
