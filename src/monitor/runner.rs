//! Scan loop

use super::scanner::{ScanReport, Scanner};
use crate::control::ControlState;
use crate::dispatch::format::{STARTUP_MESSAGE, STOP_MESSAGE};
use crate::dispatch::{DeliveryReport, Dispatcher};
use crate::telemetry::{increment, record_latency, CounterMetric, LatencyMetric};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;

/// Outcome of one loop iteration
#[derive(Debug)]
pub enum CycleOutcome {
    /// Scanning is paused; nothing was fetched
    Paused,
    Completed {
        report: ScanReport,
        delivery: DeliveryReport,
    },
}

/// Runs scan cycles back to back with the live interval between them
pub struct Monitor {
    scanner: Scanner,
    dispatcher: Dispatcher,
    state: Arc<ControlState>,
}

impl Monitor {
    pub fn new(scanner: Scanner, dispatcher: Dispatcher, state: Arc<ControlState>) -> Self {
        Self {
            scanner,
            dispatcher,
            state,
        }
    }

    /// Scan once and deliver the resulting alerts, unless paused
    pub async fn run_cycle(&self) -> anyhow::Result<CycleOutcome> {
        if self.state.is_paused() {
            increment(CounterMetric::ScansSkipped);
            tracing::debug!("Scan skipped while paused");
            return Ok(CycleOutcome::Paused);
        }

        let started = Instant::now();
        let report = self.scanner.scan_once().await?;
        let delivery = self.dispatcher.dispatch(&report.alerts).await;
        self.state.record_sent(delivery.delivered);

        increment(CounterMetric::ScanCycles);
        record_latency(LatencyMetric::ScanCycle, started.elapsed());
        if delivery.failed > 0 {
            tracing::warn!(failed = delivery.failed, "Some alerts were not delivered");
        }
        Ok(CycleOutcome::Completed { report, delivery })
    }

    /// Run until `shutdown` resolves
    ///
    /// Sends the startup notice first and the stop notice last. Shutdown
    /// interrupts a cycle or sleep in progress.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        if let Err(e) = self.dispatcher.send(STARTUP_MESSAGE).await {
            tracing::warn!(error = %e, "Failed to send startup notice");
        }
        tracing::info!(interval_secs = self.state.interval_secs(), "Monitoring started");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Received shutdown signal");
                    break;
                }
                _ = self.cycle_then_sleep() => {}
            }
        }

        if let Err(e) = self.dispatcher.send(STOP_MESSAGE).await {
            tracing::warn!(error = %e, "Failed to send stop notice");
        }
        tracing::info!("Monitoring stopped");
    }

    async fn cycle_then_sleep(&self) {
        if let Err(e) = self.run_cycle().await {
            tracing::error!(error = %e, "Scan cycle failed");
        }
        // Read after the cycle so an interval change applies to this sleep
        sleep(self.state.interval()).await;
    }
}
