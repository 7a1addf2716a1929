//! Engine service
//!
//! Runs the detection engine inside a single task. Other tasks talk to it
//! through an [`EngineHandle`], so engine state is never shared directly.

use super::engine::{DetectionEngine, EngineError, EngineStats};
use super::types::{Alert, MarketMetadata, Trade};
use crate::telemetry::{increment, record_alert, set_gauge, CounterMetric, GaugeMetric};
use tokio::sync::{mpsc, oneshot};

enum EngineRequest {
    Process {
        batch: Vec<(Trade, MarketMetadata)>,
        reply: oneshot::Sender<Vec<Alert>>,
    },
    Stats {
        reply: oneshot::Sender<EngineStats>,
    },
}

/// Cloneable handle to the engine task
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Move the engine into a new task and return a handle to it
    ///
    /// The task stops once every handle is dropped.
    pub fn spawn(engine: DetectionEngine) -> Self {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            Self::run(engine, rx).await;
        });
        Self { tx }
    }

    /// Analyze a batch of trades in order and return all raised alerts
    ///
    /// Invalid trades are logged and skipped; they do not affect the rest of
    /// the batch.
    pub async fn process_batch(
        &self,
        batch: Vec<(Trade, MarketMetadata)>,
    ) -> Result<Vec<Alert>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Process { batch, reply })
            .await
            .map_err(|_| EngineError::ServiceStopped)?;
        rx.await.map_err(|_| EngineError::ServiceStopped)
    }

    /// Fetch current engine counters
    pub async fn stats(&self) -> Result<EngineStats, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Stats { reply })
            .await
            .map_err(|_| EngineError::ServiceStopped)?;
        rx.await.map_err(|_| EngineError::ServiceStopped)
    }

    async fn run(mut engine: DetectionEngine, mut rx: mpsc::Receiver<EngineRequest>) {
        while let Some(request) = rx.recv().await {
            match request {
                EngineRequest::Process { batch, reply } => {
                    let alerts = Self::process_all(&mut engine, &batch);
                    engine.evict_expired();
                    let stats = engine.stats();
                    set_gauge(GaugeMetric::WalletsTracked, stats.wallets_tracked as f64);
                    set_gauge(GaugeMetric::MarketsTracked, stats.markets_tracked as f64);
                    set_gauge(GaugeMetric::DedupKeys, stats.dedup_keys as f64);
                    // Caller may have given up waiting; state is already committed
                    let _ = reply.send(alerts);
                }
                EngineRequest::Stats { reply } => {
                    let _ = reply.send(engine.stats());
                }
            }
        }
        tracing::info!("Detection engine stopped");
    }

    fn process_all(engine: &mut DetectionEngine, batch: &[(Trade, MarketMetadata)]) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for (trade, market) in batch {
            let duplicates_before = engine.duplicates_skipped();
            match engine.process(trade, market) {
                Ok(raised) => {
                    if engine.duplicates_skipped() > duplicates_before {
                        increment(CounterMetric::DuplicateTrades);
                    } else {
                        increment(CounterMetric::TradesProcessed);
                    }
                    for alert in &raised {
                        record_alert(alert.kind());
                    }
                    alerts.extend(raised);
                }
                Err(e) => {
                    increment(CounterMetric::InvalidTrades);
                    tracing::warn!(
                        error = %e,
                        wallet = %trade.wallet,
                        market_id = %trade.market_id,
                        "Rejected trade"
                    );
                }
            }
        }
        alerts
    }
}
