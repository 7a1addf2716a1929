//! Single scan cycle

use crate::detection::{Alert, EngineHandle};
use crate::market::MarketSource;
use crate::telemetry::{increment, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric};
use crate::trades::TradeSource;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Limits for one scan cycle
#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    pub market_limit: usize,
    pub trade_limit: usize,
    /// Upper bound on any single provider call
    pub request_timeout: Duration,
}

/// What one scan cycle did
#[derive(Debug, Default)]
pub struct ScanReport {
    pub markets_scanned: usize,
    pub markets_failed: usize,
    pub trades_fetched: usize,
    pub alerts: Vec<Alert>,
}

/// Fetches markets and trades and feeds them to the engine
#[derive(Clone)]
pub struct Scanner {
    markets: Arc<dyn MarketSource>,
    trades: Arc<dyn TradeSource>,
    engine: EngineHandle,
    limits: ScanLimits,
}

impl Scanner {
    pub fn new(
        markets: Arc<dyn MarketSource>,
        trades: Arc<dyn TradeSource>,
        engine: EngineHandle,
        limits: ScanLimits,
    ) -> Self {
        Self {
            markets,
            trades,
            engine,
            limits,
        }
    }

    /// Run one cycle over the active markets
    ///
    /// A failed market list fails the cycle. A failed trade fetch skips only
    /// that market.
    pub async fn scan_once(&self) -> anyhow::Result<ScanReport> {
        let markets = self
            .bounded(self.markets.fetch_active_markets(self.limits.market_limit))
            .await
            .inspect_err(|_| increment(CounterMetric::ProviderErrors))?;
        set_gauge(GaugeMetric::ActiveMarkets, markets.len() as f64);

        let mut report = ScanReport::default();
        for market in markets {
            let trades = match self
                .bounded(self.trades.fetch_trades(&market.market_id, self.limits.trade_limit))
                .await
            {
                Ok(trades) => trades,
                Err(e) => {
                    increment(CounterMetric::ProviderErrors);
                    report.markets_failed += 1;
                    tracing::warn!(
                        error = %e,
                        market_id = %market.market_id,
                        "Skipping market after failed trade fetch"
                    );
                    continue;
                }
            };

            report.markets_scanned += 1;
            report.trades_fetched += trades.len();
            let batch = trades
                .into_iter()
                .map(|trade| (trade, market.clone()))
                .collect();
            report.alerts.extend(self.engine.process_batch(batch).await?);
        }

        tracing::info!(
            markets = report.markets_scanned,
            failed = report.markets_failed,
            trades = report.trades_fetched,
            alerts = report.alerts.len(),
            "Scan cycle complete"
        );
        Ok(report)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        let started = Instant::now();
        let result = match timeout(self.limits.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "Provider request timed out after {:?}",
                self.limits.request_timeout
            )),
        };
        record_latency(LatencyMetric::ProviderRequest, started.elapsed());
        result
    }
}
