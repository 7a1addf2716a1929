//! Detection engine
//!
//! Per trade: skip already-handled trades, record the trade into every
//! rolling sequence, run all rules against the updated history, and mark the
//! trade handled. Expired dedup keys are dropped between batches.

use super::dedup::DedupLedger;
use super::history::{HistoryLimits, HistoryStore};
use super::rules::{RuleContext, RULES};
use super::thresholds::Thresholds;
use super::types::{Alert, AlertKind, MarketMetadata, Trade};
use chrono::Duration;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

/// Detection engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Trade failed validation; nothing was recorded
    #[error("Invalid trade: {0}")]
    InvalidTrade(String),
    /// The engine task is no longer running
    #[error("Detection engine stopped")]
    ServiceStopped,
}

/// Snapshot of engine counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStats {
    pub wallets_tracked: usize,
    pub markets_tracked: usize,
    pub trades_tracked: usize,
    pub trades_processed: u64,
    pub duplicates_skipped: u64,
    pub invalid_rejected: u64,
    pub dedup_keys: usize,
    pub alerts_total: u64,
    /// Alerts per kind, in rule order
    pub alerts_by_kind: Vec<(AlertKind, u64)>,
}

#[derive(Debug, Default)]
struct Counters {
    trades_processed: u64,
    duplicates_skipped: u64,
    invalid_rejected: u64,
    alerts_by_kind: [u64; 6],
}

/// Stateful trade analyzer
pub struct DetectionEngine {
    history: HistoryStore,
    ledger: DedupLedger,
    thresholds: watch::Receiver<Thresholds>,
    counters: Counters,
}

impl DetectionEngine {
    /// Create an engine reading live thresholds from `thresholds`
    ///
    /// A `dedup_retention` of `None` keeps every dedup key for the process
    /// lifetime.
    pub fn new(
        limits: HistoryLimits,
        dedup_retention: Option<Duration>,
        thresholds: watch::Receiver<Thresholds>,
    ) -> Self {
        let ledger = match dedup_retention {
            Some(retention) => DedupLedger::with_retention(retention),
            None => DedupLedger::unbounded(),
        };
        Self {
            history: HistoryStore::new(limits),
            ledger,
            thresholds,
            counters: Counters::default(),
        }
    }

    /// Create an engine with fixed thresholds and default limits
    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        // The receiver keeps the last value after the sender is dropped
        let (_tx, rx) = watch::channel(thresholds);
        Self::new(HistoryLimits::default(), None, rx)
    }

    /// Analyze one trade
    ///
    /// Returns every alert raised by the trade. A trade that was already
    /// handled returns no alerts and changes no state.
    pub fn process(
        &mut self,
        trade: &Trade,
        market: &MarketMetadata,
    ) -> Result<Vec<Alert>, EngineError> {
        if let Err(e) = validate(trade, market) {
            self.counters.invalid_rejected += 1;
            return Err(e);
        }

        let key = trade.dedup_key();
        if self.ledger.seen(&key) || self.ledger.is_expired(&trade.market_id, trade.timestamp) {
            self.counters.duplicates_skipped += 1;
            tracing::trace!(key = %key, "Skipping already handled trade");
            return Ok(Vec::new());
        }

        let size_baseline = self.history.record_trade(trade, market);

        let thresholds = *self.thresholds.borrow();
        let ctx = RuleContext {
            trade,
            market,
            history: &self.history,
            size_baseline,
            thresholds: &thresholds,
        };
        let alerts: Vec<Alert> = RULES
            .iter()
            .filter_map(|rule| rule(&ctx))
            .map(|details| Alert::new(trade, market, key.as_str(), details))
            .collect();

        self.ledger.mark_seen(&trade.market_id, key, trade.timestamp);

        self.counters.trades_processed += 1;
        for alert in &alerts {
            self.counters.alerts_by_kind[alert.kind().index()] += 1;
            tracing::debug!(
                kind = %alert.kind(),
                wallet = %alert.wallet,
                market_id = %alert.market_id,
                "Alert raised"
            );
        }

        Ok(alerts)
    }

    /// Drop dedup keys that fell out of retention
    ///
    /// Run after a whole batch, so trades within one page never expire each
    /// other.
    pub fn evict_expired(&mut self) -> usize {
        self.ledger.evict_expired()
    }

    /// Current counters
    pub fn stats(&self) -> EngineStats {
        let alerts_by_kind: Vec<(AlertKind, u64)> = AlertKind::ALL
            .iter()
            .copied()
            .zip(self.counters.alerts_by_kind)
            .collect();
        EngineStats {
            wallets_tracked: self.history.wallet_count(),
            markets_tracked: self.history.market_count(),
            trades_tracked: self.history.trades_recorded(),
            trades_processed: self.counters.trades_processed,
            duplicates_skipped: self.counters.duplicates_skipped,
            invalid_rejected: self.counters.invalid_rejected,
            dedup_keys: self.ledger.len(),
            alerts_total: self.counters.alerts_by_kind.iter().sum(),
            alerts_by_kind,
        }
    }

    /// Number of trades skipped as already handled
    pub fn duplicates_skipped(&self) -> u64 {
        self.counters.duplicates_skipped
    }

    /// Read access to the history store
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Read access to the dedup ledger
    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }
}

fn validate(trade: &Trade, market: &MarketMetadata) -> Result<(), EngineError> {
    if trade.wallet.is_empty() {
        return Err(EngineError::InvalidTrade("empty wallet".to_string()));
    }
    if trade.market_id.is_empty() {
        return Err(EngineError::InvalidTrade("empty market id".to_string()));
    }
    if trade.market_id != market.market_id {
        return Err(EngineError::InvalidTrade(format!(
            "trade market {} does not match metadata {}",
            trade.market_id, market.market_id
        )));
    }
    if !trade.size.is_finite() || trade.size < 0.0 {
        return Err(EngineError::InvalidTrade(format!("size {}", trade.size)));
    }
    if !trade.price.is_finite() || !(0.0..=1.0).contains(&trade.price) {
        return Err(EngineError::InvalidTrade(format!("price {}", trade.price)));
    }
    Ok(())
}
