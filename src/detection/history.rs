//! Rolling history store
//!
//! Bounded per-wallet and per-market sequences built from every processed
//! trade. Rules only read from here; the engine is the only writer.

use super::types::{MarketMetadata, Trade};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Trades per wallet visible to the coordinated-entry check
pub const COORDINATION_LOOKBACK: usize = 5;

/// Outcome records per wallet visible to the conviction check
pub const CONVICTION_LOOKBACK: usize = 20;

/// Capacity limits for the rolling sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryLimits {
    /// Most recent sizes kept per market
    pub size_window: usize,
    /// Most recent prices kept per market
    pub price_window: usize,
    /// Most recent trades kept per wallet (never below the coordination lookback)
    pub wallet_history_cap: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            size_window: 100,
            price_window: 200,
            wallet_history_cap: 500,
        }
    }
}

/// One recorded trade in a wallet's history
#[derive(Debug, Clone, PartialEq)]
pub struct WalletEntry {
    pub timestamp: DateTime<Utc>,
    pub market_question: String,
    pub market_id: String,
    pub size: f64,
    pub value: f64,
    pub price: f64,
    pub outcome: String,
}

/// One observed price in a market's price window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// One entry in a wallet's outcome history
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeEntry {
    pub market_id: String,
    pub outcome: String,
    pub price: f64,
}

/// Size window statistics captured before a trade is appended
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBaseline {
    /// Sizes in the window
    pub samples: usize,
    /// Mean of those sizes
    pub mean: f64,
}

#[derive(Debug)]
struct WalletHistory {
    first_seen: DateTime<Utc>,
    entries: VecDeque<WalletEntry>,
    total_trades: usize,
    question_counts: HashMap<String, usize>,
}

#[derive(Debug, Default)]
struct OutcomeHistory {
    entries: VecDeque<OutcomeEntry>,
    total: usize,
}

/// market id -> outcome -> wallet -> matching entries among the wallet's last few trades
type RecentIndex = HashMap<String, HashMap<String, HashMap<String, usize>>>;

/// Rolling per-wallet and per-market history
#[derive(Debug, Default)]
pub struct HistoryStore {
    limits: HistoryLimits,
    wallets: HashMap<String, WalletHistory>,
    market_sizes: HashMap<String, VecDeque<f64>>,
    market_prices: HashMap<String, VecDeque<PricePoint>>,
    outcomes: HashMap<String, OutcomeHistory>,
    recent: RecentIndex,
    trades_recorded: usize,
}

impl HistoryStore {
    /// Create an empty store with the given limits
    pub fn new(limits: HistoryLimits) -> Self {
        Self {
            limits,
            ..Default::default()
        }
    }

    /// Append a trade to all four sequences
    ///
    /// Returns the market's size window statistics as they were before this
    /// trade's size was appended, or `None` if the window was empty.
    pub fn record_trade(&mut self, trade: &Trade, market: &MarketMetadata) -> Option<SizeBaseline> {
        let baseline = self.size_baseline(&trade.market_id);

        self.push_wallet_entry(trade, market);

        let prices = self.market_prices.entry(trade.market_id.clone()).or_default();
        prices.push_back(PricePoint {
            timestamp: trade.timestamp,
            price: trade.price,
        });
        while prices.len() > self.limits.price_window {
            prices.pop_front();
        }

        let sizes = self.market_sizes.entry(trade.market_id.clone()).or_default();
        sizes.push_back(trade.size);
        while sizes.len() > self.limits.size_window {
            sizes.pop_front();
        }

        let outcomes = self.outcomes.entry(trade.wallet.clone()).or_default();
        outcomes.entries.push_back(OutcomeEntry {
            market_id: trade.market_id.clone(),
            outcome: trade.outcome.clone(),
            price: trade.price,
        });
        outcomes.total += 1;
        while outcomes.entries.len() > CONVICTION_LOOKBACK {
            outcomes.entries.pop_front();
        }

        self.trades_recorded += 1;
        baseline
    }

    fn push_wallet_entry(&mut self, trade: &Trade, market: &MarketMetadata) {
        let cap = self.limits.wallet_history_cap.max(COORDINATION_LOOKBACK);
        let history = self
            .wallets
            .entry(trade.wallet.clone())
            .or_insert_with(|| WalletHistory {
                first_seen: trade.timestamp,
                entries: VecDeque::new(),
                total_trades: 0,
                question_counts: HashMap::new(),
            });

        history.total_trades += 1;
        *history
            .question_counts
            .entry(market.question.clone())
            .or_default() += 1;

        index_insert(&mut self.recent, &trade.market_id, &trade.outcome, &trade.wallet);
        history.entries.push_back(WalletEntry {
            timestamp: trade.timestamp,
            market_question: market.question.clone(),
            market_id: trade.market_id.clone(),
            size: trade.size,
            value: trade.value(),
            price: trade.price,
            outcome: trade.outcome.clone(),
        });

        // The entry just behind the lookback tail stops counting for coordination
        let len = history.entries.len();
        if len > COORDINATION_LOOKBACK {
            let leaving = &history.entries[len - COORDINATION_LOOKBACK - 1];
            index_remove(&mut self.recent, &leaving.market_id, &leaving.outcome, &trade.wallet);
        }

        while history.entries.len() > cap {
            history.entries.pop_front();
        }
    }

    /// Size window statistics for a market
    pub fn size_baseline(&self, market_id: &str) -> Option<SizeBaseline> {
        let sizes = self.market_sizes.get(market_id)?;
        if sizes.is_empty() {
            return None;
        }
        let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
        Some(SizeBaseline {
            samples: sizes.len(),
            mean,
        })
    }

    /// Time since the wallet was first observed, measured at `now`
    ///
    /// `None` if the wallet has never been recorded. Clamped at zero when
    /// `now` precedes the first observation.
    pub fn wallet_age(&self, wallet: &str, now: DateTime<Utc>) -> Option<Duration> {
        let history = self.wallets.get(wallet)?;
        Some((now - history.first_seen).max(Duration::zero()))
    }

    /// Recorded trades for a wallet, oldest first
    pub fn wallet_entries(&self, wallet: &str) -> Option<&VecDeque<WalletEntry>> {
        self.wallets.get(wallet).map(|h| &h.entries)
    }

    /// The wallet's most recent trades used for coordination checks
    pub fn recent_wallet_entries<'a>(&'a self, wallet: &str) -> impl Iterator<Item = &'a WalletEntry> + 'a {
        let entries = self.wallets.get(wallet).map(|h| &h.entries);
        let skip = entries.map_or(0, |e| e.len().saturating_sub(COORDINATION_LOOKBACK));
        entries.into_iter().flat_map(move |e| e.iter().skip(skip))
    }

    /// Lifetime trades recorded for a wallet
    pub fn wallet_trade_count(&self, wallet: &str) -> usize {
        self.wallets.get(wallet).map_or(0, |h| h.total_trades)
    }

    /// Lifetime trades by a wallet on markets with this question
    pub fn question_trade_count(&self, wallet: &str, question: &str) -> usize {
        self.wallets
            .get(wallet)
            .and_then(|h| h.question_counts.get(question))
            .copied()
            .unwrap_or(0)
    }

    /// Wallets with a trade on this market and outcome among their most recent trades
    pub fn wallets_recently_on<'a>(
        &'a self,
        market_id: &str,
        outcome: &str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.recent
            .get(market_id)
            .and_then(|by_outcome| by_outcome.get(outcome))
            .into_iter()
            .flat_map(|wallets| wallets.keys().map(String::as_str))
    }

    /// Size window for a market, oldest first
    pub fn size_window(&self, market_id: &str) -> Option<&VecDeque<f64>> {
        self.market_sizes.get(market_id)
    }

    /// Price window for a market, in insertion order
    pub fn price_window(&self, market_id: &str) -> Option<&VecDeque<PricePoint>> {
        self.market_prices.get(market_id)
    }

    /// Most recent outcome records for a wallet, oldest first
    pub fn outcome_history(&self, wallet: &str) -> Option<&VecDeque<OutcomeEntry>> {
        self.outcomes.get(wallet).map(|h| &h.entries)
    }

    /// Lifetime outcome records for a wallet
    pub fn outcome_count(&self, wallet: &str) -> usize {
        self.outcomes.get(wallet).map_or(0, |h| h.total)
    }

    /// Number of wallets observed
    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }

    /// Number of markets observed
    pub fn market_count(&self) -> usize {
        self.market_sizes.len()
    }

    /// Total trades recorded
    pub fn trades_recorded(&self) -> usize {
        self.trades_recorded
    }

    /// Configured limits
    pub fn limits(&self) -> &HistoryLimits {
        &self.limits
    }
}

fn index_insert(index: &mut RecentIndex, market_id: &str, outcome: &str, wallet: &str) {
    *index
        .entry(market_id.to_string())
        .or_default()
        .entry(outcome.to_string())
        .or_default()
        .entry(wallet.to_string())
        .or_default() += 1;
}

fn index_remove(index: &mut RecentIndex, market_id: &str, outcome: &str, wallet: &str) {
    let Some(by_outcome) = index.get_mut(market_id) else {
        return;
    };
    if let Some(wallets) = by_outcome.get_mut(outcome) {
        if let Some(count) = wallets.get_mut(wallet) {
            *count -= 1;
            if *count == 0 {
                wallets.remove(wallet);
            }
        }
        if wallets.is_empty() {
            by_outcome.remove(outcome);
        }
    }
    if by_outcome.is_empty() {
        index.remove(market_id);
    }
}
