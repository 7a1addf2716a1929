//! Detection rules
//!
//! Six independent heuristics. Each reads the history store after the
//! triggering trade has been recorded and returns at most one alert payload.

use super::history::{HistoryStore, SizeBaseline};
use super::thresholds::Thresholds;
use super::types::{AlertDetails, MarketMetadata, Trade};
use chrono::Duration;

/// Unusual size needs strictly more prior sizes than this
pub const UNUSUAL_SIZE_MIN_SAMPLES: usize = 10;

/// Outcome records a wallet needs before conviction is assessed
pub const CONVICTION_MIN_TRADES: usize = 10;

/// Prices above this count as a conviction entry
pub const CONVICTION_HIGH_PRICE: f64 = 0.8;

/// Prices below this count as a conviction entry
pub const CONVICTION_LOW_PRICE: f64 = 0.2;

/// Pre-move needs strictly more prices than this in the market window
pub const PRE_MOVE_MIN_HISTORY: usize = 10;

/// Pre-move needs at least this many prices inside the lookback
pub const PRE_MOVE_MIN_RECENT: usize = 5;

/// Pre-move lookback in seconds
pub const PRE_MOVE_LOOKBACK_SECS: i64 = 30 * 60;

/// Max distance between trades of a coordinated group, in seconds
pub const COORDINATION_WINDOW_SECS: i64 = 5 * 60;

/// Everything a rule may look at for one trade
pub struct RuleContext<'a> {
    /// Trade being analyzed
    pub trade: &'a Trade,
    /// Metadata of the trade's market
    pub market: &'a MarketMetadata,
    /// History, already including the trade
    pub history: &'a HistoryStore,
    /// Market size window before the trade's size was appended
    pub size_baseline: Option<SizeBaseline>,
    /// Live thresholds
    pub thresholds: &'a Thresholds,
}

/// A detection rule
pub type Rule = fn(&RuleContext<'_>) -> Option<AlertDetails>;

/// All rules in evaluation order
pub const RULES: [Rule; 6] = [
    fresh_wallet_large_bet,
    unusual_size,
    repeat_niche_player,
    high_conviction,
    pre_move_positioning,
    coordinated_entry,
];

/// Large bet from a wallet first observed only recently
pub fn fresh_wallet_large_bet(ctx: &RuleContext<'_>) -> Option<AlertDetails> {
    let trade = ctx.trade;
    let age = ctx.history.wallet_age(&trade.wallet, trade.timestamp)?;
    let age_days = age.num_seconds() as f64 / 86_400.0;
    let value = trade.value();

    if age_days < ctx.thresholds.fresh_wallet_days && value > ctx.thresholds.fresh_wallet_min_value {
        return Some(AlertDetails::FreshWalletLargeBet {
            age_days: age.num_days(),
            value,
        });
    }
    None
}

/// Size far above the market's recent mean, current trade excluded
pub fn unusual_size(ctx: &RuleContext<'_>) -> Option<AlertDetails> {
    let baseline = ctx.size_baseline?;
    if baseline.samples <= UNUSUAL_SIZE_MIN_SAMPLES {
        return None;
    }

    let size = ctx.trade.size;
    if size > baseline.mean * ctx.thresholds.unusual_size_multiplier {
        return Some(AlertDetails::UnusualSize {
            size,
            avg_size: baseline.mean,
        });
    }
    None
}

/// Wallet keeps coming back to a low-volume market
///
/// Markets are matched by question text, and the count includes the
/// current trade.
pub fn repeat_niche_player(ctx: &RuleContext<'_>) -> Option<AlertDetails> {
    let trades_count = ctx
        .history
        .question_trade_count(&ctx.trade.wallet, &ctx.market.question);

    if trades_count as f64 > ctx.thresholds.niche_trades_min
        && ctx.market.volume < ctx.thresholds.niche_volume_max
    {
        return Some(AlertDetails::RepeatNichePlayer {
            trades_count,
            market_volume: ctx.market.volume,
        });
    }
    None
}

/// Wallet that habitually enters at extreme prices
///
/// Measures how often the wallet trades far from 0.5, not whether those
/// trades won.
pub fn high_conviction(ctx: &RuleContext<'_>) -> Option<AlertDetails> {
    let wallet = &ctx.trade.wallet;
    let total_trades = ctx.history.outcome_count(wallet);
    if total_trades < CONVICTION_MIN_TRADES {
        return None;
    }

    let conviction_trades = ctx
        .history
        .outcome_history(wallet)?
        .iter()
        .filter(|e| e.price > CONVICTION_HIGH_PRICE || e.price < CONVICTION_LOW_PRICE)
        .count();

    let value = ctx.trade.value();
    if conviction_trades as f64 >= ctx.thresholds.win_rate_conviction_min
        && value > ctx.thresholds.win_rate_min_value
    {
        return Some(AlertDetails::HighWinRateTrader {
            conviction_trades,
            total_trades,
            current_price: ctx.trade.price,
            value,
        });
    }
    None
}

/// Large entry after the market price moved sharply within the lookback
///
/// The reference price is the first lookback entry in insertion order.
pub fn pre_move_positioning(ctx: &RuleContext<'_>) -> Option<AlertDetails> {
    let trade = ctx.trade;
    let value = trade.value();
    if value <= ctx.thresholds.pre_move_min_value {
        return None;
    }

    let window = ctx.history.price_window(&trade.market_id)?;
    if window.len() <= PRE_MOVE_MIN_HISTORY {
        return None;
    }

    let lookback = Duration::seconds(PRE_MOVE_LOOKBACK_SECS);
    let mut recent = window
        .iter()
        .filter(|p| trade.timestamp - p.timestamp < lookback);
    let oldest = recent.next()?;
    if 1 + recent.count() < PRE_MOVE_MIN_RECENT {
        return None;
    }

    let change = (trade.price - oldest.price).abs();
    if change > ctx.thresholds.pre_move_change_pct {
        return Some(AlertDetails::PreMovePositioning {
            value,
            old_price: oldest.price,
            new_price: trade.price,
            price_change_pct: change * 100.0,
        });
    }
    None
}

/// Several wallets entering the same market outcome within minutes
pub fn coordinated_entry(ctx: &RuleContext<'_>) -> Option<AlertDetails> {
    let trade = ctx.trade;
    let value = trade.value();
    if value <= ctx.thresholds.coordinated_min_value {
        return None;
    }

    let window_ms = COORDINATION_WINDOW_SECS * 1000;
    let others = ctx
        .history
        .wallets_recently_on(&trade.market_id, &trade.outcome)
        .filter(|wallet| *wallet != trade.wallet)
        .filter(|wallet| {
            ctx.history.recent_wallet_entries(wallet).any(|e| {
                e.market_id == trade.market_id
                    && e.outcome == trade.outcome
                    && (trade.timestamp - e.timestamp).num_milliseconds().abs() < window_ms
            })
        })
        .count();

    let wallets = others + 1;
    if wallets as f64 >= ctx.thresholds.coordinated_min_wallets {
        return Some(AlertDetails::CoordinatedEntry {
            wallets,
            outcome: trade.outcome.clone(),
            value,
        });
    }
    None
}
