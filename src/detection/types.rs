//! Detection types
//!
//! Inputs (trades and market metadata) and outputs (alerts) of the
//! detection engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single executed trade on a market contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Trading identity (wallet address)
    pub wallet: String,
    /// Market condition identifier
    pub market_id: String,
    /// Number of outcome tokens traded
    pub size: f64,
    /// Execution price (0.0 to 1.0)
    pub price: f64,
    /// Execution time
    pub timestamp: DateTime<Utc>,
    /// Outcome label (e.g., "Yes", "No")
    pub outcome: String,
}

impl Trade {
    /// Notional value of the trade (size × price)
    pub fn value(&self) -> f64 {
        self.size * self.price
    }

    /// Identity of this trade for deduplication
    ///
    /// Wallet, market and timestamp joined with `_`. Every rule that fires on
    /// this trade shares the key.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.wallet,
            self.market_id,
            self.timestamp.to_rfc3339()
        )
    }
}

/// Market metadata as reported by the market source for one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMetadata {
    /// Market condition identifier
    pub market_id: String,
    /// Human-readable market question
    pub question: String,
    /// Market volume reported by the source
    pub volume: f64,
}

/// Alert categories, one per detection rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// New wallet placing a large bet
    FreshWalletLargeBet,
    /// Trade size far above the market's recent average
    UnusualSize,
    /// Wallet repeatedly trading a low-volume market
    RepeatNichePlayer,
    /// Wallet that keeps entering at extreme prices
    HighWinRateTrader,
    /// Large entry right after a sharp price move
    PreMovePositioning,
    /// Several wallets entering the same outcome together
    CoordinatedEntry,
}

impl AlertKind {
    /// All kinds in rule evaluation order
    pub const ALL: [AlertKind; 6] = [
        AlertKind::FreshWalletLargeBet,
        AlertKind::UnusualSize,
        AlertKind::RepeatNichePlayer,
        AlertKind::HighWinRateTrader,
        AlertKind::PreMovePositioning,
        AlertKind::CoordinatedEntry,
    ];

    /// Position in rule evaluation order
    pub fn index(&self) -> usize {
        match self {
            AlertKind::FreshWalletLargeBet => 0,
            AlertKind::UnusualSize => 1,
            AlertKind::RepeatNichePlayer => 2,
            AlertKind::HighWinRateTrader => 3,
            AlertKind::PreMovePositioning => 4,
            AlertKind::CoordinatedEntry => 5,
        }
    }

    /// Stable identifier, also used as a metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::FreshWalletLargeBet => "FRESH_WALLET_LARGE_BET",
            AlertKind::UnusualSize => "UNUSUAL_SIZE",
            AlertKind::RepeatNichePlayer => "REPEAT_NICHE_PLAYER",
            AlertKind::HighWinRateTrader => "HIGH_WIN_RATE_TRADER",
            AlertKind::PreMovePositioning => "PRE_MOVE_POSITIONING",
            AlertKind::CoordinatedEntry => "COORDINATED_ENTRY",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule-specific alert payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertDetails {
    FreshWalletLargeBet {
        /// Whole days since the wallet was first observed
        age_days: i64,
        value: f64,
    },
    UnusualSize {
        size: f64,
        /// Mean size of the market window, excluding this trade
        avg_size: f64,
    },
    RepeatNichePlayer {
        /// Trades by this wallet on the market question, including this one
        trades_count: usize,
        market_volume: f64,
    },
    HighWinRateTrader {
        /// Extreme-price entries among the wallet's recent trades
        conviction_trades: usize,
        /// Lifetime trades observed for the wallet
        total_trades: usize,
        current_price: f64,
        value: f64,
    },
    PreMovePositioning {
        value: f64,
        old_price: f64,
        new_price: f64,
        /// Absolute price change in percentage points
        price_change_pct: f64,
    },
    CoordinatedEntry {
        /// Wallets in the group, including the triggering one
        wallets: usize,
        outcome: String,
        value: f64,
    },
}

impl AlertDetails {
    /// Kind of alert carried by these details
    pub fn kind(&self) -> AlertKind {
        match self {
            AlertDetails::FreshWalletLargeBet { .. } => AlertKind::FreshWalletLargeBet,
            AlertDetails::UnusualSize { .. } => AlertKind::UnusualSize,
            AlertDetails::RepeatNichePlayer { .. } => AlertKind::RepeatNichePlayer,
            AlertDetails::HighWinRateTrader { .. } => AlertKind::HighWinRateTrader,
            AlertDetails::PreMovePositioning { .. } => AlertKind::PreMovePositioning,
            AlertDetails::CoordinatedEntry { .. } => AlertKind::CoordinatedEntry,
        }
    }
}

/// An emitted alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert identifier
    pub id: Uuid,
    /// Wallet that placed the triggering trade
    pub wallet: String,
    /// Market of the triggering trade
    pub market_id: String,
    /// Market question for display
    pub market_question: String,
    /// Identity of the triggering trade
    pub dedup_key: String,
    /// Timestamp of the triggering trade
    pub trade_timestamp: DateTime<Utc>,
    /// When the alert was generated
    pub detected_at: DateTime<Utc>,
    /// Rule-specific payload
    pub details: AlertDetails,
}

impl Alert {
    /// Create a new alert for a trade
    pub fn new(
        trade: &Trade,
        market: &MarketMetadata,
        dedup_key: impl Into<String>,
        details: AlertDetails,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet: trade.wallet.clone(),
            market_id: trade.market_id.clone(),
            market_question: market.question.clone(),
            dedup_key: dedup_key.into(),
            trade_timestamp: trade.timestamp,
            detected_at: Utc::now(),
            details,
        }
    }

    /// Kind of this alert
    pub fn kind(&self) -> AlertKind {
        self.details.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> Trade {
        Trade {
            wallet: "0xabc".to_string(),
            market_id: "0xmarket".to_string(),
            size: 200.0,
            price: 0.25,
            timestamp: Utc.with_ymd_and_hms(2024, 11, 5, 12, 0, 0).unwrap(),
            outcome: "Yes".to_string(),
        }
    }

    #[test]
    fn test_trade_value() {
        assert_eq!(sample_trade().value(), 50.0);
    }

    #[test]
    fn test_dedup_key_joins_wallet_market_timestamp() {
        let key = sample_trade().dedup_key();
        assert_eq!(key, "0xabc_0xmarket_2024-11-05T12:00:00+00:00");
    }

    #[test]
    fn test_dedup_key_ignores_size_and_outcome() {
        let a = sample_trade();
        let mut b = sample_trade();
        b.size = 9999.0;
        b.outcome = "No".to_string();
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_alert_kind_from_details() {
        let details = AlertDetails::CoordinatedEntry {
            wallets: 3,
            outcome: "Yes".to_string(),
            value: 500.0,
        };
        assert_eq!(details.kind(), AlertKind::CoordinatedEntry);
    }

    #[test]
    fn test_alert_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&AlertKind::HighWinRateTrader).unwrap();
        assert_eq!(json, "\"HIGH_WIN_RATE_TRADER\"");
        assert_eq!(AlertKind::HighWinRateTrader.to_string(), "HIGH_WIN_RATE_TRADER");
    }

    #[test]
    fn test_alert_serializes_tagged_details() {
        let trade = sample_trade();
        let market = MarketMetadata {
            market_id: trade.market_id.clone(),
            question: "Will it rain?".to_string(),
            volume: 1200.0,
        };
        let alert = Alert::new(
            &trade,
            &market,
            trade.dedup_key(),
            AlertDetails::UnusualSize {
                size: 200.0,
                avg_size: 20.0,
            },
        );

        let json: serde_json::Value = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["details"]["type"], "UNUSUAL_SIZE");
        assert_eq!(json["market_question"], "Will it rain?");
        assert_eq!(alert.kind(), AlertKind::UnusualSize);
    }
}
