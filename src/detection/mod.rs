//! Detection module
//!
//! Stateful analysis of executed trades: rolling histories per wallet and
//! per market, six heuristic rules, and a ledger that keeps each trade from
//! being analyzed twice.

mod dedup;
mod engine;
mod history;
pub mod rules;
mod service;
mod thresholds;
mod types;

pub use dedup::DedupLedger;
pub use engine::{DetectionEngine, EngineError, EngineStats};
pub use history::{
    HistoryLimits, HistoryStore, OutcomeEntry, PricePoint, SizeBaseline, WalletEntry,
    CONVICTION_LOOKBACK, COORDINATION_LOOKBACK,
};
pub use service::EngineHandle;
pub use thresholds::{ThresholdError, Thresholds};
pub use types::{Alert, AlertDetails, AlertKind, MarketMetadata, Trade};
