//! Trade retrieval module
//!
//! Pulls recent executed trades per market from the Polymarket Data API

mod data_api;

pub use data_api::{DataApiClient, DataApiConfig, DATA_API_URL};

use crate::detection::Trade;
use async_trait::async_trait;

/// Source of recent trades for a market
#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Fetch up to `limit` recent trades on a market, in provider order
    ///
    /// Malformed records are dropped; the rest of the page is still returned.
    async fn fetch_trades(&self, market_id: &str, limit: usize) -> anyhow::Result<Vec<Trade>>;
}
