//! Data API client for executed trades

use super::TradeSource;
use crate::detection::Trade;
use crate::market::FlexNumber;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Data API base URL
pub const DATA_API_URL: &str = "https://data-api.polymarket.com";

const DEFAULT_OUTCOME: &str = "unknown";

/// Configuration for the Data API client
#[derive(Debug, Clone)]
pub struct DataApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for DataApiConfig {
    fn default() -> Self {
        Self {
            base_url: DATA_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Reasons a provider trade record is unusable
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("missing field {0}")]
    Missing(&'static str),
    #[error("unparseable field {0}")]
    Unparseable(&'static str),
    #[error("trade belongs to market {0}")]
    ForeignMarket(String),
}

/// Client for Polymarket's Data API
pub struct DataApiClient {
    config: DataApiConfig,
    client: Client,
}

impl DataApiClient {
    pub fn with_config(config: DataApiConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Fetch recent trades for one market
    pub async fn fetch_market_trades(
        &self,
        market_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Trade>> {
        let url = format!("{}/trades", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("market", market_id.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Data API error: {} - {}", status, body);
        }

        let records: Vec<RawTrade> = response.json().await?;
        Ok(convert_page(records, market_id))
    }
}

#[async_trait]
impl TradeSource for DataApiClient {
    async fn fetch_trades(&self, market_id: &str, limit: usize) -> anyhow::Result<Vec<Trade>> {
        self.fetch_market_trades(market_id, limit).await
    }
}

/// Raw trade record from the Data API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrade {
    proxy_wallet: Option<String>,
    condition_id: Option<String>,
    size: Option<FlexNumber>,
    price: Option<FlexNumber>,
    /// Unix seconds
    timestamp: Option<FlexNumber>,
    outcome: Option<String>,
}

fn convert_page(records: Vec<RawTrade>, market_id: &str) -> Vec<Trade> {
    let received = records.len();
    let trades: Vec<Trade> = records
        .into_iter()
        .filter_map(|raw| match convert_trade(raw, market_id) {
            Ok(trade) => Some(trade),
            Err(e) => {
                tracing::warn!(market_id, error = %e, "Dropping malformed trade record");
                None
            }
        })
        .collect();

    tracing::debug!(market_id, received, usable = trades.len(), "Fetched trades");
    trades
}

fn convert_trade(raw: RawTrade, market_id: &str) -> Result<Trade, RecordError> {
    let wallet = raw
        .proxy_wallet
        .filter(|w| !w.is_empty())
        .ok_or(RecordError::Missing("proxyWallet"))?;

    if let Some(cid) = raw.condition_id.as_deref() {
        if !cid.is_empty() && cid != market_id {
            return Err(RecordError::ForeignMarket(cid.to_string()));
        }
    }

    let size = number(raw.size.as_ref(), "size")?;
    let price = number(raw.price.as_ref(), "price")?;
    let timestamp = parse_timestamp(number(raw.timestamp.as_ref(), "timestamp")?)
        .ok_or(RecordError::Unparseable("timestamp"))?;

    Ok(Trade {
        wallet,
        market_id: market_id.to_string(),
        size,
        price,
        timestamp,
        outcome: raw
            .outcome
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| DEFAULT_OUTCOME.to_string()),
    })
}

fn number(field: Option<&FlexNumber>, name: &'static str) -> Result<f64, RecordError> {
    field
        .ok_or(RecordError::Missing(name))?
        .value()
        .ok_or(RecordError::Unparseable(name))
}

/// Unix seconds, with fractional part kept to the millisecond
fn parse_timestamp(secs: f64) -> Option<DateTime<Utc>> {
    if secs < 0.0 {
        return None;
    }
    Utc.timestamp_millis_opt((secs * 1000.0).round() as i64).single()
}
