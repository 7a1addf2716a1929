//! Gamma API client for market discovery
//!
//! Fetches active markets from Polymarket's Gamma API and converts them into
//! the metadata the detection engine needs.

use super::{FlexNumber, MarketSource};
use crate::detection::MarketMetadata;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Gamma API base URL
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// Configuration for the Gamma client
#[derive(Debug, Clone)]
pub struct GammaConfig {
    /// Base URL for the Gamma API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: GAMMA_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for Polymarket's Gamma API
pub struct GammaClient {
    config: GammaConfig,
    client: Client,
}

impl GammaClient {
    /// Create a new client with custom configuration
    pub fn with_config(config: GammaConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Fetch active markets
    pub async fn fetch_markets(&self, limit: usize) -> anyhow::Result<Vec<MarketMetadata>> {
        let url = format!("{}/markets", self.config.base_url);

        tracing::debug!(url = %url, limit, "Fetching active markets from Gamma API");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("limit", limit.to_string()),
                ("active", "true".to_string()),
                ("closed", "false".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gamma API error: {} - {}", status, body);
        }

        let gamma_markets: Vec<GammaMarket> = response.json().await?;
        let received = gamma_markets.len();
        let markets: Vec<MarketMetadata> = gamma_markets
            .into_iter()
            .filter_map(convert_to_metadata)
            .collect();

        tracing::debug!(
            received,
            usable = markets.len(),
            "Fetched active markets"
        );

        Ok(markets)
    }
}

#[async_trait]
impl MarketSource for GammaClient {
    async fn fetch_active_markets(&self, limit: usize) -> anyhow::Result<Vec<MarketMetadata>> {
        self.fetch_markets(limit).await
    }
}

/// Raw market response from Gamma API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarket {
    /// Condition ID for the market
    condition_id: Option<String>,
    /// Market question
    question: Option<String>,
    /// Lifetime volume
    volume: Option<FlexNumber>,
    volume_num: Option<FlexNumber>,
    #[serde(rename = "volume24hr")]
    volume_24hr: Option<FlexNumber>,
}

/// Convert a GammaMarket to market metadata
///
/// Markets without a condition id are dropped.
fn convert_to_metadata(gamma: GammaMarket) -> Option<MarketMetadata> {
    let market_id = gamma.condition_id.filter(|id| !id.is_empty())?;

    let volume = [&gamma.volume, &gamma.volume_num, &gamma.volume_24hr]
        .into_iter()
        .flatten()
        .find_map(FlexNumber::value)
        .unwrap_or(0.0);

    Some(MarketMetadata {
        market_id,
        question: gamma.question.unwrap_or_default(),
        volume,
    })
}
