//! Market discovery module
//!
//! Lists active markets and their metadata via the Gamma API

mod gamma;

pub use gamma::{GammaClient, GammaConfig, GAMMA_API_URL};

use crate::detection::MarketMetadata;
use async_trait::async_trait;
use serde::Deserialize;

/// Source of active market metadata
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetch up to `limit` active, unclosed markets in provider order
    async fn fetch_active_markets(&self, limit: usize) -> anyhow::Result<Vec<MarketMetadata>>;
}

/// Numeric field that providers send either as a JSON number or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum FlexNumber {
    Number(f64),
    Text(String),
}

impl FlexNumber {
    pub(crate) fn value(&self) -> Option<f64> {
        let value = match self {
            FlexNumber::Number(n) => Some(*n),
            FlexNumber::Text(s) => s.trim().parse::<f64>().ok(),
        };
        value.filter(|v| v.is_finite())
    }
}
