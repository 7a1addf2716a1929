//! Rule thresholds
//!
//! A flat set of named numeric parameters. The control surface updates them
//! by name at runtime; the engine reads the live values for every trade.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a rejected threshold update
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    /// No threshold with this name
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
    /// Value is not a usable number
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Thresholds for the six detection rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Wallets observed for fewer days than this are fresh
    pub fresh_wallet_days: f64,
    /// Minimum trade value for a fresh-wallet alert
    pub fresh_wallet_min_value: f64,
    /// Size must exceed the market mean by this factor
    pub unusual_size_multiplier: f64,
    /// Markets below this volume count as niche
    pub niche_volume_max: f64,
    /// Trades on one niche market must exceed this count
    pub niche_trades_min: f64,
    /// Extreme-price entries among the last 20 needed for a conviction alert
    pub win_rate_conviction_min: f64,
    /// Minimum trade value for a conviction alert
    pub win_rate_min_value: f64,
    /// Minimum trade value for a pre-move alert
    pub pre_move_min_value: f64,
    /// Absolute price change (0.15 = 15 cents) that counts as a move
    pub pre_move_change_pct: f64,
    /// Minimum trade value for a coordinated-entry alert
    pub coordinated_min_value: f64,
    /// Wallets (including the current one) needed for a coordinated entry
    pub coordinated_min_wallets: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fresh_wallet_days: 7.0,
            fresh_wallet_min_value: 1000.0,
            unusual_size_multiplier: 2.5,
            niche_volume_max: 10_000.0,
            niche_trades_min: 3.0,
            win_rate_conviction_min: 7.0,
            win_rate_min_value: 300.0,
            pre_move_min_value: 500.0,
            pre_move_change_pct: 0.15,
            coordinated_min_value: 200.0,
            coordinated_min_wallets: 3.0,
        }
    }
}

impl Thresholds {
    /// Parameter names in display order
    pub const NAMES: [&'static str; 11] = [
        "fresh_wallet_days",
        "fresh_wallet_min_value",
        "unusual_size_multiplier",
        "niche_volume_max",
        "niche_trades_min",
        "win_rate_conviction_min",
        "win_rate_min_value",
        "pre_move_min_value",
        "pre_move_change_pct",
        "coordinated_min_value",
        "coordinated_min_wallets",
    ];

    fn slot(&mut self, name: &str) -> Option<&mut f64> {
        let slot = match name {
            "fresh_wallet_days" => &mut self.fresh_wallet_days,
            "fresh_wallet_min_value" => &mut self.fresh_wallet_min_value,
            "unusual_size_multiplier" => &mut self.unusual_size_multiplier,
            "niche_volume_max" => &mut self.niche_volume_max,
            "niche_trades_min" => &mut self.niche_trades_min,
            "win_rate_conviction_min" => &mut self.win_rate_conviction_min,
            "win_rate_min_value" => &mut self.win_rate_min_value,
            "pre_move_min_value" => &mut self.pre_move_min_value,
            "pre_move_change_pct" => &mut self.pre_move_change_pct,
            "coordinated_min_value" => &mut self.coordinated_min_value,
            "coordinated_min_wallets" => &mut self.coordinated_min_wallets,
            _ => return None,
        };
        Some(slot)
    }

    /// Look up a threshold by name
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "fresh_wallet_days" => self.fresh_wallet_days,
            "fresh_wallet_min_value" => self.fresh_wallet_min_value,
            "unusual_size_multiplier" => self.unusual_size_multiplier,
            "niche_volume_max" => self.niche_volume_max,
            "niche_trades_min" => self.niche_trades_min,
            "win_rate_conviction_min" => self.win_rate_conviction_min,
            "win_rate_min_value" => self.win_rate_min_value,
            "pre_move_min_value" => self.pre_move_min_value,
            "pre_move_change_pct" => self.pre_move_change_pct,
            "coordinated_min_value" => self.coordinated_min_value,
            "coordinated_min_wallets" => self.coordinated_min_wallets,
            _ => return None,
        };
        Some(value)
    }

    /// Update a threshold by name
    ///
    /// Rejected updates leave every threshold unchanged.
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), ThresholdError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ThresholdError::InvalidValue(value.to_string()));
        }
        let slot = self
            .slot(name)
            .ok_or_else(|| ThresholdError::UnknownParameter(name.to_string()))?;
        *slot = value;
        Ok(())
    }

    /// Parse a raw value and update a threshold by name
    ///
    /// The value is parsed before the name is checked, so a bad number is
    /// reported even for an unknown name.
    pub fn set_from_str(&mut self, name: &str, raw: &str) -> Result<f64, ThresholdError> {
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| ThresholdError::InvalidValue(raw.to_string()))?;
        self.set(name, value)?;
        Ok(value)
    }

    /// Iterate over `(name, value)` pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        Self::NAMES
            .iter()
            .filter_map(move |name| self.get(name).map(|v| (*name, v)))
    }
}
