//! Scan command implementation

use super::run::{build_scanner, spawn_engine};
use crate::config::Config;
use crate::control::ControlState;
use clap::Args;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Number of active markets to scan (defaults to scan.market_limit)
    #[arg(short, long)]
    pub markets: Option<usize>,
}

impl ScanArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let state = ControlState::new(config.scan.interval_secs, config.thresholds);
        let engine = spawn_engine(config, &state);
        let limit = self.markets.unwrap_or(config.scan.market_limit);
        let scanner = build_scanner(config, engine, limit)?;

        let report = scanner.scan_once().await?;
        for alert in &report.alerts {
            println!("{}", serde_json::to_string(alert)?);
        }
        tracing::info!(
            markets = report.markets_scanned,
            trades = report.trades_fetched,
            alerts = report.alerts.len(),
            "Scan finished"
        );
        Ok(())
    }
}
