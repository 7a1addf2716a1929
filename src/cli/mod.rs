//! CLI interface for poly-sentinel
//!
//! Provides subcommands for:
//! - `run`: Continuous monitoring with alert delivery and chat commands
//! - `scan`: One scan cycle, alerts printed as JSON lines
//! - `thresholds`: Show the configured detection thresholds
//! - `config`: Show the effective configuration

mod run;
mod scan;

pub use run::RunArgs;
pub use scan::ScanArgs;

use crate::config::Config;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "poly-sentinel")]
#[command(about = "Anomalous trading pattern detector for Polymarket prediction markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor markets continuously
    Run(RunArgs),
    /// Run a single scan cycle
    Scan(ScanArgs),
    /// Show detection thresholds
    Thresholds,
    /// Show effective configuration
    Config,
}

/// Render the thresholds table
pub fn thresholds_report(config: &Config) -> String {
    config
        .thresholds
        .iter()
        .map(|(name, value)| format!("  {:<26}{}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the configuration summary; never prints the bot token
pub fn config_report(config: &Config) -> String {
    let telegram = match config.telegram() {
        Some(t) => format!("chat {}", t.chat_id),
        None => "disabled (alerts are logged)".to_string(),
    };
    let retention = match config.history.dedup_retention() {
        Some(r) => format!("{}h", r.num_hours()),
        None => "unbounded".to_string(),
    };
    let metrics = match config.telemetry.metrics_port {
        Some(port) => format!("port {}", port),
        None => "disabled".to_string(),
    };
    [
        format!("  Gamma API: {}", config.provider.gamma_url),
        format!("  Data API: {}", config.provider.data_api_url),
        format!(
            "  Scan: every {}s, {} markets x {} trades",
            config.scan.interval_secs, config.scan.market_limit, config.scan.trade_limit
        ),
        format!(
            "  History: size {}, price {}, wallet {}, dedup retention {}",
            config.history.limits.size_window,
            config.history.limits.price_window,
            config.history.limits.wallet_history_cap,
            retention
        ),
        format!(
            "  Dispatch: {} attempts, pace {}ms",
            config.dispatch.max_attempts, config.dispatch.pace_ms
        ),
        format!("  Telegram: {}", telegram),
        format!("  Metrics: {}", metrics),
    ]
    .join("\n")
}
