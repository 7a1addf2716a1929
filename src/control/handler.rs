//! Command replies

use super::command::Command;
use super::state::{ControlError, ControlState, INTERVAL_BOUNDS};
use crate::detection::{EngineHandle, EngineStats, ThresholdError, Thresholds};
use crate::dispatch::format::escape_html;
use std::fmt::Write;
use std::sync::Arc;

/// Applies commands to the runtime state and builds the reply text
#[derive(Clone)]
pub struct CommandHandler {
    state: Arc<ControlState>,
    engine: EngineHandle,
}

impl CommandHandler {
    pub fn new(state: Arc<ControlState>, engine: EngineHandle) -> Self {
        Self { state, engine }
    }

    /// Execute a command and return the HTML reply
    pub async fn handle(&self, command: Command) -> String {
        tracing::debug!(?command, "Handling command");
        match command {
            Command::Help => help_text(),
            Command::Pause => {
                self.state.pause();
                "⏸️ Monitoring paused. Use /resume to continue.".to_string()
            }
            Command::Resume => {
                self.state.resume();
                "▶️ Monitoring resumed.".to_string()
            }
            Command::Status => self.status_text().await,
            Command::Interval(Some(secs)) => match self.state.set_interval(secs) {
                Ok(()) => format!("✅ Scan interval set to {} seconds", secs),
                Err(_) => format!(
                    "❌ Interval must be between {} and {} seconds",
                    INTERVAL_BOUNDS.start(),
                    INTERVAL_BOUNDS.end()
                ),
            },
            Command::Interval(None) => format!(
                "Current interval: {}s\nUsage: /interval [seconds]",
                self.state.interval_secs()
            ),
            Command::Thresholds => thresholds_text(&self.state.thresholds()),
            Command::Set(Some((param, raw))) => match self.state.set_threshold(&param, &raw) {
                Ok(value) => format!("✅ Set {} = {}", escape_html(&param), value),
                Err(ControlError::Threshold(ThresholdError::UnknownParameter(_))) => {
                    format!("❌ Unknown parameter: {}", escape_html(&param))
                }
                Err(_) => "❌ Invalid value. Must be a non-negative number.".to_string(),
            },
            Command::Set(None) => "Usage: /set [parameter] [value]".to_string(),
            Command::Stats => self.stats_text().await,
        }
    }

    async fn engine_stats(&self) -> Option<EngineStats> {
        match self.engine.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!(error = %e, "Engine stats unavailable");
                None
            }
        }
    }

    async fn status_text(&self) -> String {
        let status = if self.state.is_paused() {
            "⏸️ Paused"
        } else {
            "▶️ Active"
        };
        let mut text = format!(
            "📊 <b>Sentinel Status</b>\n\nStatus: {}\nScan interval: {}s\n",
            status,
            self.state.interval_secs()
        );
        if let Some(stats) = self.engine_stats().await {
            let _ = writeln!(text, "Wallets tracked: {}", stats.wallets_tracked);
            let _ = writeln!(text, "Markets tracked: {}", stats.markets_tracked);
        }
        let _ = write!(text, "Alerts sent: {}", self.state.alerts_sent());
        text
    }

    async fn stats_text(&self) -> String {
        let Some(stats) = self.engine_stats().await else {
            return "❌ Statistics unavailable".to_string();
        };
        let mut text = format!(
            "📈 <b>Detection Statistics</b>\n\n\
             Total wallets: {}\n\
             Total trades tracked: {}\n\
             Markets monitored: {}\n\
             Trades analyzed: {}\n\
             Duplicates skipped: {}\n\
             Alerts raised: {}\n\
             Alerts sent: {}\n",
            stats.wallets_tracked,
            stats.trades_tracked,
            stats.markets_tracked,
            stats.trades_processed,
            stats.duplicates_skipped,
            stats.alerts_total,
            self.state.alerts_sent(),
        );
        if stats.alerts_total > 0 {
            text.push_str("\n<b>By rule:</b>\n");
            for (kind, count) in stats.alerts_by_kind.iter().filter(|(_, n)| *n > 0) {
                let _ = writeln!(text, "• {}: {}", kind, count);
            }
        }
        text.trim_end().to_string()
    }
}

fn help_text() -> String {
    let mut text = String::from(
        "🤖 <b>Polymarket Sentinel Commands</b>\n\n\
         <b>Control:</b>\n\
         /pause - Pause monitoring\n\
         /resume - Resume monitoring\n\
         /status - Show bot status\n\n\
         <b>Settings:</b>\n\
         /interval [seconds] - Set scan interval\n\
         /thresholds - View current thresholds\n\
         /set [param] [value] - Update threshold\n\n\
         <b>Info:</b>\n\
         /stats - Show detection statistics\n\
         /help - Show this message\n\n\
         <b>Available threshold parameters:</b>",
    );
    for name in Thresholds::NAMES {
        let _ = write!(text, "\n• {}", name);
    }
    text
}

fn thresholds_text(thresholds: &Thresholds) -> String {
    let mut text = String::from("<b>Current Thresholds:</b>\n\n");
    for (name, value) in thresholds.iter() {
        let _ = writeln!(text, "• {}: {}", name, value);
    }
    text.push_str("\nUse /set [param] [value] to change");
    text
}
