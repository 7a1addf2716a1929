//! poly-sentinel: Anomalous trading pattern detector for Polymarket
//!
//! This library provides the core components for:
//! - Trade analysis with six detection heuristics over rolling histories
//! - Market discovery via Gamma API
//! - Trade retrieval via the Data API
//! - Alert delivery to Telegram with pacing and retry
//! - Runtime control through chat commands
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod control;
pub mod detection;
pub mod dispatch;
pub mod market;
pub mod monitor;
pub mod telemetry;
pub mod trades;
