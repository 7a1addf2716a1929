//! Prometheus metrics

use crate::detection::AlertKind;
use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Trades analyzed by the engine
    TradesProcessed,
    /// Trades skipped as already handled
    DuplicateTrades,
    /// Trades rejected by validation
    InvalidTrades,
    /// Failed market or trade fetches
    ProviderErrors,
    /// Alerts delivered to the notifier
    AlertsSent,
    /// Alerts dropped after all delivery attempts
    DeliveryFailures,
    /// Completed scan cycles
    ScanCycles,
    /// Scan cycles skipped while paused
    ScansSkipped,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Wallets with recorded history
    WalletsTracked,
    /// Markets with recorded history
    MarketsTracked,
    /// Keys held by the dedup ledger
    DedupKeys,
    /// Markets returned by the last market fetch
    ActiveMarkets,
}

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Full scan cycle including dispatch
    ScanCycle,
    /// Single provider request
    ProviderRequest,
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::TradesProcessed => "sentinel_trades_processed_total",
        CounterMetric::DuplicateTrades => "sentinel_duplicate_trades_total",
        CounterMetric::InvalidTrades => "sentinel_invalid_trades_total",
        CounterMetric::ProviderErrors => "sentinel_provider_errors_total",
        CounterMetric::AlertsSent => "sentinel_alerts_sent_total",
        CounterMetric::DeliveryFailures => "sentinel_delivery_failures_total",
        CounterMetric::ScanCycles => "sentinel_scan_cycles_total",
        CounterMetric::ScansSkipped => "sentinel_scans_skipped_total",
    }
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    ::metrics::counter!(counter_name(metric)).increment(1);
}

/// Count one raised alert, labelled by kind
pub fn record_alert(kind: AlertKind) {
    ::metrics::counter!("sentinel_alerts_raised_total", "kind" => kind.as_str()).increment(1);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::ScanCycle => "sentinel_scan_duration_seconds",
        LatencyMetric::ProviderRequest => "sentinel_provider_request_seconds",
    };

    ::metrics::histogram!(metric_name).record(duration.as_secs_f64());
    tracing::trace!(
        metric = metric_name,
        value_ms = duration.as_millis() as u64,
        "Recording latency"
    );
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::WalletsTracked => "sentinel_wallets_tracked",
        GaugeMetric::MarketsTracked => "sentinel_markets_tracked",
        GaugeMetric::DedupKeys => "sentinel_dedup_keys",
        GaugeMetric::ActiveMarkets => "sentinel_active_markets",
    };

    ::metrics::gauge!(metric_name).set(value);
}
