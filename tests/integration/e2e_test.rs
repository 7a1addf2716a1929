//! End-to-end integration tests

use poly_sentinel::config::Config;
use poly_sentinel::detection::{HistoryLimits, Thresholds};

#[test]
fn test_config_example_loads() {
    let config = Config::from_toml_str(include_str!("../../config.toml.example")).unwrap();

    assert_eq!(config.thresholds, Thresholds::default());
    assert_eq!(config.history.limits, HistoryLimits::default());
    assert_eq!(config.scan.interval_secs, 60);
    assert_eq!(config.scan.market_limit, 50);
    assert_eq!(config.scan.trade_limit, 20);
    assert_eq!(config.dispatch.max_backoff_ms, 10_000);
    assert!(config.telegram.is_none());
    assert!(config.telemetry.metrics_port.is_none());
}

#[test]
fn test_config_example_file_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, include_str!("../../config.toml.example")).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.provider.gamma_url, "https://gamma-api.polymarket.com");
}
