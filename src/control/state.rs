//! Shared runtime settings
//!
//! Written by the command path, read live by the scan loop and the engine.

use crate::detection::{ThresholdError, Thresholds};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Allowed scan interval, in seconds
pub const INTERVAL_BOUNDS: RangeInclusive<u64> = 10..=600;

/// Control surface errors
#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("Interval must be between {min} and {max} seconds, got {got}")]
    IntervalOutOfRange { got: u64, min: u64, max: u64 },
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
}

/// Pause flag, scan interval, thresholds and delivery counter
#[derive(Debug)]
pub struct ControlState {
    paused: AtomicBool,
    interval_secs: AtomicU64,
    alerts_sent: AtomicU64,
    thresholds: watch::Sender<Thresholds>,
}

impl ControlState {
    /// Create state with the given interval (clamped into bounds) and thresholds
    pub fn new(interval_secs: u64, thresholds: Thresholds) -> Self {
        let clamped = interval_secs.clamp(*INTERVAL_BOUNDS.start(), *INTERVAL_BOUNDS.end());
        if clamped != interval_secs {
            tracing::warn!(
                configured = interval_secs,
                used = clamped,
                "Scan interval outside allowed bounds"
            );
        }
        let (thresholds, _) = watch::channel(thresholds);
        Self {
            paused: AtomicBool::new(false),
            interval_secs: AtomicU64::new(clamped),
            alerts_sent: AtomicU64::new(0),
            thresholds,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
        tracing::info!("Monitoring paused");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
        tracing::info!("Monitoring resumed");
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs.load(Ordering::Relaxed)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs())
    }

    /// Change the scan interval; out-of-range values leave it unchanged
    pub fn set_interval(&self, secs: u64) -> Result<(), ControlError> {
        if !INTERVAL_BOUNDS.contains(&secs) {
            return Err(ControlError::IntervalOutOfRange {
                got: secs,
                min: *INTERVAL_BOUNDS.start(),
                max: *INTERVAL_BOUNDS.end(),
            });
        }
        self.interval_secs.store(secs, Ordering::Relaxed);
        tracing::info!(interval_secs = secs, "Scan interval changed");
        Ok(())
    }

    /// Current thresholds
    pub fn thresholds(&self) -> Thresholds {
        *self.thresholds.borrow()
    }

    /// Receiver that always sees the latest thresholds
    pub fn subscribe_thresholds(&self) -> watch::Receiver<Thresholds> {
        self.thresholds.subscribe()
    }

    /// Update one threshold from its textual value
    ///
    /// Published to the engine only when valid. Returns the stored value.
    pub fn set_threshold(&self, name: &str, raw: &str) -> Result<f64, ControlError> {
        let mut updated = self.thresholds();
        let value = updated.set_from_str(name, raw)?;
        self.thresholds.send_replace(updated);
        tracing::info!(parameter = name, value, "Threshold changed");
        Ok(value)
    }

    /// Add delivered alerts to the running total
    pub fn record_sent(&self, delivered: usize) {
        self.alerts_sent
            .fetch_add(delivered as u64, Ordering::Relaxed);
    }

    pub fn alerts_sent(&self) -> u64 {
        self.alerts_sent.load(Ordering::Relaxed)
    }
}
