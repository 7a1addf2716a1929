//! Monitoring loop module
//!
//! Pulls markets and trades from the providers, runs them through the
//! detection engine and hands alerts to dispatch. Cycles never overlap.

mod runner;
mod scanner;

pub use runner::{CycleOutcome, Monitor};
pub use scanner::{ScanLimits, ScanReport, Scanner};
