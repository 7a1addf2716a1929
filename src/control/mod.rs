//! Control surface module
//!
//! Chat commands that pause and resume scanning, change the scan interval
//! and thresholds at runtime, and report status.

mod command;
mod handler;
mod listener;
mod state;

pub use command::Command;
pub use handler::CommandHandler;
pub use listener::{CommandListener, UpdateSource};
pub use state::{ControlError, ControlState, INTERVAL_BOUNDS};
