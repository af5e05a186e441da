//! Observability sink the trading loop reports through.

use crate::types::{AccountInfo, CycleReport};

/// Receives the loop's status instead of it writing to the console.
pub trait CycleSink: Send + Sync {
    /// Called once after the broker session is open.
    fn on_startup(&self, broker: &str, account: &AccountInfo);

    /// Called at the end of every cycle, whether or not anything executed.
    fn on_cycle(&self, report: &CycleReport);

    /// Called once when the loop stops.
    fn on_shutdown(&self, _cycles: u64) {}
}
