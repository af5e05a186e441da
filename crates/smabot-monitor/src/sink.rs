//! Cycle reports as log lines.

use smabot_core::traits::CycleSink;
use smabot_core::types::{AccountInfo, CycleReport, ExecutionResult};
use tracing::{info, warn};

/// Writes the loop's status through `tracing`.
///
/// One status line per cycle carrying exposure, last close, average and
/// signal, then one line per executed action.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl CycleSink for TracingSink {
    fn on_startup(&self, broker: &str, account: &AccountInfo) {
        info!(
            broker,
            login = account.login,
            server = %account.server,
            currency = %account.currency,
            balance = %account.balance,
            equity = %account.equity,
            leverage = account.leverage,
            "Logged in"
        );
    }

    fn on_cycle(&self, report: &CycleReport) {
        let exposure = report
            .exposure
            .map(|e| e.to_string())
            .unwrap_or_else(|| "n/a".to_string());

        match &report.signal {
            Some(signal) => info!(
                cycle = report.cycle,
                time = %report.started_at.format("%Y-%m-%d %H:%M:%S"),
                symbol = %report.symbol,
                exposure = %exposure,
                last_close = %signal.last_close,
                sma = %signal.moving_average,
                distance = %signal.distance(),
                signal = %signal.direction,
                "Cycle"
            ),
            None => info!(
                cycle = report.cycle,
                time = %report.started_at.format("%Y-%m-%d %H:%M:%S"),
                symbol = %report.symbol,
                exposure = %exposure,
                "Cycle"
            ),
        }

        if let Some(reason) = &report.skipped {
            warn!(cycle = report.cycle, reason = %reason, "Cycle skipped");
        }

        for outcome in &report.actions {
            match &outcome.result {
                ExecutionResult::Executed(result) if result.is_done() => info!(
                    cycle = report.cycle,
                    action = %outcome.action,
                    ticket = ?result.ticket.map(|t| t.0),
                    volume = %result.volume,
                    price = %result.price,
                    "Order executed"
                ),
                ExecutionResult::Executed(result) => warn!(
                    cycle = report.cycle,
                    action = %outcome.action,
                    status = %result.status,
                    code = ?result.error_code,
                    comment = %result.comment,
                    "Order not executed"
                ),
                ExecutionResult::Failed(e) => warn!(
                    cycle = report.cycle,
                    action = %outcome.action,
                    error = %e,
                    "Order failed"
                ),
                ExecutionResult::Skipped(reason) => warn!(
                    cycle = report.cycle,
                    action = %outcome.action,
                    reason = %reason,
                    "Order skipped"
                ),
            }
        }
    }

    fn on_shutdown(&self, cycles: u64) {
        info!(cycles, "Trading loop stopped");
    }
}
