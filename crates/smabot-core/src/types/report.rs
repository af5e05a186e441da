//! Per-cycle outcome reports emitted by the trading loop.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{Action, OrderResult, Signal};
use crate::error::BrokerError;

/// What happened when an action was handed to the broker.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// The broker accepted the request and returned a result
    Executed(OrderResult),
    /// The broker call failed
    Failed(BrokerError),
    /// The action was not attempted
    Skipped(String),
}

/// One action together with its execution result.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub action: Action,
    pub result: ExecutionResult,
}

impl ActionOutcome {
    pub fn new(action: Action, result: ExecutionResult) -> Self {
        Self { action, result }
    }

    /// The broker executed the request.
    pub fn succeeded(&self) -> bool {
        matches!(&self.result, ExecutionResult::Executed(r) if r.is_done())
    }

    /// The broker was asked and did not execute the request.
    pub fn failed(&self) -> bool {
        match &self.result {
            ExecutionResult::Executed(r) => !r.is_done(),
            ExecutionResult::Failed(_) => true,
            ExecutionResult::Skipped(_) => false,
        }
    }
}

/// Everything one loop iteration observed, decided and executed.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle number
    pub cycle: u64,
    /// When polling started
    pub started_at: DateTime<Utc>,
    /// Traded symbol
    pub symbol: String,
    /// Open volume on the symbol at the start of the cycle
    pub exposure: Option<Decimal>,
    /// Signal computed this cycle
    pub signal: Option<Signal>,
    /// Actions in execution order
    pub actions: Vec<ActionOutcome>,
    /// Why the cycle stopped short of executing, if it did
    pub skipped: Option<String>,
}

impl CycleReport {
    pub fn new(cycle: u64, symbol: impl Into<String>) -> Self {
        Self {
            cycle,
            started_at: Utc::now(),
            symbol: symbol.into(),
            exposure: None,
            signal: None,
            actions: Vec::new(),
            skipped: None,
        }
    }

    /// Number of actions the broker executed.
    pub fn executed_count(&self) -> usize {
        self.actions.iter().filter(|a| a.succeeded()).count()
    }

    /// Number of actions the broker failed or rejected.
    pub fn failed_count(&self) -> usize {
        self.actions.iter().filter(|a| a.failed()).count()
    }
}
