//! Loop configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use smabot_core::types::Timeframe;
use std::fmt;
use std::time::Duration;

/// Which positions block a new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenGate {
    /// Only positions on the traded symbol
    #[default]
    Symbol,
    /// Any position on the account
    Account,
}

impl fmt::Display for OpenGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenGate::Symbol => write!(f, "symbol"),
            OpenGate::Account => write!(f, "account"),
        }
    }
}

/// Immutable settings for one trading loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopConfig {
    /// Traded symbol
    pub symbol: String,
    /// Bar timeframe
    pub timeframe: Timeframe,
    /// Number of completed bars averaged by the signal
    pub sma_period: usize,
    /// Lots per new position
    pub volume: Decimal,
    /// Accepted slippage in points
    pub deviation: u32,
    /// Expert identifier stamped on orders
    pub magic: u64,
    /// Comment stamped on orders
    pub comment: String,
    /// Pause between cycles
    pub poll_interval: Duration,
    /// Limit on every port call, `None` waits indefinitely
    pub call_timeout: Option<Duration>,
    pub open_gate: OpenGate,
    /// Stop after this many cycles
    pub max_cycles: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            symbol: "EURUSD".to_string(),
            timeframe: Timeframe::M1,
            sma_period: 10,
            volume: dec!(1.0),
            deviation: 20,
            magic: 100,
            comment: "smabot".to_string(),
            poll_interval: Duration::from_secs(1),
            call_timeout: Some(Duration::from_secs(5)),
            open_gate: OpenGate::Symbol,
            max_cycles: None,
        }
    }
}
