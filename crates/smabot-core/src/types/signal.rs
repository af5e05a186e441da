//! Trading signals and the actions reconciliation derives from them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PositionSide, Ticket};

/// Directional bias of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
    Flat,
}

impl Direction {
    /// Position side this direction wants to hold, if any.
    pub fn target_side(&self) -> Option<PositionSide> {
        match self {
            Direction::Buy => Some(PositionSide::Long),
            Direction::Sell => Some(PositionSide::Short),
            Direction::Flat => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Sell => write!(f, "sell"),
            Direction::Flat => write!(f, "flat"),
        }
    }
}

/// SMA signal computed from one window of completed bars.
///
/// Recomputed every cycle and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Buy, sell or flat
    pub direction: Direction,
    /// Close of the most recent completed bar
    pub last_close: Decimal,
    /// Mean close over the window
    pub moving_average: Decimal,
    /// Number of bars averaged
    pub window: usize,
    /// Open time of the most recent bar
    pub bar_time: DateTime<Utc>,
}

impl Signal {
    /// Distance of the last close from the average.
    pub fn distance(&self) -> Decimal {
        self.last_close.saturating_sub(self.moving_average)
    }
}

/// A single reconciliation decision for the broker to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Close the position with this ticket in full
    ClosePosition { ticket: Ticket },
    /// Open a new position
    OpenPosition { side: PositionSide, volume: Decimal },
}

impl Action {
    pub fn is_close(&self) -> bool {
        matches!(self, Action::ClosePosition { .. })
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Action::OpenPosition { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ClosePosition { ticket } => write!(f, "close {}", ticket),
            Action::OpenPosition { side, volume } => write!(f, "open {} {}", side, volume),
        }
    }
}
