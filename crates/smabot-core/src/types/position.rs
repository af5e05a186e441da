//! Position and account types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Side;

/// Terminal-assigned identifier of a position or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// Order side that opens a position of this side.
    pub fn opening_side(&self) -> Side {
        match self {
            PositionSide::Long => Side::Buy,
            PositionSide::Short => Side::Sell,
        }
    }

    /// Order side of the counter-order that closes a position of this side.
    pub fn closing_side(&self) -> Side {
        self.opening_side().opposite()
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// An open position as reported by the terminal.
///
/// The bot only observes positions; the broker owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Terminal ticket
    pub ticket: Ticket,
    /// Symbol
    pub symbol: String,
    /// Long or short
    pub side: PositionSide,
    /// Open volume in lots (always positive)
    pub volume: Decimal,
    /// Entry price
    pub open_price: Decimal,
    /// When the position was opened
    pub opened_at: DateTime<Utc>,
    /// Expert identifier of the order that opened it
    pub magic: u64,
}

impl Position {
    /// Create a new position opened now.
    pub fn new(
        ticket: Ticket,
        symbol: impl Into<String>,
        side: PositionSide,
        volume: Decimal,
        open_price: Decimal,
    ) -> Self {
        Self {
            ticket,
            symbol: symbol.into(),
            side,
            volume,
            open_price,
            opened_at: Utc::now(),
            magic: 0,
        }
    }

    /// Check if this is a long position.
    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    /// Check if this is a short position.
    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    /// Floating profit at `price`, in quote currency per unit lot.
    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        match self.side {
            PositionSide::Long => (price - self.open_price) * self.volume,
            PositionSide::Short => (self.open_price - price) * self.volume,
        }
    }
}

/// Trading account snapshot reported by the terminal after login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account number
    pub login: u64,
    /// Trade server name
    pub server: String,
    /// Deposit currency
    pub currency: String,
    /// Balance
    pub balance: Decimal,
    /// Equity (balance plus floating profit)
    pub equity: Decimal,
    /// Account leverage
    pub leverage: u32,
}
