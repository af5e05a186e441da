//! Price bars and quotes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A completed OHLC bar as delivered by the terminal.
///
/// Prices are decimal so that the close/average comparison in the signal
/// has no floating-point drift at the equality boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time
    pub timestamp: DateTime<Utc>,
    /// Opening price
    pub open: Decimal,
    /// Highest price
    pub high: Decimal,
    /// Lowest price
    pub low: Decimal,
    /// Closing price
    pub close: Decimal,
    /// Number of ticks in the bar
    pub tick_volume: Decimal,
}

impl Bar {
    /// Create a new bar.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        tick_volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            tick_volume,
        }
    }

    /// Create a bar where every price equals `close`.
    pub fn flat(timestamp: DateTime<Utc>, close: Decimal) -> Self {
        Self::new(timestamp, close, close, close, close, Decimal::ZERO)
    }
}

/// Current best bid/ask for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Symbol
    pub symbol: String,
    /// Best bid price
    pub bid: Decimal,
    /// Best ask price
    pub ask: Decimal,
    /// Quote time
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, bid: Decimal, ask: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            bid,
            ask,
            timestamp,
        }
    }

    /// Get the spread.
    pub fn spread(&self) -> Decimal {
        self.ask.saturating_sub(self.bid)
    }
}
