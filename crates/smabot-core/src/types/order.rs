//! Order requests and terminal order results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Position, PositionSide, Tick, Ticket};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Price this side executes at: buys lift the ask, sells hit the bid.
    pub fn execution_price(&self, tick: &Tick) -> Decimal {
        match self {
            Side::Buy => tick.ask,
            Side::Sell => tick.bid,
        }
    }

    /// Side of the position a fill on this side opens.
    pub fn position_side(&self) -> PositionSide {
        match self {
            Side::Buy => PositionSide::Long,
            Side::Sell => PositionSide::Short,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Time in force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeInForce {
    /// Good til canceled
    #[default]
    #[serde(rename = "gtc")]
    GTC,
    /// Valid for the trading day only
    #[serde(rename = "day")]
    Day,
}

/// How the terminal may fill a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FillPolicy {
    /// Immediate or cancel: fill what is available, drop the rest
    #[default]
    Ioc,
    /// Fill or kill: fill completely or not at all
    Fok,
    /// Leave the remainder working
    Return,
}

/// Market order request.
///
/// Created per decision and consumed immediately by the broker; it keeps no
/// identity after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Symbol to trade
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Volume in lots
    pub volume: Decimal,
    /// Requested price (ask for buys, bid for sells)
    pub price: Decimal,
    /// Maximum acceptable slippage from `price`, in points
    pub deviation: u32,
    /// Position this order closes, if any
    pub closing_position: Option<Ticket>,
    /// Expert identifier stamped on the order
    pub magic: u64,
    /// Free-form order comment
    pub comment: String,
    /// Time in force
    pub time_in_force: TimeInForce,
    /// Filling policy
    pub filling: FillPolicy,
}

impl OrderRequest {
    /// Create a market order priced from the current tick.
    pub fn market(
        symbol: impl Into<String>,
        side: Side,
        volume: Decimal,
        tick: &Tick,
        deviation: u32,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            volume,
            price: side.execution_price(tick),
            deviation,
            closing_position: None,
            magic: 0,
            comment: String::new(),
            time_in_force: TimeInForce::GTC,
            filling: FillPolicy::Ioc,
        }
    }

    /// Create the counter-order that closes `position` in full.
    pub fn close(position: &Position, tick: &Tick, deviation: u32) -> Self {
        let side = position.side.closing_side();
        Self {
            closing_position: Some(position.ticket),
            magic: position.magic,
            ..Self::market(&position.symbol, side, position.volume, tick, deviation)
        }
    }

    /// Set the expert identifier.
    pub fn with_magic(mut self, magic: u64) -> Self {
        self.magic = magic;
        self
    }

    /// Set the order comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Whether this request closes an existing position.
    pub fn is_close(&self) -> bool {
        self.closing_position.is_some()
    }
}

/// Terminal-reported status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Request executed
    Done,
    /// Request accepted and working
    Placed,
    /// Request rejected
    Rejected,
    /// Request cancelled
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Done => write!(f, "done"),
            OrderStatus::Placed => write!(f, "placed"),
            OrderStatus::Rejected => write!(f, "rejected"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of an order submission or position close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    /// Ticket assigned by the terminal
    pub ticket: Option<Ticket>,
    /// Outcome of the request
    pub status: OrderStatus,
    /// Terminal return code when the request did not complete
    pub error_code: Option<u32>,
    /// Executed volume
    pub volume: Decimal,
    /// Executed price
    pub price: Decimal,
    /// Terminal comment
    pub comment: String,
}

impl OrderResult {
    /// A completed execution.
    pub fn done(ticket: Ticket, volume: Decimal, price: Decimal) -> Self {
        Self {
            ticket: Some(ticket),
            status: OrderStatus::Done,
            error_code: None,
            volume,
            price,
            comment: "Request executed".to_string(),
        }
    }

    /// Check if the request was executed.
    pub fn is_done(&self) -> bool {
        self.status == OrderStatus::Done
    }
}
