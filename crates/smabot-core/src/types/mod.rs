//! Core data types for the trading bot.

mod ohlcv;
mod order;
mod position;
mod report;
mod signal;
mod timeframe;

pub use ohlcv::{Bar, Tick};
pub use order::{FillPolicy, OrderRequest, OrderResult, OrderStatus, Side, TimeInForce};
pub use position::{AccountInfo, Position, PositionSide, Ticket};
pub use report::{ActionOutcome, CycleReport, ExecutionResult};
pub use signal::{Action, Direction, Signal};
pub use timeframe::Timeframe;
