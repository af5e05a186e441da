//! Core types and traits for the SMA trading bot.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, Tick, Timeframe)
//! - Order, position and account types as reported by the terminal
//! - Trading signals and reconciliation actions
//! - Port traits for the brokerage terminal and its market data feed
//! - The observability sink the trading loop reports through

pub mod types;
pub mod traits;
pub mod error;

pub use error::{TradingError, TradingResult};
pub use types::*;
pub use traits::*;
