//! Trading loop for the SMA bot.
//!
//! Wires the signal engine and reconciler to the broker and market data
//! ports and runs them on a fixed polling interval.

mod config;
mod shutdown;
mod trading_loop;

pub use config::{LoopConfig, OpenGate};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};
pub use trading_loop::{LoopState, LoopSummary, TradingLoop};
