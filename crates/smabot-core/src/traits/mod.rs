//! Core traits for the trading bot.

mod broker;
mod data_source;
mod indicator;
mod sink;

pub use broker::BrokerPort;
pub use data_source::MarketDataPort;
pub use indicator::Indicator;
pub use sink::CycleSink;
