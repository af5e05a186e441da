//! Technical indicators over decimal prices.
//!
//! Prices stay in `Decimal` end to end so that indicator values can be
//! compared against raw closes without rounding noise.

pub mod moving_average;

pub use moving_average::{checked_sum, Sma};
