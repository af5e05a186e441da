//! Broker implementations.

mod paper;

pub use paper::{PaperBroker, PaperConfig};
