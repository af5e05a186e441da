//! Logging and cycle reporting.

mod logging;
mod sink;

pub use logging::setup_logging;
pub use sink::TracingSink;
