//! Market data sources for the trading bot.

mod csv_source;
mod replay;

pub use csv_source::CsvDataSource;
pub use replay::CsvReplaySource;

use smabot_core::error::DataError;
use smabot_core::types::Bar;
use std::path::Path;

/// Load bars from a CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    CsvDataSource::new(path)?.load_all()
}
