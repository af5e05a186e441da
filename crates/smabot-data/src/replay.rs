//! Bar-by-bar replay of a recorded history.

use async_trait::async_trait;
use smabot_core::error::DataError;
use smabot_core::traits::MarketDataPort;
use smabot_core::types::{Bar, Timeframe};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

use crate::CsvDataSource;

/// Replays recorded bars as if they were completing live.
///
/// Each call to `get_recent_bars` reveals one more completed bar. Once the
/// last bar has been served the source reports `NoDataAvailable`.
pub struct CsvReplaySource {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
    completed: Mutex<usize>,
}

impl CsvReplaySource {
    /// Create a replay over `bars`, with `warmup` bars already completed
    /// before the first call.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
        warmup: usize,
    ) -> Result<Self, DataError> {
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        let completed = warmup.clamp(1, bars.len());
        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            bars,
            completed: Mutex::new(completed),
        })
    }

    /// Load a replay from a CSV file.
    pub fn from_csv(
        path: impl AsRef<Path>,
        symbol: impl Into<String>,
        timeframe: Timeframe,
        warmup: usize,
    ) -> Result<Self, DataError> {
        let bars = CsvDataSource::new(path)?.load_all()?;
        Self::new(symbol, timeframe, bars, warmup)
    }

    /// Total bars in the recording.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Number of calls left before the recording is exhausted.
    pub async fn remaining(&self) -> usize {
        let completed = *self.completed.lock().await;
        (self.bars.len() + 1).saturating_sub(completed)
    }
}

#[async_trait]
impl MarketDataPort for CsvReplaySource {
    async fn get_recent_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        if symbol != self.symbol {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }
        if timeframe != self.timeframe {
            return Err(DataError::InvalidTimeframe(format!(
                "recording is {}, requested {}",
                self.timeframe, timeframe
            )));
        }

        let mut completed = self.completed.lock().await;
        if *completed > self.bars.len() {
            return Err(DataError::NoDataAvailable);
        }

        let end = *completed;
        let start = end.saturating_sub(count);
        *completed += 1;

        debug!(symbol, start, end, "Replaying bars");
        Ok(self.bars[start..end].to_vec())
    }

    fn name(&self) -> &str {
        "CSV Replay"
    }
}
