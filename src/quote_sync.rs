//! Keeps the paper terminal's quotes in step with replayed bars.

use async_trait::async_trait;
use rust_decimal::Decimal;
use smabot_broker::PaperBroker;
use smabot_core::error::DataError;
use smabot_core::traits::MarketDataPort;
use smabot_core::types::{Bar, Tick, Timeframe};
use smabot_data::CsvReplaySource;
use std::sync::Arc;

/// Market data port that publishes the newest replayed close as the
/// terminal's current quote: bid at the close, ask one spread above.
pub struct QuoteSync {
    source: CsvReplaySource,
    broker: Arc<PaperBroker>,
    spread: Decimal,
}

impl QuoteSync {
    pub fn new(source: CsvReplaySource, broker: Arc<PaperBroker>, spread: Decimal) -> Self {
        Self {
            source,
            broker,
            spread,
        }
    }
}

#[async_trait]
impl MarketDataPort for QuoteSync {
    async fn get_recent_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = self.source.get_recent_bars(symbol, timeframe, count).await?;

        if let Some(last) = bars.last() {
            let tick = Tick::new(symbol, last.close, last.close + self.spread, last.timestamp);
            self.broker
                .update_quote(tick)
                .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        }

        Ok(bars)
    }

    fn name(&self) -> &str {
        self.source.name()
    }
}
