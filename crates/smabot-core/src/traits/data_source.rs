//! Market data port definition.

use crate::error::DataError;
use crate::types::{Bar, Timeframe};
use async_trait::async_trait;

/// Port to the terminal's price history.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch the most recent completed bars.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `timeframe` - The bar timeframe
    /// * `count` - Number of bars wanted
    ///
    /// # Returns
    /// Up to `count` bars ordered from oldest to newest. The bar still
    /// forming is never included.
    async fn get_recent_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
