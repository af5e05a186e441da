//! Broker port definition.

use crate::error::BrokerError;
use crate::types::{AccountInfo, OrderRequest, OrderResult, Position, Tick, Ticket};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Port to the brokerage terminal.
///
/// The terminal owns positions and routes orders; the bot only asks it for
/// state and hands it requests. Implementations must be usable behind an
/// `Arc<dyn BrokerPort>`.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Open the terminal session and log in.
    ///
    /// Failing here is fatal: the trading loop never starts.
    async fn connect(&self) -> Result<(), BrokerError>;

    /// Release the terminal session.
    async fn disconnect(&self) -> Result<(), BrokerError>;

    /// Get the account snapshot for the logged-in session.
    async fn account_info(&self) -> Result<AccountInfo, BrokerError>;

    /// Get the current bid/ask for a symbol.
    async fn get_tick(&self, symbol: &str) -> Result<Tick, BrokerError>;

    /// Get open positions, for one symbol or for the whole account.
    async fn get_open_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, BrokerError>;

    /// Submit a market order.
    ///
    /// # Arguments
    /// * `request` - The order request to submit
    ///
    /// # Returns
    /// The terminal's result. A rejection is reported as
    /// `BrokerError::OrderRejected`.
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderResult, BrokerError>;

    /// Close a position in full with a counter-order.
    ///
    /// # Arguments
    /// * `ticket` - Ticket of the position to close
    ///
    /// # Returns
    /// The result of the counter-order, or `BrokerError::UnknownTicket` when
    /// no open position carries that ticket.
    async fn close_position(&self, ticket: Ticket) -> Result<OrderResult, BrokerError>;

    /// Sum of open volume for a symbol.
    async fn get_account_exposure(&self, symbol: &str) -> Result<Decimal, BrokerError> {
        let positions = self.get_open_positions(Some(symbol)).await?;
        Ok(positions.iter().map(|p| p.volume).sum())
    }

    /// Number of open positions across the whole account.
    async fn positions_total(&self) -> Result<usize, BrokerError> {
        Ok(self.get_open_positions(None).await?.len())
    }

    /// Get the broker name.
    fn name(&self) -> &str;
}
