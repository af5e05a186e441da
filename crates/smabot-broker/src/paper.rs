//! Paper trading terminal for simulation and tests.
//!
//! Behaves like a netting-free (hedging) terminal: every market order opens
//! its own position with its own ticket, and a position is closed by a
//! counter-order that references it.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use smabot_core::error::BrokerError;
use smabot_core::traits::BrokerPort;
use smabot_core::types::{
    AccountInfo, OrderRequest, OrderResult, Position, PositionSide, Tick, Ticket,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

// Terminal return codes used for rejections.
const RETCODE_REQUOTE: u32 = 10004;
const RETCODE_INVALID: u32 = 10013;
const RETCODE_INVALID_VOLUME: u32 = 10014;
const RETCODE_PRICE_OFF: u32 = 10021;

/// Paper terminal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    /// Simulated account number
    pub login: u64,
    /// Simulated trade server
    pub server: String,
    /// Deposit currency
    pub currency: String,
    /// Starting balance
    pub balance: Decimal,
    /// Account leverage
    pub leverage: u32,
    /// Units per lot, used to turn price moves into profit
    pub contract_size: Decimal,
    /// Price of one point, the unit of order deviation
    pub point: Decimal,
    /// Deviation used for counter-orders built by `close_position`
    pub close_deviation: u32,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            login: 1,
            server: "Paper".to_string(),
            currency: "USD".to_string(),
            balance: dec!(10000),
            leverage: 100,
            contract_size: dec!(100000),
            point: dec!(0.00001),
            close_deviation: 20,
        }
    }
}

#[derive(Debug, Default)]
struct PaperState {
    connected: bool,
    balance: Decimal,
    quotes: HashMap<String, Tick>,
    positions: BTreeMap<Ticket, Position>,
    last_ticket: u64,
}

impl PaperState {
    fn next_ticket(&mut self) -> Ticket {
        self.last_ticket += 1;
        Ticket(self.last_ticket)
    }
}

/// Paper trading terminal.
pub struct PaperBroker {
    config: PaperConfig,
    state: Mutex<PaperState>,
}

impl PaperBroker {
    /// Create a new paper terminal.
    pub fn new(config: PaperConfig) -> Self {
        let state = PaperState {
            balance: config.balance,
            ..Default::default()
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Publish the current quote for a symbol.
    pub fn update_quote(&self, tick: Tick) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        debug!(
            symbol = %tick.symbol,
            bid = %tick.bid,
            ask = %tick.ask,
            spread = %tick.spread(),
            "Quote updated"
        );
        state.quotes.insert(tick.symbol.clone(), tick);
        Ok(())
    }

    /// Publish a quote built from bid/ask at the current time.
    pub fn set_quote(&self, symbol: &str, bid: Decimal, ask: Decimal) -> Result<(), BrokerError> {
        self.update_quote(Tick::new(symbol, bid, ask, Utc::now()))
    }

    /// Current balance.
    pub fn balance(&self) -> Result<Decimal, BrokerError> {
        Ok(self.state()?.balance)
    }

    fn state(&self) -> Result<MutexGuard<'_, PaperState>, BrokerError> {
        self.state
            .lock()
            .map_err(|_| BrokerError::Api("paper terminal state poisoned".to_string()))
    }

    fn session(&self) -> Result<MutexGuard<'_, PaperState>, BrokerError> {
        let state = self.state()?;
        if !state.connected {
            return Err(BrokerError::Connection(
                "terminal session is not open".to_string(),
            ));
        }
        Ok(state)
    }

    fn floating_profit(&self, state: &PaperState) -> Decimal {
        state
            .positions
            .values()
            .filter_map(|p| {
                let tick = state.quotes.get(&p.symbol)?;
                let exit = p.side.closing_side().execution_price(tick);
                Some(p.unrealized_pnl(exit) * self.config.contract_size)
            })
            .sum()
    }

    fn check_price(&self, request: &OrderRequest, tick: &Tick) -> Result<Decimal, BrokerError> {
        let market = request.side.execution_price(tick);
        let tolerance = Decimal::from(request.deviation) * self.config.point;
        if (request.price - market).abs() > tolerance {
            return Err(BrokerError::rejected(
                RETCODE_REQUOTE,
                format!("requote: requested {}, market {}", request.price, market),
            ));
        }
        Ok(market)
    }
}

#[async_trait]
impl BrokerPort for PaperBroker {
    async fn connect(&self) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        state.connected = true;
        info!(login = self.config.login, server = %self.config.server, "Paper terminal session opened");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        state.connected = false;
        info!("Paper terminal session closed");
        Ok(())
    }

    async fn account_info(&self) -> Result<AccountInfo, BrokerError> {
        let state = self.session()?;
        Ok(AccountInfo {
            login: self.config.login,
            server: self.config.server.clone(),
            currency: self.config.currency.clone(),
            balance: state.balance,
            equity: state.balance + self.floating_profit(&state),
            leverage: self.config.leverage,
        })
    }

    async fn get_tick(&self, symbol: &str) -> Result<Tick, BrokerError> {
        let state = self.session()?;
        state
            .quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| BrokerError::SymbolNotFound(symbol.to_string()))
    }

    async fn get_open_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, BrokerError> {
        let state = self.session()?;
        Ok(state
            .positions
            .values()
            .filter(|p| symbol.map_or(true, |s| p.symbol == s))
            .cloned()
            .collect())
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<OrderResult, BrokerError> {
        let mut state = self.session()?;

        if request.volume <= Decimal::ZERO {
            return Err(BrokerError::rejected(
                RETCODE_INVALID_VOLUME,
                format!("invalid volume {}", request.volume),
            ));
        }

        let tick = state
            .quotes
            .get(&request.symbol)
            .cloned()
            .ok_or_else(|| BrokerError::rejected(RETCODE_PRICE_OFF, "no prices"))?;
        let fill_price = self.check_price(&request, &tick)?;

        match request.closing_position {
            Some(ticket) => {
                let position = state
                    .positions
                    .get(&ticket)
                    .cloned()
                    .ok_or(BrokerError::UnknownTicket(ticket))?;

                if request.side != position.side.closing_side()
                    || request.symbol != position.symbol
                    || request.volume > position.volume
                {
                    return Err(BrokerError::rejected(
                        RETCODE_INVALID,
                        format!("request does not close position {}", ticket),
                    ));
                }

                let realized = match position.side {
                    PositionSide::Long => fill_price - position.open_price,
                    PositionSide::Short => position.open_price - fill_price,
                } * request.volume
                    * self.config.contract_size;
                state.balance += realized;

                let remaining = position.volume - request.volume;
                if remaining.is_zero() {
                    state.positions.remove(&ticket);
                } else if let Some(open) = state.positions.get_mut(&ticket) {
                    open.volume = remaining;
                }

                let deal = state.next_ticket();
                debug!(%ticket, %deal, price = %fill_price, %realized, "Paper position closed");
                Ok(OrderResult::done(deal, request.volume, fill_price))
            }
            None => {
                let ticket = state.next_ticket();
                let position = Position {
                    ticket,
                    symbol: request.symbol.clone(),
                    side: request.side.position_side(),
                    volume: request.volume,
                    open_price: fill_price,
                    opened_at: Utc::now(),
                    magic: request.magic,
                };
                state.positions.insert(ticket, position);

                debug!(%ticket, side = %request.side, volume = %request.volume, price = %fill_price, "Paper position opened");
                Ok(OrderResult::done(ticket, request.volume, fill_price))
            }
        }
    }

    async fn close_position(&self, ticket: Ticket) -> Result<OrderResult, BrokerError> {
        let request = {
            let state = self.session()?;
            let position = state
                .positions
                .get(&ticket)
                .ok_or(BrokerError::UnknownTicket(ticket))?;
            let tick = state
                .quotes
                .get(&position.symbol)
                .ok_or_else(|| BrokerError::rejected(RETCODE_PRICE_OFF, "no prices"))?;
            OrderRequest::close(position, tick, self.config.close_deviation)
        }; // MutexGuard dropped here before await

        self.submit_order(request).await
    }

    fn name(&self) -> &str {
        "Paper Terminal"
    }
}
