//! Error types for the trading bot.

use thiserror::Error;

use crate::types::Ticket;

/// Top-level trading bot error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Strategy-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Signal computation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

impl From<IndicatorError> for SignalError {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::InsufficientData {
                required,
                available,
            } => SignalError::InsufficientData {
                required,
                available,
            },
            IndicatorError::InvalidParameter(msg) => SignalError::InvalidWindow(msg),
            IndicatorError::Overflow(msg) => SignalError::Overflow(msg),
        }
    }
}

/// Broker-specific errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrokerError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Order rejected{}: {reason}", format_code(.code))]
    OrderRejected { code: Option<u32>, reason: String },

    #[error("Unknown ticket: {0}")]
    UnknownTicket(Ticket),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("{operation} timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("API error: {0}")]
    Api(String),
}

impl BrokerError {
    /// Create an order rejection with a terminal return code.
    pub fn rejected(code: u32, reason: impl Into<String>) -> Self {
        BrokerError::OrderRejected {
            code: Some(code),
            reason: reason.into(),
        }
    }

    /// Whether the error means the terminal session itself is unusable.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            BrokerError::Connection(_) | BrokerError::Authentication(_)
        )
    }
}

fn format_code(code: &Option<u32>) -> String {
    code.map(|c| format!(" (code {c})")).unwrap_or_default()
}

/// Market data errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Insufficient bars: need {required}, have {available}")]
    InsufficientBars { required: usize, available: usize },

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("{operation} timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

/// Result type alias for trading operations.
pub type TradingResult<T> = Result<T, TradingError>;
