//! Configuration structures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use smabot_broker::PaperConfig;
use smabot_core::error::TradingError;
use smabot_core::types::Timeframe;
use smabot_engine::{LoopConfig, OpenGate};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub strategy: StrategySettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub paper: PaperSettings,
}

impl AppConfig {
    /// Reject settings the loop cannot run with.
    pub fn validate(&self) -> Result<(), TradingError> {
        let invalid = |msg: String| Err(TradingError::Config(msg));

        if self.strategy.symbol.trim().is_empty() {
            return invalid("strategy.symbol must not be empty".to_string());
        }
        if self.strategy.volume <= Decimal::ZERO {
            return invalid(format!(
                "strategy.volume must be positive, got {}",
                self.strategy.volume
            ));
        }
        if self.strategy.sma_period == 0 {
            return invalid("strategy.sma_period must be at least 1".to_string());
        }
        self.timeframe()?;
        if self.engine.poll_interval_ms == 0 {
            return invalid("engine.poll_interval_ms must be positive".to_string());
        }
        if self.paper.balance < Decimal::ZERO {
            return invalid(format!("paper.balance must not be negative, got {}", self.paper.balance));
        }
        if self.paper.spread < Decimal::ZERO {
            return invalid(format!("paper.spread must not be negative, got {}", self.paper.spread));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return invalid(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            ));
        }
        Ok(())
    }

    /// Parsed bar timeframe.
    pub fn timeframe(&self) -> Result<Timeframe, TradingError> {
        Timeframe::from_str(&self.strategy.timeframe).map_err(TradingError::Config)
    }

    /// Validated settings for the trading loop.
    pub fn loop_config(&self) -> Result<LoopConfig, TradingError> {
        self.validate()?;

        let call_timeout = match self.engine.call_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        Ok(LoopConfig {
            symbol: self.strategy.symbol.trim().to_string(),
            timeframe: self.timeframe()?,
            sma_period: self.strategy.sma_period,
            volume: self.strategy.volume,
            deviation: self.strategy.deviation,
            magic: self.strategy.magic,
            comment: self.strategy.comment.clone(),
            poll_interval: Duration::from_millis(self.engine.poll_interval_ms),
            call_timeout,
            open_gate: self.engine.open_gate,
            max_cycles: self.engine.max_cycles,
        })
    }

    /// Settings for the in-process paper terminal.
    pub fn paper_config(&self) -> PaperConfig {
        PaperConfig {
            balance: self.paper.balance,
            currency: self.paper.currency.clone(),
            leverage: self.paper.leverage,
            close_deviation: self.strategy.deviation,
            ..PaperConfig::default()
        }
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "smabot".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Directory for daily rotated log files
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// What is traded and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub symbol: String,
    /// Lots per new position
    pub volume: Decimal,
    /// `M1`, `H1`, ... or `1m`, `1h`, ...
    pub timeframe: String,
    pub sma_period: usize,
    /// Accepted slippage in points
    pub deviation: u32,
    pub magic: u64,
    pub comment: String,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            symbol: "EURUSD".to_string(),
            volume: dec!(1.0),
            timeframe: "M1".to_string(),
            sma_period: 10,
            deviation: 20,
            magic: 100,
            comment: "smabot".to_string(),
        }
    }
}

/// Loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub poll_interval_ms: u64,
    /// 0 disables the per-call limit
    pub call_timeout_ms: u64,
    pub open_gate: OpenGate,
    pub max_cycles: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            call_timeout_ms: 5000,
            open_gate: OpenGate::Symbol,
            max_cycles: None,
        }
    }
}

/// Paper terminal account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSettings {
    pub balance: Decimal,
    pub currency: String,
    pub leverage: u32,
    /// Ask minus bid for published quotes
    pub spread: Decimal,
}

impl Default for PaperSettings {
    fn default() -> Self {
        Self {
            balance: dec!(10000),
            currency: "USD".to_string(),
            leverage: 100,
            spread: dec!(0.0002),
        }
    }
}
