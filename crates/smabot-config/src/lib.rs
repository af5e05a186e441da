//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, EngineSettings, LoggingConfig, PaperSettings, StrategySettings,
};

use config::{Config, ConfigError, Environment, File, FileFormat};
use std::path::Path;

const ENV_PREFIX: &str = "SMABOT";

/// Load configuration from file and environment.
///
/// `SMABOT__STRATEGY__SYMBOL=GBPUSD` overrides `strategy.symbol`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

/// Parse configuration from TOML text alone.
pub fn parse_config(toml: &str) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()
}
