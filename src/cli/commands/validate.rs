//! Validate configuration command.

use anyhow::{Context, Result};
use std::path::Path;
use smabot_config::load_config;

use crate::cli::ValidateArgs;

pub async fn run(args: ValidateArgs, config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = load_config(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let loop_config = match config.loop_config() {
        Ok(loop_config) => loop_config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Symbol: {}", loop_config.symbol);
    println!("Timeframe: {}", loop_config.timeframe);
    println!("SMA period: {}", loop_config.sma_period);
    println!("Volume: {}", loop_config.volume);
    println!("Deviation: {} points", loop_config.deviation);
    println!("Magic: {}", loop_config.magic);
    println!("Poll interval: {:?}", loop_config.poll_interval);
    match loop_config.call_timeout {
        Some(limit) => println!("Call timeout: {:?}", limit),
        None => println!("Call timeout: disabled"),
    }
    println!("Open gate: {}", loop_config.open_gate);
    println!(
        "Paper account: {} {} (spread {})",
        config.paper.balance, config.paper.currency, config.paper.spread
    );

    Ok(())
}
